//! Async turn loop for one battle stage.
//!
//! This crate drives the `battle-core` data structures: it owns them inside a
//! [`StageTurnScheduler`], runs each actor's action body on its own task and
//! fans lifecycle notifications out through a [`NotificationBus`].
//!
//! Modules are organized by responsibility:
//! - [`scheduler`] hosts the state machine, its builder and stage mutations
//! - [`api`] exposes the collaborator contracts, [`StageHandle`] and errors
//! - [`events`] provides the event types and the per-stage observer registry
//! - [`config`] loads [`RuntimeConfig`] from the environment
pub mod api;
pub mod config;
pub mod events;
pub mod scheduler;

pub use api::{
    ActorFactory, AutoInput, DamageSkillExecutor, DefaultActorFactory, InputControl, NullView,
    Result, RuntimeError, SkillExecutor, SkillRequest, StageHandle, ViewProvider,
};
pub use config::RuntimeConfig;
pub use events::{
    EventKind, EventRecorder, EventRegistry, EventScope, NotificationBus, NotificationError,
    ScopeGuard, SilentBus, StageEvent, StageListener, Subscription, Verdict,
};
pub use scheduler::{
    PartyData, PendingTurn, SlotView, StageBuilder, StageData, StageOutcome, StagePhase,
    StageSnapshot, StageTurnScheduler, TagInRejection, TagInResult, TurnSummary,
};
