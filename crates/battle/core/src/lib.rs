//! Deterministic battle scheduling and targeting rules.
//!
//! `battle-core` holds the data structures a stage is built from and never
//! awaits. The async turn loop in `stage-runtime` drives them:
//! - [`queue::TimelineQueue`] orders actors by live action time
//! - [`timeline::Timeline`] is the bounded preview derived from the queue
//! - [`field::ActorField`] and [`field::Hand`] hold participation records
//! - [`targeting::TargetResolver`] turns a skill's [`targeting::TargetSpec`]
//!   into concrete targets
//! - [`stage::StageFields`] ties the containers together and checks membership
pub mod actor;
pub mod config;
pub mod error;
pub mod field;
pub mod queue;
pub mod stage;
pub mod targeting;
pub mod time;
pub mod timeline;

pub use actor::{
    ActorData, ActorId, ActorState, ActorStats, CombatRole, Roster, Side, SkillData, StageActor,
};
pub use config::BattleConfig;
pub use error::{BattleError, ErrorContext, ErrorSeverity, FieldError, QueueError, StageError};
pub use field::{ActorField, FieldTarget, Hand, Position};
pub use queue::{QueueEntry, TimelineQueue};
pub use stage::{Placement, StageFields};
pub use targeting::{FieldView, PositionMask, TargetMask, TargetResolver, TargetSpec, Targets};
pub use time::{SpeedTimeProvider, TimeProvider};
pub use timeline::Timeline;
