//! Public runtime API surface: collaborator contracts, the stage handle and
//! the error type shared by both.

pub mod collaborators;
pub mod errors;
pub mod handle;

pub use collaborators::{
    ActorFactory, AutoInput, DamageSkillExecutor, DefaultActorFactory, InputControl, NullView,
    SkillExecutor, SkillRequest, ViewProvider,
};
pub use errors::{Result, RuntimeError};
pub use handle::StageHandle;
