//! Unified error types surfaced by the stage runtime.
//!
//! Wraps structural failures from `battle-core`, collaborator failures and
//! channel plumbing so callers can abort the stage with consistent context.
use battle_core::{ActorId, BattleError, ErrorSeverity, FieldError, QueueError, StageError};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::events::NotificationError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Notification(#[from] NotificationError),

    #[error("input control failed for actor {actor}: {message}")]
    InputControl { actor: ActorId, message: String },

    #[error("skill execution failed for actor {actor}: {message}")]
    SkillExecution { actor: ActorId, message: String },

    #[error("stage command channel closed")]
    CommandChannelClosed,

    #[error("stage reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("turn completion gate dropped before firing")]
    GateDropped,

    #[error("turn resolution task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("stage was cancelled")]
    Cancelled,

    #[error("stage aborted after a fatal error")]
    StageAborted,
}

impl RuntimeError {
    pub fn input_control(actor: ActorId, message: impl Into<String>) -> Self {
        Self::InputControl {
            actor,
            message: message.into(),
        }
    }

    pub fn skill_execution(actor: ActorId, message: impl Into<String>) -> Self {
        Self::SkillExecution {
            actor,
            message: message.into(),
        }
    }

    /// Severity used for logging; only structural errors carry their own.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Stage(error) => error.severity(),
            Self::Cancelled => ErrorSeverity::Validation,
            _ => ErrorSeverity::Fatal,
        }
    }
}

impl From<QueueError> for RuntimeError {
    fn from(error: QueueError) -> Self {
        Self::Stage(error.into())
    }
}

impl From<FieldError> for RuntimeError {
    fn from(error: FieldError) -> Self {
        Self::Stage(error.into())
    }
}
