//! Common error infrastructure for battle-core.
//!
//! Structural errors raised by the queue, the fields and the stage bookkeeping
//! share the classification types defined here. Every one of them means the
//! scheduling state of the current stage can no longer be trusted: callers
//! abort the stage instead of retrying.
//!
//! Expected timing races (a tag-in request that arrives too late, for example)
//! are *not* errors. They are reported as plain values by the code that checks
//! them.

use crate::actor::ActorId;

/// Severity level of an error, used for categorization and logging.
///
/// - **Validation**: input that is rejected without touching any state
/// - **Internal**: unexpected state inconsistency that needs investigation
/// - **Fatal**: an invariant was violated and the stage must be aborted
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorSeverity {
    Validation,
    Internal,
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if the stage must be aborted.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Contextual information attached to errors for diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// Actor that triggered the error (if applicable).
    pub actor: Option<ActorId>,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            actor: None,
            message: None,
        }
    }

    /// Attaches an actor to this context (builder pattern).
    #[must_use]
    pub const fn with_actor(mut self, actor: ActorId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all battle-core errors.
///
/// - All error enums implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait BattleError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Invariant violations raised by [`crate::queue::TimelineQueue`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    #[error("actor {actor} is already queued")]
    Duplicate { actor: ActorId },

    #[error("actor {actor} is not queued")]
    Missing { actor: ActorId },

    #[error("no queue entry holds index {index}")]
    MissingIndex { index: u64 },

    #[error("timeline queue is empty")]
    Empty,
}

impl BattleError for QueueError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Duplicate { .. } => "QUEUE_DUPLICATE",
            Self::Missing { .. } => "QUEUE_MISSING",
            Self::MissingIndex { .. } => "QUEUE_MISSING_INDEX",
            Self::Empty => "QUEUE_EMPTY",
        }
    }
}

/// Invariant violations raised by [`crate::field::ActorField`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("actor {actor} already occupies this field")]
    Duplicate { actor: ActorId },

    #[error("actor {actor} is not in this field")]
    Missing { actor: ActorId },
}

impl BattleError for FieldError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Duplicate { .. } => "FIELD_DUPLICATE",
            Self::Missing { .. } => "FIELD_MISSING",
        }
    }
}

/// Membership and lifecycle violations detected by the stage bookkeeping.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("actor {} is not registered in the roster", context.actor.map(|a| a.to_string()).unwrap_or_default())]
    UnknownActor { context: ErrorContext },

    #[error("actor {} is not part of the stage", context.actor.map(|a| a.to_string()).unwrap_or_default())]
    NotParticipating { context: ErrorContext },

    #[error("current actor {} is disposed", context.actor.map(|a| a.to_string()).unwrap_or_default())]
    DisposedActor { context: ErrorContext },

    #[error("field membership is inconsistent: {}", context.message.unwrap_or("unknown"))]
    Membership { context: ErrorContext },
}

impl StageError {
    pub fn unknown_actor(actor: ActorId) -> Self {
        Self::UnknownActor {
            context: ErrorContext::new().with_actor(actor),
        }
    }

    pub fn not_participating(actor: ActorId) -> Self {
        Self::NotParticipating {
            context: ErrorContext::new().with_actor(actor),
        }
    }

    pub fn disposed(actor: ActorId) -> Self {
        Self::DisposedActor {
            context: ErrorContext::new()
                .with_actor(actor)
                .with_message("disposed actor selected for a turn"),
        }
    }

    pub fn membership(actor: ActorId, message: &'static str) -> Self {
        Self::Membership {
            context: ErrorContext::new().with_actor(actor).with_message(message),
        }
    }
}

impl BattleError for StageError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Queue(e) => e.severity(),
            Self::Field(e) => e.severity(),
            Self::UnknownActor { .. } => ErrorSeverity::Internal,
            Self::NotParticipating { .. } | Self::DisposedActor { .. } | Self::Membership { .. } => {
                ErrorSeverity::Fatal
            }
        }
    }

    fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::Queue(_) | Self::Field(_) => None,
            Self::UnknownActor { context }
            | Self::NotParticipating { context }
            | Self::DisposedActor { context }
            | Self::Membership { context } => Some(context),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Queue(e) => e.error_code(),
            Self::Field(e) => e.error_code(),
            Self::UnknownActor { .. } => "STAGE_UNKNOWN_ACTOR",
            Self::NotParticipating { .. } => "STAGE_NOT_PARTICIPATING",
            Self::DisposedActor { .. } => "STAGE_DISPOSED_ACTOR",
            Self::Membership { .. } => "STAGE_MEMBERSHIP",
        }
    }
}
