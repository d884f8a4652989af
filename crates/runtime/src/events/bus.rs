//! Notification bus contract used by the scheduler.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{EventScope, StageEvent};

/// Failure reported by a listener. The scheduler propagates it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("listener `{listener}` failed on {event}: {message}")]
pub struct NotificationError {
    pub listener: &'static str,
    pub event: String,
    pub message: String,
}

impl NotificationError {
    pub fn new(listener: &'static str, event: &StageEvent, message: impl Into<String>) -> Self {
        Self {
            listener,
            event: format!("{:?}", event.kind()),
            message: message.into(),
        }
    }
}

/// Pops its scope when dropped.
#[must_use = "the scope is popped as soon as the guard is dropped"]
pub struct ScopeGuard {
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl ScopeGuard {
    pub fn new(release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("armed", &self.release.is_some())
            .finish()
    }
}

/// Pub/sub boundary between the scheduler and everything reacting to it.
///
/// `execute` must not return until every listener has handled the event, so
/// fan-out stays ordered relative to the turn loop.
#[async_trait]
pub trait NotificationBus: Send + Sync {
    fn push(&self, scope: EventScope) -> ScopeGuard;

    async fn execute(&self, event: &StageEvent) -> Result<(), NotificationError>;
}

/// Bus that drops every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentBus;

#[async_trait]
impl NotificationBus for SilentBus {
    fn push(&self, _scope: EventScope) -> ScopeGuard {
        ScopeGuard::noop()
    }

    async fn execute(&self, _event: &StageEvent) -> Result<(), NotificationError> {
        Ok(())
    }
}
