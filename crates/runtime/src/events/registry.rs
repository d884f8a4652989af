//! In-process notification bus with scoped listeners.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use super::bus::{NotificationBus, NotificationError, ScopeGuard};
use super::types::{EventScope, StageEvent};

/// Receives every event pushed through an [`EventRegistry`].
///
/// `scopes` is the stack of open scopes at the time the event was sent,
/// outermost first.
#[async_trait]
pub trait StageListener: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_event(&self, scopes: &[EventScope], event: &StageEvent) -> Result<(), String>;
}

#[derive(Default)]
struct Inner {
    listeners: Vec<(u64, Arc<dyn StageListener>)>,
    scopes: Vec<(u64, EventScope)>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // A listener panicking mid-notification must not wedge the registry.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Listener registry implementing [`NotificationBus`].
///
/// Listeners run sequentially in subscription order; the first failure stops
/// the fan-out and is returned to the scheduler.
#[derive(Clone, Default)]
pub struct EventRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener. It stays registered until the returned
    /// [`Subscription`] is dropped.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe(&self, listener: Arc<dyn StageListener>) -> Subscription {
        let mut inner = lock(&self.inner);
        let id = inner.next_id();
        debug!(target: "stage::events", listener = listener.name(), "listener subscribed");
        inner.listeners.push((id, listener));
        Subscription {
            registry: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.inner).listeners.len()
    }

    /// Currently open scopes, outermost first.
    pub fn scopes(&self) -> Vec<EventScope> {
        lock(&self.inner).scopes.iter().map(|(_, s)| *s).collect()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("EventRegistry")
            .field("listeners", &inner.listeners.len())
            .field("scopes", &inner.scopes.len())
            .finish()
    }
}

#[async_trait]
impl NotificationBus for EventRegistry {
    fn push(&self, scope: EventScope) -> ScopeGuard {
        let id = {
            let mut inner = lock(&self.inner);
            let id = inner.next_id();
            inner.scopes.push((id, scope));
            id
        };
        trace!(target: "stage::events", ?scope, "scope pushed");

        let weak = Arc::downgrade(&self.inner);
        ScopeGuard::new(move || {
            if let Some(inner) = weak.upgrade() {
                lock(&inner).scopes.retain(|(open, _)| *open != id);
            }
        })
    }

    async fn execute(&self, event: &StageEvent) -> Result<(), NotificationError> {
        let (listeners, scopes) = {
            let inner = lock(&self.inner);
            let listeners: Vec<_> = inner.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
            let scopes: Vec<_> = inner.scopes.iter().map(|(_, s)| *s).collect();
            (listeners, scopes)
        };

        for listener in listeners {
            if let Err(message) = listener.on_event(&scopes, event).await {
                warn!(
                    target: "stage::events",
                    listener = listener.name(),
                    ?event,
                    %message,
                    "listener failed"
                );
                return Err(NotificationError::new(listener.name(), event, message));
            }
        }

        Ok(())
    }
}

/// Handle returned by [`EventRegistry::subscribe`].
#[derive(Debug)]
pub struct Subscription {
    registry: Weak<Mutex<Inner>>,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            lock(&inner).listeners.retain(|(id, _)| *id != self.id);
        }
    }
}
