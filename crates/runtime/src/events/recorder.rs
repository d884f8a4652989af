use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use super::registry::StageListener;
use super::types::{EventScope, StageEvent};

/// Listener that republishes every event on a broadcast channel.
///
/// Lagging or absent receivers never fail the stage.
#[derive(Debug, Clone)]
pub struct EventRecorder {
    tx: broadcast::Sender<StageEvent>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StageEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StageListener for EventRecorder {
    fn name(&self) -> &'static str {
        "recorder"
    }

    async fn on_event(&self, _scopes: &[EventScope], event: &StageEvent) -> Result<(), String> {
        if self.tx.send(event.clone()).is_err() {
            trace!(target: "stage::events", "no recorder subscribers");
        }
        Ok(())
    }
}
