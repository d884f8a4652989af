use async_trait::async_trait;
use tracing::info;

use stage_runtime::{EventScope, StageEvent, StageListener};

/// Logs every stage event with the scope it happened in.
#[derive(Debug, Default)]
pub struct ConsoleListener;

#[async_trait]
impl StageListener for ConsoleListener {
    fn name(&self) -> &'static str {
        "console"
    }

    async fn on_event(&self, scopes: &[EventScope], event: &StageEvent) -> Result<(), String> {
        let depth = scopes.len();
        match event {
            StageEvent::TurnStart { actor, turn } => {
                info!(target: "stage::console", depth, "turn {turn}: {actor} acts");
            }
            StageEvent::TagIn { actor, replacing } => {
                info!(target: "stage::console", depth, ?replacing, "{actor} tags in");
            }
            StageEvent::TagOut { actor } => {
                info!(target: "stage::console", depth, "{actor} tags out");
            }
            StageEvent::Death { actor } => {
                info!(target: "stage::console", depth, "{actor} falls");
            }
            StageEvent::BattleEnd { actor, verdict } => {
                info!(target: "stage::console", depth, ?verdict, "{actor} leaves the battle");
            }
            other => {
                tracing::debug!(target: "stage::console", depth, event = ?other);
            }
        }
        Ok(())
    }
}
