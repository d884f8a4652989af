//! Stage simulator binary.
//!
//! Composition root that loads a stage description, wires the default
//! collaborators into a [`StageTurnScheduler`] and runs an all-AI battle.
//!
//! ```bash
//! # Built-in demo encounter
//! cargo run -p stage-client
//!
//! # Custom stage, verbose scheduler logs
//! RUST_LOG=stage=debug cargo run -p stage-client -- stages/cave.json
//! ```

mod console;
mod logging;
mod stage_file;

use std::sync::Arc;

use anyhow::Result;
use stage_runtime::{EventRegistry, RuntimeConfig, StageTurnScheduler};

use console::ConsoleListener;
use stage_file::StageFile;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = logging::setup_logging()?;

    let config = RuntimeConfig::from_env();
    let stage = match std::env::args().nth(1) {
        Some(path) => StageFile::load(path)?,
        None => StageFile::demo(),
    };
    tracing::info!(
        stage = %stage.name,
        party = stage.party.len(),
        enemies = stage.enemies.len(),
        window = config.battle.window(),
        "Starting stage"
    );

    let registry = EventRegistry::new();
    let _console = registry.subscribe(Arc::new(ConsoleListener));

    let (party, stage) = stage.into_parts();
    let mut scheduler = StageTurnScheduler::builder()
        .config(config)
        .notification_bus(Arc::new(registry))
        .build(party, stage)
        .await?;

    let cancel = scheduler.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling stage");
            cancel.cancel();
        }
    });

    let outcome = scheduler.run().await?;

    tracing::info!(verdict = ?outcome.verdict, turns = outcome.turns, "Stage finished");
    for actor in outcome.players.iter().chain(outcome.enemies.iter()) {
        tracing::info!(
            "{} {} ({:?}): {}/{} hp",
            actor.id,
            actor.data.name,
            actor.side,
            actor.stats.hp,
            actor.stats.max_hp
        );
    }
    Ok(())
}
