//! Turn scheduler for a single stage.
//!
//! [`StageTurnScheduler`] owns the roster, the three field containers, the
//! queue and the timeline. Nothing else holds a reference to them: action
//! bodies run on their own task and mutate the stage through a
//! [`StageHandle`], whose commands the scheduler serves while it waits for
//! the turn's completion gate.
//!
//! Lifecycle: `Setup` (in [`StageBuilder::build`]), then per iteration
//! `SelectActor -> ActorTurn -> PostTurnCleanup`, then `Ended`. A turn is a
//! two-phase step ([`StageTurnScheduler::begin_turn`] /
//! [`StageTurnScheduler::end_turn`]) so an external loop can drive it;
//! [`StageTurnScheduler::run`] is the default driver.

mod builder;
mod command;
mod mutation;
mod snapshot;
mod tag;
mod turn;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use battle_core::{
    ActorId, ActorState, Roster, Side, StageFields, TargetResolver, TimeProvider, Timeline, TimelineQueue,
};

pub use builder::{PartyData, StageBuilder, StageData};
pub(crate) use command::Command;
pub use snapshot::{SlotView, StageSnapshot};
pub use tag::{TagInRejection, TagInResult};
pub use turn::{PendingTurn, TurnSummary};

use crate::api::{
    ActorFactory, InputControl, Result, RuntimeError, SkillExecutor, StageHandle, ViewProvider,
};
use crate::config::RuntimeConfig;
use crate::events::{EventScope, NotificationBus, StageEvent, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePhase {
    Setup,
    SelectActor,
    ActorTurn,
    PostTurnCleanup,
    Ended,
}

/// What a finished stage hands back to its caller.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub verdict: Verdict,
    /// Player-side actors still in the stage (hand and field).
    pub players: Vec<ActorState>,
    pub enemies: Vec<ActorState>,
    pub turns: u64,
}

pub struct StageTurnScheduler {
    config: RuntimeConfig,
    roster: Roster,
    fields: StageFields,
    queue: TimelineQueue,
    timeline: Timeline,
    resolver: TargetResolver,

    time: Arc<dyn TimeProvider>,
    factory: Arc<dyn ActorFactory>,
    input: Arc<dyn InputControl>,
    skills: Arc<dyn SkillExecutor>,
    bus: Arc<dyn NotificationBus>,
    view: Arc<dyn ViewProvider>,

    phase: StagePhase,
    current: Option<ActorId>,
    /// Action time the current slot started with.
    slot_cost: f64,
    parry_opened_at: Option<Instant>,
    turns: u64,
    cancel: CancellationToken,
    command_tx: mpsc::Sender<Command>,
    command_rx: mpsc::Receiver<Command>,
}

impl StageTurnScheduler {
    pub fn builder() -> StageBuilder {
        StageBuilder::new()
    }

    /// Handle for mutating the stage from outside the scheduler task.
    pub fn handle(&self) -> StageHandle {
        StageHandle::new(self.command_tx.clone())
    }

    /// Token checked at the top of every iteration and observed by in-flight
    /// turn resolution.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> StagePhase {
        self.phase
    }

    /// Actor whose turn is in progress.
    pub fn current(&self) -> Option<ActorId> {
        self.current
    }

    pub fn turns(&self) -> u64 {
        self.turns
    }

    pub fn fields(&self) -> &StageFields {
        &self.fields
    }

    pub fn queue(&self) -> &TimelineQueue {
        &self.queue
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Terminal once the timeline runs dry or either field is empty.
    pub fn is_terminal(&self) -> bool {
        self.phase == StagePhase::Ended
            || self.timeline.is_empty()
            || self.fields.either_field_empty()
    }

    /// Drives the stage until it ends, is cancelled, or hits the turn cap.
    ///
    /// Errors are fatal: the stage is left as-is and must be discarded.
    pub async fn run(&mut self) -> Result<StageOutcome> {
        let verdict = loop {
            if self.cancel.is_cancelled() {
                info!(target: "stage::scheduler", turns = self.turns, "stage cancelled");
                break Verdict::Aborted;
            }
            if self.turns >= self.config.max_turns {
                warn!(
                    target: "stage::scheduler",
                    max_turns = self.config.max_turns,
                    "turn cap reached, aborting stage"
                );
                break Verdict::Aborted;
            }

            let Some(pending) = self.begin_turn().await? else {
                break self.verdict();
            };

            match self.end_turn(pending).await {
                Ok(_) => {}
                Err(RuntimeError::Cancelled) => {
                    info!(target: "stage::scheduler", turns = self.turns, "turn cancelled");
                    break Verdict::Aborted;
                }
                Err(err) => {
                    error!(
                        target: "stage::scheduler",
                        severity = err.severity().as_str(),
                        error = %err,
                        "stage aborted"
                    );
                    return Err(err);
                }
            }
        };

        self.finish(verdict).await
    }

    /// Verdict for a stage that stopped on its own.
    fn verdict(&self) -> Verdict {
        if self.fields.enemy.is_empty() {
            Verdict::Victory
        } else if self.fields.player.is_empty() {
            Verdict::Defeat
        } else {
            Verdict::Aborted
        }
    }

    /// Ended: notifies every remaining participant, empties the schedule and
    /// hands the survivors back.
    pub async fn finish(&mut self, verdict: Verdict) -> Result<StageOutcome> {
        self.phase = StagePhase::Ended;
        self.current = None;
        self.parry_opened_at = None;

        let participants: Vec<ActorId> = self.fields.participants().map(|slot| slot.actor).collect();
        for &actor in &participants {
            self.notify(StageEvent::BattleEnd { actor, verdict }).await?;
        }

        self.timeline.clear();
        self.queue.clear();

        let slots: Vec<_> = self
            .fields
            .hand
            .drain()
            .chain(self.fields.player.drain())
            .chain(self.fields.enemy.drain())
            .collect();

        let mut players = Vec::new();
        let mut enemies = Vec::new();
        for slot in slots {
            let state = self.roster.actor(slot.actor)?.clone();
            self.view.release(slot.actor);
            self.factory.reserve(slot);
            match state.side {
                Side::Player => players.push(state),
                Side::Enemy => enemies.push(state),
            }
        }

        info!(
            target: "stage::scheduler",
            ?verdict,
            turns = self.turns,
            players = players.len(),
            enemies = enemies.len(),
            "battle ended"
        );

        Ok(StageOutcome {
            verdict,
            players,
            enemies,
            turns: self.turns,
        })
    }

    /// Pushes the event's scope and awaits the full fan-out.
    async fn notify(&self, event: StageEvent) -> Result<()> {
        let _scope = self.bus.push(EventScope::from(&event));
        self.bus.execute(&event).await?;
        Ok(())
    }

    /// Collapses the timeline to its head and refills it from the queue.
    ///
    /// While a turn is in flight the acting actor keeps the head.
    fn refresh_timeline(&mut self) -> Result<()> {
        let roster = &self.roster;
        let time = self.time.as_ref();
        let time_of = |actor| action_time(roster, time, actor);
        let window = self.config.battle.window();
        match self.current {
            Some(active) => self.timeline.rebuild_active(
                &mut self.queue,
                time_of,
                window,
                active,
                self.slot_cost,
            )?,
            None => self.timeline.rebuild(&mut self.queue, time_of, window)?,
        }
        Ok(())
    }
}

/// Live action time of an actor; unknown actors sort last.
fn action_time(roster: &Roster, time: &dyn TimeProvider, actor: ActorId) -> f64 {
    roster
        .stats(actor)
        .map_or(f64::MAX, |stats| time.action_time(stats))
}
