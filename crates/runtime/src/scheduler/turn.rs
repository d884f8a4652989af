//! Two-phase turn step.

use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use battle_core::{ActorId, Side, StageError};

use super::{StagePhase, StageTurnScheduler, action_time};
use crate::api::{InputControl, Result, RuntimeError, SkillExecutor, SkillRequest, StageHandle};
use crate::events::{EventScope, ScopeGuard, StageEvent};

/// A turn whose action body is still resolving.
///
/// Returned by [`StageTurnScheduler::begin_turn`]; hand it back to
/// [`StageTurnScheduler::end_turn`] to resume.
#[must_use = "a pending turn must be finished with `end_turn`"]
pub struct PendingTurn {
    actor: ActorId,
    turn: u64,
    gate: oneshot::Receiver<Result<()>>,
    task: JoinHandle<()>,
    token: CancellationToken,
    _scope: ScopeGuard,
}

impl PendingTurn {
    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn turn(&self) -> u64 {
        self.turn
    }
}

impl std::fmt::Debug for PendingTurn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingTurn")
            .field("actor", &self.actor)
            .field("turn", &self.turn)
            .finish_non_exhaustive()
    }
}

/// Bookkeeping done after a turn's action resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSummary {
    pub actor: ActorId,
    pub turn: u64,
    pub tagged_out: bool,
    /// Hand actor substituted in because the player field emptied.
    pub auto_tagged_in: Option<ActorId>,
}

/// Body of a turn, run on its own task.
enum TurnBody {
    Control(Arc<dyn InputControl>),
    Skill(Arc<dyn SkillExecutor>, SkillRequest),
    Idle,
}

impl TurnBody {
    async fn run(self, actor: ActorId, stage: StageHandle) -> Result<()> {
        match self {
            TurnBody::Control(input) => input.transfer_control(actor, stage).await,
            TurnBody::Skill(skills, request) => skills.execute(request, stage).await,
            TurnBody::Idle => Ok(()),
        }
    }
}

impl StageTurnScheduler {
    /// SelectActor and the start of ActorTurn.
    ///
    /// Returns `None` once the stage is terminal. Otherwise the head of the
    /// timeline is the acting actor, its turn-start notifications have been
    /// delivered, and its action body is running.
    pub async fn begin_turn(&mut self) -> Result<Option<PendingTurn>> {
        if self.phase == StagePhase::Ended {
            return Ok(None);
        }
        self.phase = StagePhase::SelectActor;
        self.refresh_timeline()?;

        if self.is_terminal() {
            return Ok(None);
        }
        let Some(actor) = self.timeline.head() else {
            return Ok(None);
        };

        let side = self.roster.actor(actor)?.side;
        let slot = self
            .fields
            .slot_mut(actor)
            .ok_or_else(|| StageError::not_participating(actor))?;
        if slot.disposed || self.roster.actor(actor)?.disposed {
            return Err(StageError::disposed(actor).into());
        }
        slot.turn_end = false;

        self.turns += 1;
        let turn = self.turns;
        self.slot_cost = action_time(&self.roster, self.time.as_ref(), actor);
        self.current = Some(actor);
        self.phase = StagePhase::ActorTurn;

        let scope = self.bus.push(EventScope::turn(actor));
        debug!(target: "stage::scheduler", %actor, turn, ?side, "turn started");
        self.notify(StageEvent::TurnStart { actor, turn }).await?;

        if side == Side::Player {
            let hand: Vec<ActorId> = self.fields.hand.ids().collect();
            for member in hand {
                self.notify(StageEvent::TurnWindow {
                    actor: member,
                    active: actor,
                })
                .await?;
            }
        }

        let body = self.turn_body(actor, side)?;
        let handle = self.handle();
        let token = self.cancel.child_token();
        let (gate_tx, gate) = oneshot::channel();

        let task_token = token.clone();
        let task = tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                result = body.run(actor, handle) => result,
                _ = task_token.cancelled() => Err(RuntimeError::Cancelled),
            };
            // The receiver is gone only if the scheduler was dropped.
            let _ = gate_tx.send(result);
        });

        Ok(Some(PendingTurn {
            actor,
            turn,
            gate,
            task,
            token,
            _scope: scope,
        }))
    }

    /// Waits for the turn's gate, serving handle commands meanwhile, then
    /// runs PostTurnCleanup.
    pub async fn end_turn(&mut self, pending: PendingTurn) -> Result<TurnSummary> {
        let PendingTurn {
            actor,
            turn,
            gate,
            task,
            token,
            _scope,
        } = pending;

        if let Err(err) = self.await_gate(gate, task).await {
            token.cancel();
            self.current = None;
            return Err(err);
        }

        self.phase = StagePhase::PostTurnCleanup;
        let summary = self.finish_turn(actor, turn).await?;
        self.phase = StagePhase::SelectActor;
        Ok(summary)
    }

    fn turn_body(&mut self, actor: ActorId, side: Side) -> Result<TurnBody> {
        let slot = self
            .fields
            .slot(actor)
            .ok_or_else(|| StageError::not_participating(actor))?;

        if self.input.can_control(slot, side) {
            debug!(target: "stage::scheduler", %actor, "transferring control");
            return Ok(TurnBody::Control(Arc::clone(&self.input)));
        }

        let Some(skill) = slot.data.skills.choose(&mut rand::thread_rng()).cloned() else {
            debug!(target: "stage::scheduler", %actor, "no skills, skipping action");
            return Ok(TurnBody::Idle);
        };

        let targets: Vec<ActorId> = self
            .resolver
            .find_targets(actor, skill.target, &self.fields)
            .collect();
        debug!(
            target: "stage::scheduler",
            %actor,
            skill = %skill.name,
            ?targets,
            "skill selected"
        );

        Ok(TurnBody::Skill(
            Arc::clone(&self.skills),
            SkillRequest {
                caster: actor,
                skill,
                targets,
            },
        ))
    }

    async fn await_gate(
        &mut self,
        mut gate: oneshot::Receiver<Result<()>>,
        task: JoinHandle<()>,
    ) -> Result<()> {
        loop {
            tokio::select! {
                biased;
                result = &mut gate => {
                    return match result {
                        Ok(result) => result,
                        Err(_) => match task.await {
                            Err(join) => Err(RuntimeError::Join(join)),
                            Ok(()) => Err(RuntimeError::GateDropped),
                        },
                    };
                }
                Some(command) = self.command_rx.recv() => {
                    self.handle_command(command).await?;
                }
            }
        }
    }

    /// PostTurnCleanup: turn end, tag-out, automatic substitution and
    /// advancing the queue past the finished slot.
    async fn finish_turn(&mut self, actor: ActorId, turn: u64) -> Result<TurnSummary> {
        if let Some(slot) = self.fields.slot_mut(actor) {
            slot.turn_end = true;
        }
        self.notify(StageEvent::TurnEnd { actor, turn }).await?;

        let tag_out = !self.fields.either_field_empty()
            && self
                .fields
                .player
                .get(actor)
                .is_some_and(|slot| slot.tag_out_requested);
        if tag_out {
            self.tag_out(actor).await?;
        }

        // The window belongs to the cast that opened it.
        self.parry_opened_at = None;

        let mut auto_tagged_in = None;
        if self.fields.player.is_empty() && !self.fields.enemy.is_empty() {
            let candidate = self
                .fields
                .hand
                .ids()
                .find(|&id| self.roster.stats(id).is_some_and(|stats| stats.is_alive()));
            if let Some(candidate) = candidate {
                info!(target: "stage::scheduler", actor = %candidate, "automatic tag in");
                self.enter_field(candidate, false).await?;
                auto_tagged_in = Some(candidate);
                tokio::time::sleep(self.config.auto_tag_in_delay).await;
            }
        }

        // The slot is charged what it cost when it started.
        self.current = None;
        self.timeline.advance(actor);
        if self.queue.contains(actor) {
            self.queue.consume_slot(actor, self.slot_cost)?;
        }
        self.refresh_timeline()?;

        if let Err(err) = self.fields.verify(&self.queue) {
            warn!(target: "stage::scheduler", %actor, error = %err, "membership check failed");
            return Err(err.into());
        }

        debug!(
            target: "stage::scheduler",
            %actor,
            turn,
            next = ?self.timeline.head(),
            "turn finished"
        );

        Ok(TurnSummary {
            actor,
            turn,
            tagged_out: tag_out,
            auto_tagged_in,
        })
    }
}
