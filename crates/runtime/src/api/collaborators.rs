//! Contracts the scheduler is wired with at stage setup.
//!
//! Each collaborator is injected once through [`crate::StageBuilder`]; the
//! scheduler never looks implementations up at runtime.
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use battle_core::{ActorData, ActorId, Placement, Side, SkillData, StageActor};
use tracing::{debug, trace};

use super::errors::{Result, RuntimeError};
use super::handle::StageHandle;

/// Mints and releases participation records.
pub trait ActorFactory: Send + Sync {
    fn create(&self, actor: ActorId, data: &ActorData) -> StageActor;

    /// Takes back a slot that left the stage.
    fn reserve(&self, slot: StageActor);
}

/// Factory that builds plain slots and counts the ones still handed out.
#[derive(Debug, Default)]
pub struct DefaultActorFactory {
    live: AtomicUsize,
}

impl DefaultActorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slots created and not yet reserved.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl ActorFactory for DefaultActorFactory {
    fn create(&self, actor: ActorId, data: &ActorData) -> StageActor {
        self.live.fetch_add(1, Ordering::Relaxed);
        StageActor::new(actor, data.clone())
    }

    fn reserve(&self, slot: StageActor) {
        trace!(target: "stage::factory", actor = %slot.actor, "slot released");
        // Saturate so a foreign slot cannot underflow the counter.
        let _ = self
            .live
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }
}

/// Decides who controls an actor's turn.
///
/// Control is transferred with a [`StageHandle`]; the turn ends when
/// `transfer_control` returns. There is no timeout.
#[async_trait]
pub trait InputControl: Send + Sync {
    fn can_control(&self, slot: &StageActor, side: Side) -> bool;

    async fn transfer_control(&self, actor: ActorId, stage: StageHandle) -> Result<()>;
}

/// Nobody is player-controlled; every turn uses a random skill.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoInput;

#[async_trait]
impl InputControl for AutoInput {
    fn can_control(&self, _slot: &StageActor, _side: Side) -> bool {
        false
    }

    async fn transfer_control(&self, actor: ActorId, _stage: StageHandle) -> Result<()> {
        Err(RuntimeError::input_control(
            actor,
            "auto input never accepts control",
        ))
    }
}

/// A skill picked for an AI turn, with targets already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillRequest {
    pub caster: ActorId,
    pub skill: SkillData,
    pub targets: Vec<ActorId>,
}

/// Runs the body of a skill. Any stage mutation goes through the handle.
#[async_trait]
pub trait SkillExecutor: Send + Sync {
    async fn execute(&self, request: SkillRequest, stage: StageHandle) -> Result<()>;
}

/// Applies the skill's power to every target; negative power heals.
#[derive(Debug, Default, Clone, Copy)]
pub struct DamageSkillExecutor;

#[async_trait]
impl SkillExecutor for DamageSkillExecutor {
    async fn execute(&self, request: SkillRequest, stage: StageHandle) -> Result<()> {
        let SkillRequest {
            caster,
            skill,
            targets,
        } = request;
        debug!(
            target: "stage::skill",
            %caster,
            skill = %skill.name,
            targets = targets.len(),
            "executing skill"
        );

        for target in targets {
            let applied = if skill.power >= 0 {
                stage.damage(target, skill.power).await
            } else {
                stage.heal(target, -skill.power).await
            };
            applied.map_err(|err| {
                RuntimeError::skill_execution(caster, format!("{} on {target}: {err}", skill.name))
            })?;
        }
        Ok(())
    }
}

/// Receives field membership changes for presentation. Return values are
/// never consulted by scheduling.
pub trait ViewProvider: Send + Sync {
    fn resolve(&self, actor: ActorId, placement: Placement);

    fn release(&self, actor: ActorId);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ViewProvider for NullView {
    fn resolve(&self, _actor: ActorId, _placement: Placement) {}

    fn release(&self, _actor: ActorId) {}
}
