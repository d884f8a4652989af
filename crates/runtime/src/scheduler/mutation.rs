//! Stage mutations reachable from handle commands and the turn loop.

use tracing::{debug, info};

use battle_core::{ActorId, ActorStats, Placement, StageError};

use super::StageTurnScheduler;
use crate::api::Result;
use crate::events::StageEvent;

impl StageTurnScheduler {
    /// Delete/death: removes the actor from whichever container holds it,
    /// purges every timeline entry and its queue slot, and releases the slot.
    ///
    /// Safe while the actor's own turn is in flight; the turn then finishes
    /// without re-adding it.
    pub(crate) async fn delete(&mut self, actor: ActorId) -> Result<()> {
        let (placement, mut slot) = self
            .fields
            .take(actor)
            .ok_or_else(|| StageError::not_participating(actor))?;

        let purged = self.timeline.remove_all(actor);
        let was_queued = self.queue.remove(actor);
        if placement.is_scheduled() && !was_queued {
            return Err(StageError::membership(actor, "field actor was not queued").into());
        }

        self.view.release(actor);
        slot.disposed = true;
        self.roster.dispose(actor)?;
        self.factory.reserve(slot);
        self.refresh_timeline()?;

        info!(
            target: "stage::scheduler",
            %actor,
            placement = %placement,
            purged,
            "actor removed from stage"
        );
        Ok(())
    }

    /// Applies damage; at zero HP the death notification fires and the actor
    /// is deleted. `None` if the actor is no longer in the stage.
    pub(crate) async fn damage(&mut self, actor: ActorId, amount: i32) -> Result<Option<ActorStats>> {
        if self.fields.locate(actor).is_none() {
            debug!(target: "stage::scheduler", %actor, "damage on absent actor ignored");
            return Ok(None);
        }

        let state = self.roster.actor_mut(actor)?;
        state.stats.hp = state.stats.hp.saturating_sub(amount.max(0)).max(0);
        let stats = state.stats;
        debug!(target: "stage::scheduler", %actor, amount, hp = stats.hp, "damage applied");

        if !stats.is_alive() {
            info!(target: "stage::scheduler", %actor, "actor died");
            self.notify(StageEvent::Death { actor }).await?;
            // A listener may already have removed it.
            if self.fields.locate(actor).is_some() {
                self.delete(actor).await?;
            }
        }
        Ok(Some(stats))
    }

    pub(crate) fn heal(&mut self, actor: ActorId, amount: i32) -> Result<Option<ActorStats>> {
        if self.fields.locate(actor).is_none() {
            return Ok(None);
        }

        let state = self.roster.actor_mut(actor)?;
        let stats = &mut state.stats;
        stats.hp = stats.hp.saturating_add(amount.max(0)).min(stats.max_hp);
        debug!(target: "stage::scheduler", %actor, amount, hp = stats.hp, "healed");
        Ok(Some(*stats))
    }

    /// Updates live speed and rebuilds the timeline against it.
    pub(crate) fn set_speed(&mut self, actor: ActorId, speed: i32) -> Result<bool> {
        if self.fields.locate(actor).is_none() {
            return Ok(false);
        }

        self.roster.actor_mut(actor)?.stats.speed = speed;
        self.refresh_timeline()?;
        debug!(
            target: "stage::scheduler",
            %actor,
            speed,
            timeline = ?self.timeline.as_slice(),
            "speed changed"
        );
        Ok(true)
    }

    pub(crate) fn request_tag_out(&mut self, actor: ActorId) -> bool {
        match self.fields.player.get_mut(actor) {
            Some(slot) => {
                slot.tag_out_requested = true;
                debug!(target: "stage::scheduler", %actor, "tag out requested");
                true
            }
            None => false,
        }
    }

    /// Moves a player field actor back to the hand and unschedules it.
    pub(crate) async fn tag_out(&mut self, actor: ActorId) -> Result<()> {
        let mut slot = self.fields.player.remove(actor)?;
        slot.tag_out_requested = false;
        self.fields.hand.push(slot)?;

        if !self.queue.remove(actor) {
            return Err(StageError::membership(actor, "tagged out actor was not queued").into());
        }
        self.timeline.remove_all(actor);
        self.view.resolve(actor, Placement::Hand);
        self.refresh_timeline()?;

        info!(target: "stage::scheduler", %actor, "tagged out");
        self.notify(StageEvent::TagOut { actor }).await
    }
}
