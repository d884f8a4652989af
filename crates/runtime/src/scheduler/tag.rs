//! Tag-in rules.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use battle_core::{ActorId, Placement, StageError};

use super::StageTurnScheduler;
use crate::api::Result;
use crate::events::StageEvent;

/// Why a tag-in was refused. These are expected timing races, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagInRejection {
    /// The player field already holds an incoming and an outgoing actor.
    SwapInProgress,
    NoSuchHandSlot { index: usize },
    CannotTag { actor: ActorId },
    /// Not a player turn and no parry window is open.
    NotYourTurn { actor: ActorId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagInResult {
    Accepted {
        actor: ActorId,
        replacing: Option<ActorId>,
    },
    Rejected(TagInRejection),
}

impl TagInResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, TagInResult::Accepted { .. })
    }
}

impl StageTurnScheduler {
    /// Tags in the hand actor at `index` if every precondition holds.
    pub(crate) async fn tag_in(&mut self, index: usize) -> Result<TagInResult> {
        let (actor, parried) = match self.check_tag_in(index) {
            Ok(checked) => checked,
            Err(rejection) => {
                warn!(target: "stage::scheduler", index, ?rejection, "tag in rejected");
                return Ok(TagInResult::Rejected(rejection));
            }
        };

        if parried {
            self.parry_opened_at = None;
            if let Some(index) = self.fields.hand.index_of(actor)
                && let Some(slot) = self.fields.hand.get_mut(index)
            {
                slot.parry_count += 1;
            }
            info!(target: "stage::scheduler", %actor, "tag in through parry window");
        }

        self.enter_field(actor, true).await
    }

    fn check_tag_in(&self, index: usize) -> std::result::Result<(ActorId, bool), TagInRejection> {
        if self.fields.player.len() > 1 {
            return Err(TagInRejection::SwapInProgress);
        }

        let slot = self
            .fields
            .hand
            .get(index)
            .ok_or(TagInRejection::NoSuchHandSlot { index })?;
        let actor = slot.actor;
        if !slot.can_tag {
            return Err(TagInRejection::CannotTag { actor });
        }

        if self.is_player_turn() {
            Ok((actor, false))
        } else if self.parry_window_open() {
            Ok((actor, true))
        } else {
            Err(TagInRejection::NotYourTurn { actor })
        }
    }

    /// A player field actor is mid-turn.
    fn is_player_turn(&self) -> bool {
        self.current
            .and_then(|actor| self.fields.locate(actor))
            .is_some_and(|placement| placement == Placement::PlayerField)
    }

    fn parry_window_open(&self) -> bool {
        self.parry_opened_at
            .is_some_and(|opened| opened.elapsed() <= self.config.parry_window)
    }

    pub(crate) fn open_parry_window(&mut self) {
        self.parry_opened_at = Some(tokio::time::Instant::now());
        debug!(target: "stage::scheduler", window = ?self.config.parry_window, "parry window opened");
    }

    /// Moves a hand actor onto the player field without any precondition.
    ///
    /// An existing occupant is marked to tag out and the newcomer is queued
    /// right behind it, so the occupant still finishes its current slot.
    pub(crate) async fn enter_field(&mut self, actor: ActorId, requested: bool) -> Result<TagInResult> {
        let slot = self
            .fields
            .hand
            .take(actor)
            .ok_or_else(|| StageError::not_participating(actor))?;

        let replacing = self.fields.player.first().map(|occupant| occupant.actor);
        match replacing {
            Some(occupant) => {
                if let Some(occupant) = self.fields.player.get_mut(occupant) {
                    occupant.tag_out_requested = true;
                }
                self.queue.insert_after_actor(occupant, actor)?;
            }
            None => self.queue.enqueue(actor)?,
        }
        self.fields.player.add(slot)?;
        self.view.resolve(actor, Placement::PlayerField);
        self.refresh_timeline()?;

        info!(
            target: "stage::scheduler",
            %actor,
            replacing = ?replacing,
            requested,
            "tagged in"
        );
        self.notify(StageEvent::TagIn { actor, replacing }).await?;

        Ok(TagInResult::Accepted { actor, replacing })
    }
}
