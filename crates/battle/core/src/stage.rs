//! Field membership for one encounter.
//!
//! [`StageFields`] owns the three containers a participation record can live
//! in. An actor is in at most one of them at a time, and is scheduled in the
//! queue iff it stands on the player or enemy field.

use std::collections::HashSet;

use crate::actor::{ActorId, Side, StageActor};
use crate::error::StageError;
use crate::field::{ActorField, Hand};
use crate::queue::TimelineQueue;
use crate::targeting::FieldView;

/// Container currently holding a participation record.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Placement {
    Hand,
    PlayerField,
    EnemyField,
}

impl Placement {
    pub const fn side(self) -> Side {
        match self {
            Placement::Hand | Placement::PlayerField => Side::Player,
            Placement::EnemyField => Side::Enemy,
        }
    }

    /// Actors on either field are scheduled; hand actors are not.
    pub const fn is_scheduled(self) -> bool {
        !matches!(self, Placement::Hand)
    }
}

#[derive(Clone, Debug)]
pub struct StageFields {
    pub hand: Hand,
    pub player: ActorField,
    pub enemy: ActorField,
}

impl StageFields {
    pub fn new() -> Self {
        Self {
            hand: Hand::new(),
            player: ActorField::new(Side::Player),
            enemy: ActorField::new(Side::Enemy),
        }
    }

    pub fn field_mut(&mut self, side: Side) -> &mut ActorField {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    pub fn locate(&self, actor: ActorId) -> Option<Placement> {
        if self.player.contains(actor) {
            Some(Placement::PlayerField)
        } else if self.enemy.contains(actor) {
            Some(Placement::EnemyField)
        } else if self.hand.contains(actor) {
            Some(Placement::Hand)
        } else {
            None
        }
    }

    pub fn slot(&self, actor: ActorId) -> Option<&StageActor> {
        self.player
            .get(actor)
            .or_else(|| self.enemy.get(actor))
            .or_else(|| self.hand.index_of(actor).and_then(|i| self.hand.get(i)))
    }

    pub fn slot_mut(&mut self, actor: ActorId) -> Option<&mut StageActor> {
        match self.locate(actor)? {
            Placement::PlayerField => self.player.get_mut(actor),
            Placement::EnemyField => self.enemy.get_mut(actor),
            Placement::Hand => {
                let index = self.hand.index_of(actor)?;
                self.hand.get_mut(index)
            }
        }
    }

    /// Removes the actor from whichever container holds it.
    pub fn take(&mut self, actor: ActorId) -> Option<(Placement, StageActor)> {
        let placement = self.locate(actor)?;
        let slot = match placement {
            Placement::PlayerField => self.player.take(actor),
            Placement::EnemyField => self.enemy.take(actor),
            Placement::Hand => self.hand.take(actor),
        }?;
        Some((placement, slot))
    }

    /// True once either side has nobody left on its field.
    pub fn either_field_empty(&self) -> bool {
        self.player.is_empty() || self.enemy.is_empty()
    }

    /// Every participant, in hand/player/enemy order.
    pub fn participants(&self) -> impl Iterator<Item = &StageActor> {
        self.hand
            .iter()
            .chain(self.player.iter())
            .chain(self.enemy.iter())
    }

    /// Checks field exclusivity and queue/field agreement.
    pub fn verify(&self, queue: &TimelineQueue) -> Result<(), StageError> {
        let mut seen = HashSet::new();
        for slot in self.participants() {
            if !seen.insert(slot.actor) {
                return Err(StageError::membership(
                    slot.actor,
                    "actor present in more than one container",
                ));
            }
        }

        for slot in self.player.iter().chain(self.enemy.iter()) {
            if !queue.contains(slot.actor) {
                return Err(StageError::membership(slot.actor, "field actor is not queued"));
            }
        }

        for entry in queue.entries() {
            let on_field = self.player.contains(entry.actor) || self.enemy.contains(entry.actor);
            if !on_field {
                return Err(StageError::membership(entry.actor, "queued actor is not on a field"));
            }
        }

        Ok(())
    }
}

impl Default for StageFields {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldView for StageFields {
    fn field(&self, side: Side) -> &ActorField {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    fn side_of(&self, actor: ActorId) -> Option<Side> {
        self.locate(actor).map(Placement::side)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::{ActorData, CombatRole};

    fn slot(id: u32) -> StageActor {
        StageActor::new(ActorId(id), ActorData::new("s", CombatRole::Default, 10, 10))
    }

    #[test]
    fn locate_and_take_follow_the_holder() {
        let mut fields = StageFields::new();
        fields.hand.push(slot(0)).unwrap();
        fields.player.add(slot(1)).unwrap();
        fields.enemy.add(slot(2)).unwrap();

        assert_eq!(fields.locate(ActorId(0)), Some(Placement::Hand));
        assert_eq!(fields.side_of(ActorId(2)), Some(Side::Enemy));
        assert_eq!(fields.side_of(ActorId(0)), Some(Side::Player));

        let (placement, taken) = fields.take(ActorId(1)).unwrap();
        assert_eq!(placement, Placement::PlayerField);
        assert_eq!(taken.actor, ActorId(1));
        assert!(fields.locate(ActorId(1)).is_none());
        assert!(fields.either_field_empty());
    }

    #[test]
    fn verify_detects_duplicates_and_queue_drift() {
        let mut fields = StageFields::new();
        let mut queue = TimelineQueue::default();
        fields.player.add(slot(1)).unwrap();
        fields.enemy.add(slot(2)).unwrap();
        queue.enqueue(ActorId(1)).unwrap();
        queue.enqueue(ActorId(2)).unwrap();
        assert!(fields.verify(&queue).is_ok());

        fields.hand.push(slot(1)).unwrap();
        assert!(matches!(fields.verify(&queue), Err(StageError::Membership { .. })));
        fields.hand.take(ActorId(1));

        queue.enqueue(ActorId(9)).unwrap();
        assert!(fields.verify(&queue).is_err());
        queue.remove(ActorId(9));

        queue.remove(ActorId(2));
        assert!(fields.verify(&queue).is_err());
    }
}
