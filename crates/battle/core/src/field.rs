//! Per-side collections of participation records.
//!
//! An [`ActorField`] holds the actors actively fighting for one side, kept in
//! role order (Defensive actors after Default/Offensive ones, stable
//! otherwise). The [`Hand`] is the player's bench: insertion ordered and
//! never scheduled.
//!
//! Front/back rank is a targeting classification, not a spatial position.
//! Defensive actors hold the front line.

use std::cmp::{Ordering, Reverse};

use crate::actor::{ActorId, CombatRole, Side, StageActor};
use crate::error::FieldError;

/// Targeting rank of an actor inside its field.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Position {
    Front,
    Back,
}

impl Position {
    pub const fn is_front(self) -> bool {
        matches!(self, Position::Front)
    }

    const fn from_front(is_front: bool) -> Self {
        if is_front { Position::Front } else { Position::Back }
    }
}

/// Snapshot row produced for the target resolver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldTarget {
    pub actor: ActorId,
    pub position: Position,
    pub priority: i32,
}

#[derive(Clone, Debug)]
pub struct ActorField {
    side: Side,
    slots: Vec<StageActor>,
}

impl ActorField {
    pub fn new(side: Side) -> Self {
        Self {
            side,
            slots: Vec::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.slots.iter().any(|slot| slot.actor == actor)
    }

    pub fn get(&self, actor: ActorId) -> Option<&StageActor> {
        self.slots.iter().find(|slot| slot.actor == actor)
    }

    pub fn get_mut(&mut self, actor: ActorId) -> Option<&mut StageActor> {
        self.slots.iter_mut().find(|slot| slot.actor == actor)
    }

    pub fn first(&self) -> Option<&StageActor> {
        self.slots.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageActor> {
        self.slots.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.slots.iter().map(|slot| slot.actor)
    }

    /// Inserts a slot at its role-ordered position.
    pub fn add(&mut self, slot: StageActor) -> Result<(), FieldError> {
        if self.contains(slot.actor) {
            return Err(FieldError::Duplicate { actor: slot.actor });
        }

        let rank = slot.role().sort_rank();
        let at = self
            .slots
            .iter()
            .position(|existing| existing.role().sort_rank() > rank)
            .unwrap_or(self.slots.len());
        self.slots.insert(at, slot);
        Ok(())
    }

    pub fn remove(&mut self, actor: ActorId) -> Result<StageActor, FieldError> {
        self.take(actor).ok_or(FieldError::Missing { actor })
    }

    /// Removes the slot if present.
    pub fn take(&mut self, actor: ActorId) -> Option<StageActor> {
        let pos = self.slots.iter().position(|slot| slot.actor == actor)?;
        Some(self.slots.remove(pos))
    }

    pub fn drain(&mut self) -> impl Iterator<Item = StageActor> + '_ {
        self.slots.drain(..)
    }

    /// Classifies `candidate` against the current occupants.
    ///
    /// The candidate does not need to be a member; if it is, its own slot is
    /// ignored. A lineup of at most one actor is always front.
    pub fn resolve_position(&self, candidate: &StageActor) -> Position {
        let mut others = self.slots.iter().filter(|slot| slot.actor != candidate.actor);

        let Some(leader) = others.clone().next() else {
            return Position::Front;
        };

        if leader.role() == CombatRole::Defensive {
            let order = front_order(candidate, leader);
            if order == Ordering::Equal {
                return Position::Front;
            }
            return Position::from_front(order == Ordering::Greater);
        }

        others
            .find_map(|other| match front_order(candidate, other) {
                Ordering::Equal => None,
                order => Some(Position::from_front(order == Ordering::Greater)),
            })
            .unwrap_or(Position::Front)
    }

    /// Rank of a member, honoring its override-front flag.
    pub fn position_of(&self, actor: ActorId) -> Option<Position> {
        self.get(actor).map(|slot| self.slot_position(slot))
    }

    /// Copies live occupants ordered by descending targeting priority.
    ///
    /// Ties keep field order. `out` is cleared first so callers can reuse a
    /// pooled buffer.
    pub fn copy_to_with_target_priority(&self, out: &mut Vec<FieldTarget>) {
        out.clear();
        out.extend(
            self.slots
                .iter()
                .filter(|slot| !slot.disposed)
                .map(|slot| FieldTarget {
                    actor: slot.actor,
                    position: self.slot_position(slot),
                    priority: slot.target_priority,
                }),
        );
        out.sort_by_key(|target| Reverse(target.priority));
    }

    fn slot_position(&self, slot: &StageActor) -> Position {
        if slot.override_front {
            Position::Front
        } else {
            self.resolve_position(slot)
        }
    }
}

/// Greater when `candidate` stands further forward than `other`.
fn front_order(candidate: &StageActor, other: &StageActor) -> Ordering {
    candidate.role().sort_rank().cmp(&other.role().sort_rank())
}

/// Player bench. Actors here are not scheduled.
#[derive(Clone, Debug, Default)]
pub struct Hand {
    slots: Vec<StageActor>,
}

impl Hand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.slots.iter().any(|slot| slot.actor == actor)
    }

    pub fn get(&self, index: usize) -> Option<&StageActor> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut StageActor> {
        self.slots.get_mut(index)
    }

    pub fn index_of(&self, actor: ActorId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.actor == actor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageActor> {
        self.slots.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.slots.iter().map(|slot| slot.actor)
    }

    /// Appends a slot at the end of the bench.
    pub fn push(&mut self, slot: StageActor) -> Result<(), FieldError> {
        if self.contains(slot.actor) {
            return Err(FieldError::Duplicate { actor: slot.actor });
        }
        self.slots.push(slot);
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Option<StageActor> {
        (index < self.slots.len()).then(|| self.slots.remove(index))
    }

    pub fn take(&mut self, actor: ActorId) -> Option<StageActor> {
        let index = self.index_of(actor)?;
        self.remove_at(index)
    }

    pub fn drain(&mut self) -> impl Iterator<Item = StageActor> + '_ {
        self.slots.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorData;

    fn slot(id: u32, role: CombatRole) -> StageActor {
        StageActor::new(ActorId(id), ActorData::new(format!("a{id}"), role, 10, 10))
    }

    fn field_of(slots: Vec<StageActor>) -> ActorField {
        let mut field = ActorField::new(Side::Player);
        for s in slots {
            field.add(s).unwrap();
        }
        field
    }

    #[test]
    fn defensive_actors_sort_after_the_rest() {
        let field = field_of(vec![
            slot(0, CombatRole::Defensive),
            slot(1, CombatRole::Offensive),
            slot(2, CombatRole::Defensive),
            slot(3, CombatRole::Default),
        ]);

        let ids: Vec<_> = field.ids().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 3, 0, 2]);
    }

    #[test]
    fn duplicate_add_and_missing_remove_fail() {
        let mut field = field_of(vec![slot(0, CombatRole::Default)]);

        assert_eq!(
            field.add(slot(0, CombatRole::Offensive)),
            Err(FieldError::Duplicate { actor: ActorId(0) })
        );
        assert_eq!(
            field.remove(ActorId(5)).unwrap_err(),
            FieldError::Missing { actor: ActorId(5) }
        );
    }

    #[test]
    fn small_lineups_are_front() {
        let empty = ActorField::new(Side::Enemy);
        assert_eq!(empty.resolve_position(&slot(0, CombatRole::Offensive)), Position::Front);

        let solo = field_of(vec![slot(0, CombatRole::Offensive)]);
        assert_eq!(solo.position_of(ActorId(0)), Some(Position::Front));
    }

    #[test]
    fn offensive_candidate_behind_defensive_occupant_is_back() {
        let field = field_of(vec![slot(0, CombatRole::Defensive)]);

        assert_eq!(
            field.resolve_position(&slot(1, CombatRole::Offensive)),
            Position::Back
        );
        assert_eq!(
            field.resolve_position(&slot(2, CombatRole::Defensive)),
            Position::Front
        );
    }

    #[test]
    fn mixed_field_scans_for_first_differing_rank() {
        let field = field_of(vec![
            slot(0, CombatRole::Offensive),
            slot(1, CombatRole::Default),
            slot(2, CombatRole::Defensive),
        ]);

        assert_eq!(field.position_of(ActorId(0)), Some(Position::Back));
        assert_eq!(field.position_of(ActorId(1)), Some(Position::Back));
        assert_eq!(field.position_of(ActorId(2)), Some(Position::Front));
    }

    #[test]
    fn uniform_field_is_all_front() {
        let field = field_of(vec![
            slot(0, CombatRole::Offensive),
            slot(1, CombatRole::Default),
        ]);

        assert!(field.iter().all(|s| field.position_of(s.actor) == Some(Position::Front)));
    }

    #[test]
    fn override_front_wins_over_role() {
        let field = field_of(vec![
            slot(0, CombatRole::Offensive).with_override_front(true),
            slot(1, CombatRole::Defensive),
        ]);
        assert_eq!(field.position_of(ActorId(0)), Some(Position::Front));
    }

    #[test]
    fn priority_copy_orders_by_priority_then_field_order() {
        let mut field = field_of(vec![
            slot(0, CombatRole::Offensive),
            slot(1, CombatRole::Offensive).with_target_priority(5),
            slot(2, CombatRole::Defensive),
            slot(3, CombatRole::Default).with_target_priority(5),
        ]);
        field.get_mut(ActorId(0)).unwrap().disposed = true;

        let mut out = vec![FieldTarget {
            actor: ActorId(99),
            position: Position::Back,
            priority: 0,
        }];
        field.copy_to_with_target_priority(&mut out);

        let ids: Vec<_> = out.iter().map(|t| t.actor.0).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(out[2].position, Position::Front);
    }

    #[test]
    fn hand_keeps_insertion_order() {
        let mut hand = Hand::new();
        hand.push(slot(4, CombatRole::Defensive)).unwrap();
        hand.push(slot(2, CombatRole::Default)).unwrap();
        assert!(hand.push(slot(4, CombatRole::Default)).is_err());

        assert_eq!(hand.index_of(ActorId(2)), Some(1));
        assert_eq!(hand.remove_at(0).map(|s| s.actor), Some(ActorId(4)));
        assert!(hand.remove_at(3).is_none());
        assert_eq!(hand.take(ActorId(2)).map(|s| s.actor), Some(ActorId(2)));
        assert!(hand.is_empty());
    }
}
