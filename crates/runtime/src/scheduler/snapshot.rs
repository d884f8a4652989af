use serde::{Deserialize, Serialize};

use battle_core::{ActorField, ActorId, ActorStats, CombatRole, Position, StageActor};

use super::StageTurnScheduler;

/// Read model of one participation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotView {
    pub actor: ActorId,
    pub name: String,
    pub role: CombatRole,
    /// Targeting rank; `None` for hand actors.
    pub position: Option<Position>,
    pub stats: ActorStats,
    pub tag_out_requested: bool,
    pub can_tag: bool,
}

/// Stage state as seen by input and presentation collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub hand: Vec<SlotView>,
    pub player: Vec<SlotView>,
    pub enemy: Vec<SlotView>,
    pub timeline: Vec<ActorId>,
    pub current: Option<ActorId>,
    pub turn: u64,
}

impl StageTurnScheduler {
    pub fn snapshot(&self) -> StageSnapshot {
        StageSnapshot {
            hand: self
                .fields
                .hand
                .iter()
                .map(|slot| self.slot_view(slot, None))
                .collect(),
            player: self.field_views(&self.fields.player),
            enemy: self.field_views(&self.fields.enemy),
            timeline: self.timeline.as_slice().to_vec(),
            current: self.current,
            turn: self.turns,
        }
    }

    fn field_views(&self, field: &ActorField) -> Vec<SlotView> {
        field
            .iter()
            .map(|slot| self.slot_view(slot, field.position_of(slot.actor)))
            .collect()
    }

    fn slot_view(&self, slot: &StageActor, position: Option<Position>) -> SlotView {
        let stats = self
            .roster
            .stats(slot.actor)
            .copied()
            .unwrap_or_else(|| ActorStats::from_data(&slot.data));
        SlotView {
            actor: slot.actor,
            name: slot.data.name.clone(),
            role: slot.role(),
            position,
            stats,
            tag_out_requested: slot.tag_out_requested,
            can_tag: slot.can_tag,
        }
    }
}
