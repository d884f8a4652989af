//! Stage lifecycle events.

use battle_core::ActorId;
use serde::{Deserialize, Serialize};

/// How a stage ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// The enemy field was emptied.
    Victory,
    /// The player field was emptied with nobody left to tag in.
    Defeat,
    /// Cancelled, turn cap reached, or the timeline ran dry.
    Aborted,
}

/// Notifications fanned out by the scheduler, one per participant affected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageEvent {
    BattleStart { actor: ActorId },

    TurnStart { actor: ActorId, turn: u64 },

    /// Sent to every hand actor when a player-side turn starts, before the
    /// acting actor resolves its action.
    TurnWindow { actor: ActorId, active: ActorId },

    TurnEnd { actor: ActorId, turn: u64 },

    TagIn {
        actor: ActorId,
        /// Occupant that will leave the field at the end of its turn.
        replacing: Option<ActorId>,
    },

    TagOut { actor: ActorId },

    Death { actor: ActorId },

    BattleEnd { actor: ActorId, verdict: Verdict },
}

impl StageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            StageEvent::BattleStart { .. } => EventKind::BattleStart,
            StageEvent::TurnStart { .. } => EventKind::TurnStart,
            StageEvent::TurnWindow { .. } => EventKind::TurnWindow,
            StageEvent::TurnEnd { .. } => EventKind::TurnEnd,
            StageEvent::TagIn { .. } => EventKind::TagIn,
            StageEvent::TagOut { .. } => EventKind::TagOut,
            StageEvent::Death { .. } => EventKind::Death,
            StageEvent::BattleEnd { .. } => EventKind::BattleEnd,
        }
    }

    /// Participant the event is addressed to.
    pub fn actor(&self) -> ActorId {
        match self {
            StageEvent::BattleStart { actor }
            | StageEvent::TurnStart { actor, .. }
            | StageEvent::TurnWindow { actor, .. }
            | StageEvent::TurnEnd { actor, .. }
            | StageEvent::TagIn { actor, .. }
            | StageEvent::TagOut { actor }
            | StageEvent::Death { actor }
            | StageEvent::BattleEnd { actor, .. } => *actor,
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    /// Spans a whole turn, from turn start until cleanup finishes.
    Turn,
    BattleStart,
    TurnStart,
    TurnWindow,
    TurnEnd,
    TagIn,
    TagOut,
    Death,
    BattleEnd,
}

/// Context frame pushed while an event (or a whole turn) is being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventScope {
    pub kind: EventKind,
    pub actor: ActorId,
}

impl EventScope {
    pub const fn new(kind: EventKind, actor: ActorId) -> Self {
        Self { kind, actor }
    }

    pub fn turn(actor: ActorId) -> Self {
        Self::new(EventKind::Turn, actor)
    }
}

impl From<&StageEvent> for EventScope {
    fn from(event: &StageEvent) -> Self {
        Self::new(event.kind(), event.actor())
    }
}
