use super::{ActorData, ActorId, CombatRole};

/// Participation record of an actor in the current stage.
///
/// A slot is owned by whichever container holds it (hand, player field or
/// enemy field) and moves between them on tag in/out. The underlying actor is
/// referenced by id only.
#[derive(Clone, Debug, PartialEq)]
pub struct StageActor {
    pub actor: ActorId,
    pub data: ActorData,
    /// Set once the actor has finished its current turn.
    pub turn_end: bool,
    /// The actor leaves the player field at the end of its turn.
    pub tag_out_requested: bool,
    /// Always classified as front rank regardless of role.
    pub override_front: bool,
    /// Higher values are targeted first.
    pub target_priority: i32,
    pub parry_count: u32,
    /// Hand actors may only tag in while this is set.
    pub can_tag: bool,
    pub disposed: bool,
}

impl StageActor {
    pub fn new(actor: ActorId, data: ActorData) -> Self {
        Self {
            actor,
            data,
            turn_end: false,
            tag_out_requested: false,
            override_front: false,
            target_priority: 0,
            parry_count: 0,
            can_tag: true,
            disposed: false,
        }
    }

    pub fn role(&self) -> CombatRole {
        self.data.role
    }

    #[must_use]
    pub fn with_target_priority(mut self, priority: i32) -> Self {
        self.target_priority = priority;
        self
    }

    #[must_use]
    pub fn with_override_front(mut self, override_front: bool) -> Self {
        self.override_front = override_front;
        self
    }
}
