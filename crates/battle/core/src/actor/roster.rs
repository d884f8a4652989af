use super::{ActorData, ActorId, ActorState, ActorStats, Side};
use crate::error::StageError;

/// Arena of every actor that takes part in an encounter.
///
/// Ids are never reused within a roster: a disposed actor keeps its slot so
/// stale ids held by collaborators resolve to a disposed record instead of a
/// different actor.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    actors: Vec<ActorState>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an actor at full health and returns its id.
    pub fn register(&mut self, side: Side, data: ActorData) -> ActorId {
        self.register_with_stats(side, ActorStats::from_data(&data), data)
    }

    /// Registers an actor carrying over stats from a previous encounter.
    pub fn register_with_stats(&mut self, side: Side, stats: ActorStats, data: ActorData) -> ActorId {
        let id = ActorId(self.actors.len() as u32);
        self.actors.push(ActorState {
            id,
            side,
            data,
            stats,
            disposed: false,
        });
        id
    }

    pub fn get(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: ActorId) -> Option<&mut ActorState> {
        self.actors.get_mut(id.0 as usize)
    }

    /// Like [`Roster::get`], but an unknown id is an invariant violation.
    pub fn actor(&self, id: ActorId) -> Result<&ActorState, StageError> {
        self.get(id).ok_or_else(|| StageError::unknown_actor(id))
    }

    pub fn actor_mut(&mut self, id: ActorId) -> Result<&mut ActorState, StageError> {
        self.get_mut(id).ok_or_else(|| StageError::unknown_actor(id))
    }

    pub fn stats(&self, id: ActorId) -> Option<&ActorStats> {
        self.get(id).map(|actor| &actor.stats)
    }

    /// Marks the actor disposed. Returns false if it was already disposed.
    pub fn dispose(&mut self, id: ActorId) -> Result<bool, StageError> {
        let actor = self.actor_mut(id)?;
        let was_live = !actor.disposed;
        actor.disposed = true;
        Ok(was_live)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorState> {
        self.actors.iter()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}
