//! Bounded preview of upcoming turns.
//!
//! The timeline is a view over [`TimelineQueue`]: it is materialised by
//! dequeuing from a clone of the queue, never patched in place. After any
//! change to field membership the caller collapses it to the current head and
//! refills it with [`Timeline::rebuild`].

use arrayvec::ArrayVec;

use crate::actor::ActorId;
use crate::config::BattleConfig;
use crate::error::QueueError;
use crate::queue::TimelineQueue;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Timeline {
    entries: ArrayVec<ActorId, { BattleConfig::MAX_TIMELINE }>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actor whose turn is active or about to become active.
    pub fn head(&self) -> Option<ActorId> {
        self.entries.first().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.entries.contains(&actor)
    }

    pub fn as_slice(&self) -> &[ActorId] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.entries.iter().copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops the head if it belongs to `actor`. Returns whether it did.
    ///
    /// A head that was deleted mid-turn is already gone, in which case the
    /// timeline is left alone.
    pub fn advance(&mut self, actor: ActorId) -> bool {
        if self.head() == Some(actor) {
            self.entries.remove(0);
            true
        } else {
            false
        }
    }

    /// Drops every entry referencing `actor`, not just the head.
    pub fn remove_all(&mut self, actor: ActorId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| *entry != actor);
        before - self.entries.len()
    }

    /// Collapses to the current head and refills up to `window` entries.
    ///
    /// If the previous head is still queued, the queue is re-indexed to start
    /// from it so insertion-order ties keep favouring the active actor.
    pub fn rebuild<F>(
        &mut self,
        queue: &mut TimelineQueue,
        time_of: F,
        window: usize,
    ) -> Result<(), QueueError>
    where
        F: Fn(ActorId) -> f64,
    {
        if let Some(head) = self.head().filter(|head| queue.contains(*head)) {
            queue.start_from(head)?;
        }

        self.entries.clear();
        if queue.is_empty() {
            return Ok(());
        }
        self.fill(queue.clone(), &time_of, window)
    }

    /// Rebuilds while `active` is mid-turn.
    ///
    /// `active` stays at the head regardless of live time changes, and its
    /// in-flight slot is charged at `cost`, the action time it started with.
    /// Falls back to [`Timeline::rebuild`] once `active` is no longer queued.
    pub fn rebuild_active<F>(
        &mut self,
        queue: &mut TimelineQueue,
        time_of: F,
        window: usize,
        active: ActorId,
        cost: f64,
    ) -> Result<(), QueueError>
    where
        F: Fn(ActorId) -> f64,
    {
        if !queue.contains(active) {
            return self.rebuild(queue, time_of, window);
        }

        queue.start_from(active)?;
        self.entries.clear();
        self.entries.push(active);

        let mut preview = queue.clone();
        preview.consume_slot(active, cost)?;
        self.fill(preview, &time_of, window)
    }

    fn fill<F>(&mut self, mut preview: TimelineQueue, time_of: &F, window: usize) -> Result<(), QueueError>
    where
        F: Fn(ActorId) -> f64,
    {
        let window = window.clamp(1, BattleConfig::MAX_TIMELINE);
        while self.entries.len() < window {
            self.entries.push(preview.dequeue(time_of)?);
        }
        Ok(())
    }
}
