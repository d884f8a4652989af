//! Round-robin priority queue keyed by live action time.
//!
//! Every active actor owns exactly one [`QueueEntry`]. Consuming an entry
//! never removes it: the entry's offset grows by the actor's action time and
//! it takes a fresh insertion index, which re-inserts it behind everyone it
//! ties with. The queue therefore only shrinks through
//! [`TimelineQueue::remove`] or [`TimelineQueue::clear`].
//!
//! Ordering:
//! - primary key: `time_of(actor) + offset`, re-evaluated on every comparison
//! - secondary key: insertion index, used when primary keys are within
//!   `epsilon` of each other
//!
//! Entries are kept in an unsorted `Vec` and the minimum is found by a linear
//! scan. Keys depend on live stats, so a heap would go stale as soon as a
//! buff changes an actor's speed.

use std::cmp::Ordering;

use crate::actor::ActorId;
use crate::config::BattleConfig;
use crate::error::QueueError;

/// A scheduled slot for one actor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QueueEntry {
    pub actor: ActorId,
    /// Insertion order tie-break. Lower indices win ties.
    pub index: u64,
    /// Accumulated time of every slot this actor has consumed.
    pub offset: f64,
}

impl QueueEntry {
    /// Effective time of this entry's next slot.
    pub fn key<F>(&self, time_of: F) -> f64
    where
        F: Fn(ActorId) -> f64,
    {
        time_of(self.actor) + self.offset
    }
}

#[derive(Clone, Debug)]
pub struct TimelineQueue {
    entries: Vec<QueueEntry>,
    next_index: u64,
    elapsed: f64,
    epsilon: f64,
}

impl TimelineQueue {
    pub fn new(epsilon: f64) -> Self {
        Self {
            entries: Vec::new(),
            next_index: 0,
            elapsed: 0.0,
            epsilon: epsilon.abs(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.position(actor).is_some()
    }

    /// Insertion index currently held by `actor`.
    pub fn index_of(&self, actor: ActorId) -> Option<u64> {
        self.position(actor).map(|pos| self.entries[pos].index)
    }

    pub fn entry(&self, actor: ActorId) -> Option<&QueueEntry> {
        self.position(actor).map(|pos| &self.entries[pos])
    }

    /// Effective time of the most recently consumed slot.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Adds an actor behind everything already queued.
    ///
    /// The new entry starts at the queue's elapsed time (zero on a fresh
    /// queue) so it is ordered against the current timeline.
    pub fn enqueue(&mut self, actor: ActorId) -> Result<(), QueueError> {
        if self.contains(actor) {
            return Err(QueueError::Duplicate { actor });
        }

        self.entries.push(QueueEntry {
            actor,
            index: self.next_index,
            offset: self.elapsed,
        });
        self.next_index += 1;
        Ok(())
    }

    /// Inserts `actor` directly behind the entry holding `after_index`.
    ///
    /// Every entry with an index greater than `after_index` shifts up by one
    /// and the new entry takes `after_index + 1`. It inherits the offset of
    /// the entry it follows, so on equal speed the insertion index decides.
    /// Fails with [`QueueError::MissingIndex`] if no entry holds `after_index`.
    pub fn insert_after(&mut self, after_index: u64, actor: ActorId) -> Result<(), QueueError> {
        if self.contains(actor) {
            return Err(QueueError::Duplicate { actor });
        }

        let offset = self
            .entries
            .iter()
            .find(|entry| entry.index == after_index)
            .map(|entry| entry.offset)
            .ok_or(QueueError::MissingIndex { index: after_index })?;

        for entry in &mut self.entries {
            if entry.index > after_index {
                entry.index += 1;
            }
        }

        self.entries.push(QueueEntry {
            actor,
            index: after_index + 1,
            offset,
        });
        self.sync_next_index();
        Ok(())
    }

    /// Convenience wrapper over [`TimelineQueue::insert_after`] keyed by actor.
    pub fn insert_after_actor(&mut self, after: ActorId, actor: ActorId) -> Result<(), QueueError> {
        let index = self
            .index_of(after)
            .ok_or(QueueError::Missing { actor: after })?;
        self.insert_after(index, actor)
    }

    /// Returns the actor holding the current minimum without consuming it.
    pub fn peek<F>(&self, time_of: F) -> Option<ActorId>
    where
        F: Fn(ActorId) -> f64,
    {
        self.min_position(&time_of).map(|pos| self.entries[pos].actor)
    }

    /// Consumes the minimum slot and returns its actor.
    ///
    /// The entry stays queued with its offset advanced by the actor's current
    /// action time and a fresh insertion index.
    pub fn dequeue<F>(&mut self, time_of: F) -> Result<ActorId, QueueError>
    where
        F: Fn(ActorId) -> f64,
    {
        let pos = self.min_position(&time_of).ok_or(QueueError::Empty)?;
        Ok(self.consume_at(pos, &time_of))
    }

    /// Consumes the slot of a specific actor, wherever it sits in the order.
    pub fn consume<F>(&mut self, actor: ActorId, time_of: F) -> Result<(), QueueError>
    where
        F: Fn(ActorId) -> f64,
    {
        let pos = self.position(actor).ok_or(QueueError::Missing { actor })?;
        self.consume_at(pos, &time_of);
        Ok(())
    }

    /// Consumes `actor`'s slot at a fixed cost instead of its live time.
    ///
    /// Used for a slot whose cost was fixed when it started, so a speed
    /// change during the slot only affects the ones after it.
    pub fn consume_slot(&mut self, actor: ActorId, cost: f64) -> Result<(), QueueError> {
        let pos = self.position(actor).ok_or(QueueError::Missing { actor })?;
        self.consume_at(pos, &|_| cost);
        Ok(())
    }

    /// True iff `actor` holds the current minimum.
    pub fn is_start_from<F>(&self, actor: ActorId, time_of: F) -> bool
    where
        F: Fn(ActorId) -> f64,
    {
        self.peek(time_of) == Some(actor)
    }

    /// Re-indexes so that `actor` holds index 0.
    ///
    /// Entries whose index was lower than the actor's shift up by one; the
    /// rest keep their index.
    pub fn start_from(&mut self, actor: ActorId) -> Result<(), QueueError> {
        let pos = self.position(actor).ok_or(QueueError::Missing { actor })?;
        let pivot = self.entries[pos].index;

        for entry in &mut self.entries {
            if entry.index < pivot {
                entry.index += 1;
            }
        }
        self.entries[pos].index = 0;
        self.sync_next_index();
        Ok(())
    }

    /// Removes `actor` if present. Returns whether an entry was removed.
    pub fn remove(&mut self, actor: ActorId) -> bool {
        match self.position(actor) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.next_index = 0;
        self.elapsed = 0.0;
    }

    /// Queued actors in effective order (next to act first).
    pub fn ordered<F>(&self, time_of: F) -> Vec<ActorId>
    where
        F: Fn(ActorId) -> f64,
    {
        let mut entries = self.entries.clone();
        entries.sort_by(|a, b| self.compare(a, b, &time_of));
        entries.into_iter().map(|entry| entry.actor).collect()
    }

    fn compare<F>(&self, a: &QueueEntry, b: &QueueEntry, time_of: &F) -> Ordering
    where
        F: Fn(ActorId) -> f64,
    {
        let ka = a.key(time_of);
        let kb = b.key(time_of);

        if (ka - kb).abs() <= self.epsilon {
            a.index.cmp(&b.index)
        } else {
            ka.total_cmp(&kb)
        }
    }

    fn min_position<F>(&self, time_of: &F) -> Option<usize>
    where
        F: Fn(ActorId) -> f64,
    {
        self.entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| self.compare(a, b, time_of))
            .map(|(pos, _)| pos)
    }

    fn consume_at<F>(&mut self, pos: usize, time_of: &F) -> ActorId
    where
        F: Fn(ActorId) -> f64,
    {
        let index = self.next_index;
        self.next_index += 1;

        let entry = &mut self.entries[pos];
        entry.offset += time_of(entry.actor);
        entry.index = index;
        self.elapsed = self.elapsed.max(entry.offset);
        entry.actor
    }

    fn position(&self, actor: ActorId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.actor == actor)
    }

    fn sync_next_index(&mut self) {
        self.next_index = self
            .entries
            .iter()
            .map(|entry| entry.index + 1)
            .max()
            .unwrap_or(0);
    }
}

impl Default for TimelineQueue {
    fn default() -> Self {
        Self::new(BattleConfig::DEFAULT_TIME_EPSILON)
    }
}
