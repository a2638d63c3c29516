//! Deadline-ordered queue of pending removals.

use std::collections::{BTreeMap, HashMap};
use tokio::time::Instant;

use targetsync_types::Target;

/// Position of an entry: its deadline plus an insertion sequence number so
/// equal deadlines keep FIFO order.
type Slot = (Instant, u64);

/// Pending removals ordered by ascending deadline, indexed by identity key.
///
/// Holds at most one entry per target key.
#[derive(Debug, Default)]
pub(crate) struct RemovalQueue {
    by_deadline: BTreeMap<Slot, Target>,
    index: HashMap<String, Slot>,
    next_seq: u64,
}

impl RemovalQueue {
    /// Insert `target` unless it is already pending. Returns `true` if inserted.
    pub fn schedule(&mut self, target: Target, deadline: Instant) -> bool {
        let key = target.key();
        if self.index.contains_key(&key) {
            return false;
        }
        let slot = (deadline, self.next_seq);
        self.next_seq = self.next_seq.wrapping_add(1);
        self.index.insert(key, slot);
        self.by_deadline.insert(slot, target);
        true
    }

    /// Drop the pending entry for `key`, returning the target and its deadline.
    pub fn cancel(&mut self, key: &str) -> Option<(Target, Instant)> {
        let slot = self.index.remove(key)?;
        self.by_deadline.remove(&slot).map(|target| (target, slot.0))
    }

    /// Earliest entry without removing it.
    pub fn peek(&self) -> Option<(&Target, Instant)> {
        self.by_deadline.first_key_value().map(|(slot, target)| (target, slot.0))
    }

    /// Remove and return the earliest entry.
    pub fn pop(&mut self) -> Option<(Target, Instant)> {
        let ((deadline, _), target) = self.by_deadline.pop_first()?;
        self.index.remove(&target.key());
        Some((target, deadline))
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.peek().map(|(_, deadline)| deadline)
    }

    pub fn is_head(&self, key: &str) -> bool {
        self.peek().is_some_and(|(target, _)| target.key() == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
