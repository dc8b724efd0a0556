//! Time-ordered maturity queue.
//!
//! Entries are keyed by `(completion_time, seq)` where `seq` is a per-queue
//! monotonic counter, so iteration and maturity sweeps always run in ascending
//! completion time and, within one instant, in creation order. Map iteration
//! order never leaks into state transitions.

use scloud_types::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of an entry in a [`TimeQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QueueKey {
    pub completion_time: Timestamp,
    pub seq: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeQueue<T> {
    next_seq: u64,
    entries: BTreeMap<QueueKey, T>,
}

impl<T> TimeQueue<T> {
    pub fn new() -> Self {
        Self {
            next_seq: 0,
            entries: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, completion_time: Timestamp, item: T) -> QueueKey {
        let key = QueueKey {
            completion_time,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.insert(key, item);
        key
    }

    /// Key of the earliest entry with `completion_time <= now`.
    pub fn next_matured(&self, now: Timestamp) -> Option<QueueKey> {
        self.entries
            .keys()
            .next()
            .filter(|k| k.completion_time <= now)
            .copied()
    }

    /// Remove and return every entry with `completion_time <= now`, in order.
    pub fn pop_matured(&mut self, now: Timestamp) -> Vec<(QueueKey, T)> {
        let mut matured = Vec::new();
        while let Some(key) = self.next_matured(now) {
            if let Some(item) = self.entries.remove(&key) {
                matured.push((key, item));
            }
        }
        matured
    }

    pub fn get(&self, key: &QueueKey) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &QueueKey) -> Option<&mut T> {
        self.entries.get_mut(key)
    }

    pub fn remove(&mut self, key: &QueueKey) -> Option<T> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&QueueKey, &T)> {
        self.entries.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&QueueKey, &mut T)> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for TimeQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_then_creation_order() {
        let mut q = TimeQueue::new();
        q.push(Timestamp::new(20), "late");
        q.push(Timestamp::new(10), "first");
        q.push(Timestamp::new(10), "second");
        q.push(Timestamp::new(30), "future");

        let matured: Vec<_> = q
            .pop_matured(Timestamp::new(20))
            .into_iter()
            .map(|(_, v)| v)
            .collect();
        assert_eq!(matured, vec!["first", "second", "late"]);
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn second_sweep_finds_nothing() {
        let mut q = TimeQueue::new();
        q.push(Timestamp::new(5), 1u32);
        assert_eq!(q.pop_matured(Timestamp::new(5)).len(), 1);
        assert!(q.pop_matured(Timestamp::new(100)).is_empty());
    }

    #[test]
    fn remove_by_key() {
        let mut q = TimeQueue::new();
        let key = q.push(Timestamp::new(5), 'a');
        assert_eq!(q.get(&key), Some(&'a'));
        assert_eq!(q.remove(&key), Some('a'));
        assert!(q.is_empty());
        assert!(q.next_matured(Timestamp::new(10)).is_none());
    }
}
