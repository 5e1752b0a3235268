//! Deterministic timer queue.
//!
//! Timers are `(fire time, insertion sequence)` keys in a min-heap. Ties
//! fire in insertion order. Cancelling only forgets the id; stale heap
//! entries are skipped when they reach the front.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Handle of a scheduled timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

/// Min-heap of tagged timers
#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    heap: BinaryHeap<Reverse<(u64, u64)>>,
    pending: HashMap<u64, T>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Fire `tag` at time `at`
    pub fn schedule(&mut self, at: u64, tag: T) -> TimerId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse((at, seq)));
        self.pending.insert(seq, tag);
        TimerId(seq)
    }

    /// Cancel a timer; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.pending.remove(&id.0).is_some()
    }

    /// Cancel every pending timer
    pub fn cancel_all(&mut self) {
        self.pending.clear();
        self.heap.clear();
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id.0)
    }

    /// Fire time of the earliest pending timer
    pub fn next_at(&mut self) -> Option<u64> {
        while let Some(&Reverse((at, seq))) = self.heap.peek() {
            if self.pending.contains_key(&seq) {
                return Some(at);
            }
            self.heap.pop();
        }
        None
    }

    /// Remove and return the earliest timer due at or before `now`
    pub fn pop_due(&mut self, now: u64) -> Option<(u64, T)> {
        while let Some(&Reverse((at, seq))) = self.heap.peek() {
            if at > now {
                return None;
            }
            self.heap.pop();
            if let Some(tag) = self.pending.remove(&seq) {
                return Some((at, tag));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_time_order() {
        let mut s = Scheduler::new();
        s.schedule(30, "c");
        s.schedule(10, "a");
        s.schedule(20, "b");
        assert_eq!(s.next_at(), Some(10));
        assert_eq!(s.pop_due(100), Some((10, "a")));
        assert_eq!(s.pop_due(100), Some((20, "b")));
        assert_eq!(s.pop_due(100), Some((30, "c")));
        assert_eq!(s.pop_due(100), None);
    }

    #[test]
    fn test_ties_fire_in_insertion_order() {
        let mut s = Scheduler::new();
        s.schedule(5, 1);
        s.schedule(5, 2);
        s.schedule(5, 3);
        let fired: Vec<_> = std::iter::from_fn(|| s.pop_due(5)).map(|(_, t)| t).collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_not_due_yet() {
        let mut s = Scheduler::new();
        s.schedule(50, ());
        assert_eq!(s.pop_due(49), None);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_cancelled_timers_never_fire() {
        let mut s = Scheduler::new();
        let a = s.schedule(10, "a");
        s.schedule(20, "b");
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert!(!s.is_pending(a));
        assert_eq!(s.next_at(), Some(20));
        assert_eq!(s.pop_due(100), Some((20, "b")));
        assert!(s.is_empty());
    }

    #[test]
    fn test_cancel_all() {
        let mut s = Scheduler::new();
        s.schedule(1, 'x');
        s.schedule(2, 'y');
        s.cancel_all();
        assert_eq!(s.next_at(), None);
        assert_eq!(s.pop_due(u64::MAX), None);
    }
}
