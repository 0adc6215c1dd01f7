//! Linear undo/redo over immutable snapshots.
//!
//! `History` keeps three things: the snapshots before the present (`past`,
//! oldest first), the present itself, and the snapshots undone from it
//! (`future`, most recently undone first). Snapshots are moved in and out,
//! never modified, so a value handed to [`History::commit`] is exactly what
//! [`History::undo`] later brings back.
//!
//! `past` is capped; once full, each commit drops the oldest snapshot.

use std::collections::VecDeque;
use std::mem;

use crate::constants::MAX_HISTORY;

/// Past/present/future snapshot stack.
#[derive(Debug, Clone)]
pub struct History<S> {
    past: VecDeque<S>,
    present: S,
    future: VecDeque<S>,
    limit: usize,
}

impl<S> History<S> {
    /// Start a history at `initial` with the default cap.
    pub fn new(initial: S) -> Self {
        Self::with_limit(initial, MAX_HISTORY)
    }

    /// Start a history at `initial`, keeping at most `limit` undo steps.
    pub fn with_limit(initial: S, limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            present: initial,
            future: VecDeque::new(),
            limit,
        }
    }

    pub fn present(&self) -> &S {
        &self.present
    }

    /// Snapshots before the present, oldest first.
    pub fn past(&self) -> impl ExactSizeIterator<Item = &S> + DoubleEndedIterator {
        self.past.iter()
    }

    /// Undone snapshots, the next redo first.
    pub fn future(&self) -> impl ExactSizeIterator<Item = &S> + DoubleEndedIterator {
        self.future.iter()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Make `next` the present. The old present becomes the newest undo
    /// step and everything that could have been redone is discarded.
    pub fn commit(&mut self, next: S) {
        let previous = mem::replace(&mut self.present, next);
        self.past.push_back(previous);
        self.evict();
        self.future.clear();
    }

    /// Step back one snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(previous) = self.past.pop_back() else {
            return false;
        };
        let current = mem::replace(&mut self.present, previous);
        self.future.push_front(current);
        true
    }

    /// Step forward one snapshot. Returns false when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(next) = self.future.pop_front() else {
            return false;
        };
        let current = mem::replace(&mut self.present, next);
        self.past.push_back(current);
        self.evict();
        true
    }

    /// Throw away all undo and redo steps and start over at `state`.
    pub fn reset(&mut self, state: S) {
        self.past.clear();
        self.future.clear();
        self.present = state;
    }

    fn evict(&mut self) {
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history_of(states: &[i32]) -> History<i32> {
        let mut h = History::new(states[0]);
        for s in &states[1..] {
            h.commit(*s);
        }
        h
    }

    #[test]
    fn test_initial_state() {
        let h = History::new("a");
        assert_eq!(*h.present(), "a");
        assert!(!h.can_undo());
        assert!(!h.can_redo());
        assert_eq!(h.limit(), MAX_HISTORY);
    }

    #[test]
    fn test_linear_undo_redo() {
        let mut h = history_of(&[0, 1, 2, 3]);
        assert_eq!(*h.present(), 3);

        assert!(h.undo());
        assert!(h.undo());
        assert_eq!(*h.present(), 1);
        assert_eq!(h.future().copied().collect::<Vec<_>>(), vec![2, 3]);

        assert!(h.redo());
        assert!(h.redo());
        assert_eq!(*h.present(), 3);
        assert!(!h.can_redo());
        assert_eq!(h.past().copied().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_commit_clears_redo() {
        let mut h = history_of(&[0, 1, 2]);
        h.undo();
        assert!(h.can_redo());

        h.commit(9);
        assert!(!h.can_redo());
        assert_eq!(h.past().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(*h.present(), 9);
    }

    #[test]
    fn test_undo_redo_on_empty_are_noops() {
        let mut h = History::new(7);
        assert!(!h.undo());
        assert!(!h.redo());
        assert_eq!(*h.present(), 7);
    }

    #[test]
    fn test_cap_evicts_oldest() {
        let extra = 5;
        let mut h = History::new(0usize);
        for i in 1..=MAX_HISTORY + extra {
            h.commit(i);
        }
        assert_eq!(h.past().len(), MAX_HISTORY);
        // Snapshots 0..extra were evicted
        assert_eq!(h.past().next().copied(), Some(extra));

        for _ in 0..MAX_HISTORY {
            assert!(h.undo());
        }
        assert!(!h.can_undo());
        assert_eq!(*h.present(), extra);
    }

    #[test]
    fn test_custom_limit() {
        let mut h = History::with_limit(0, 2);
        h.commit(1);
        h.commit(2);
        h.commit(3);
        assert_eq!(h.past().copied().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_zero_limit_disables_undo() {
        let mut h = History::with_limit(0, 0);
        h.commit(1);
        assert!(!h.can_undo());
        assert_eq!(*h.present(), 1);
    }

    #[test]
    fn test_reset() {
        let mut h = history_of(&[0, 1, 2]);
        h.undo();
        h.reset(42);
        assert_eq!(*h.present(), 42);
        assert!(!h.can_undo());
        assert!(!h.can_redo());
    }
}
