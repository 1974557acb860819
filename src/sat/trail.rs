#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The assignment trail and decision-level bookkeeping.
//!
//! The trail records assigned literals in assignment order. `lim` holds the
//! first trail position of each decision level, so `decision_level()` is
//! `lim.len()`. The propagation queue is the suffix of the trail starting
//! at `head`.

use crate::sat::literal::Lit;
use std::ops::Index;

#[derive(Debug, Clone, Default)]
pub struct Trail {
    trail: Vec<Lit>,
    lim: Vec<usize>,
    head: usize,
}

impl Trail {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            trail: Vec::with_capacity(num_vars),
            lim: Vec::new(),
            head: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trail.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trail.is_empty()
    }

    /// The current decision level.
    #[must_use]
    pub fn decision_level(&self) -> usize {
        self.lim.len()
    }

    /// First trail position of the given level's assignments.
    ///
    /// # Panics
    ///
    /// Panics if `level` is zero or exceeds the current decision level.
    #[must_use]
    pub fn level_start(&self, level: usize) -> usize {
        self.lim[level - 1]
    }

    /// Opens a new decision level at the current trail size.
    pub fn new_decision_level(&mut self) {
        self.lim.push(self.trail.len());
    }

    /// Appends an assigned literal.
    pub fn push(&mut self, lit: Lit) {
        self.trail.push(lit);
    }

    /// Pops the next literal of the propagation queue, advancing `head`.
    pub fn next_to_propagate(&mut self) -> Option<Lit> {
        if self.head < self.trail.len() {
            let lit = self.trail[self.head];
            self.head += 1;
            Some(lit)
        } else {
            None
        }
    }

    /// `true` when the propagation queue is drained.
    #[must_use]
    pub fn quiescent(&self) -> bool {
        self.head == self.trail.len()
    }

    /// Skips the remainder of the propagation queue (used on conflict).
    pub fn drain_queue(&mut self) {
        self.head = self.trail.len();
    }

    /// Truncates the trail back to the start of `level + 1`, resetting the
    /// propagation queue head there. The caller unassigns the removed
    /// variables itself.
    pub fn cancel_to(&mut self, level: usize) {
        debug_assert!(level < self.decision_level());
        let new_len = self.lim[level];
        self.trail.truncate(new_len);
        self.lim.truncate(level);
        self.head = new_len;
    }

    /// The literals at and above `from`, newest last.
    #[must_use]
    pub fn since(&self, from: usize) -> &[Lit] {
        &self.trail[from..]
    }
}

impl Index<usize> for Trail {
    type Output = Lit;

    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.trail[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(d: i32) -> Lit {
        Lit::from_dimacs(d)
    }

    #[test]
    fn test_levels_and_cancel() {
        let mut t = Trail::new(4);
        t.push(lit(1));
        t.new_decision_level();
        t.push(lit(2));
        t.push(lit(3));
        t.new_decision_level();
        t.push(lit(-4));

        assert_eq!(t.decision_level(), 2);
        assert_eq!(t.level_start(1), 1);
        assert_eq!(t.level_start(2), 3);
        assert_eq!(t.len(), 4);

        t.cancel_to(1);
        assert_eq!(t.decision_level(), 1);
        assert_eq!(t.len(), 3);
        assert_eq!(t[2], lit(3));

        t.cancel_to(0);
        assert_eq!(t.decision_level(), 0);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_propagation_queue_is_fifo() {
        let mut t = Trail::new(3);
        t.push(lit(1));
        t.push(lit(2));
        assert_eq!(t.next_to_propagate(), Some(lit(1)));
        t.push(lit(3));
        assert_eq!(t.next_to_propagate(), Some(lit(2)));
        assert_eq!(t.next_to_propagate(), Some(lit(3)));
        assert_eq!(t.next_to_propagate(), None);
        assert!(t.quiescent());
    }

    #[test]
    fn test_cancel_resets_head() {
        let mut t = Trail::new(3);
        t.push(lit(1));
        t.new_decision_level();
        t.push(lit(2));
        while t.next_to_propagate().is_some() {}
        t.cancel_to(0);
        assert!(t.quiescent());
        assert_eq!(t.len(), 1);
    }
}
