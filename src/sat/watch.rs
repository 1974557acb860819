#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Watch lists for binary, ternary and long clauses.
//!
//! For each literal `p`, `WatchLists` holds the entries of clauses that
//! contain `¬p`: when `p` becomes true those clauses may propagate or
//! conflict. Binary and ternary clauses live entirely inside their watch
//! entries; long clauses are referenced by arena offset together with a
//! blocker literal that short-circuits inspection when already true.

use crate::sat::clause_arena::ClauseRef;
use crate::sat::literal::Lit;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

/// One entry in a watch list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watcher {
    /// A binary clause; `other` is the remaining literal.
    Binary { other: Lit, learnt: bool },
    /// A ternary clause; `a` and `b` are the two remaining literals.
    Ternary { a: Lit, b: Lit },
    /// A long clause in the arena with its cached blocker.
    Long { cref: ClauseRef, blocker: Lit },
}

/// All watch lists, indexed by the literal that just became true.
#[derive(Debug, Clone, Default)]
pub struct WatchLists(Vec<SmallVec<[Watcher; 4]>>);

impl WatchLists {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![SmallVec::new(); num_vars * 2])
    }

    /// Attaches a binary clause `{a, b}`.
    pub fn attach_binary(&mut self, a: Lit, b: Lit, learnt: bool) {
        debug_assert_ne!(a.variable(), b.variable());
        self[a.negated()].push(Watcher::Binary { other: b, learnt });
        self[b.negated()].push(Watcher::Binary { other: a, learnt });
    }

    /// Attaches a ternary clause `{a, b, c}`; all three literals watch.
    pub fn attach_ternary(&mut self, a: Lit, b: Lit, c: Lit) {
        self[a.negated()].push(Watcher::Ternary { a: b, b: c });
        self[b.negated()].push(Watcher::Ternary { a, b: c });
        self[c.negated()].push(Watcher::Ternary { a, b });
    }

    /// Attaches a long clause watching its first two literals.
    pub fn attach_long(&mut self, cref: ClauseRef, l0: Lit, l1: Lit) {
        debug_assert_ne!(l0, l1);
        self[l0.negated()].push(Watcher::Long { cref, blocker: l1 });
        self[l1.negated()].push(Watcher::Long { cref, blocker: l0 });
    }

    /// Removes the two watch entries of a long clause. `l0` and `l1` must
    /// be its currently watched literals.
    pub fn detach_long(&mut self, cref: ClauseRef, l0: Lit, l1: Lit) {
        for lit in [l0, l1] {
            let ws = &mut self[lit.negated()];
            let pos = ws
                .iter()
                .position(|w| matches!(w, Watcher::Long { cref: c, .. } if *c == cref))
                .expect("watch entry missing for attached clause");
            // Ordering within the list is part of the determinism contract,
            // so shift instead of swap_remove.
            ws.remove(pos);
        }
    }

    /// Total number of watch entries, for the memory statistic.
    #[must_use]
    pub fn num_entries(&self) -> usize {
        self.0.iter().map(SmallVec::len).sum()
    }
}

impl Index<Lit> for WatchLists {
    type Output = SmallVec<[Watcher; 4]>;

    #[inline]
    fn index(&self, lit: Lit) -> &Self::Output {
        &self.0[lit.index()]
    }
}

impl IndexMut<Lit> for WatchLists {
    #[inline]
    fn index_mut(&mut self, lit: Lit) -> &mut Self::Output {
        &mut self.0[lit.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(d: i32) -> Lit {
        Lit::from_dimacs(d)
    }

    #[test]
    fn test_attach_binary_both_sides() {
        let mut w = WatchLists::new(3);
        w.attach_binary(lit(1), lit(-2), false);

        assert_eq!(
            w[lit(-1)].as_slice(),
            &[Watcher::Binary {
                other: lit(-2),
                learnt: false
            }]
        );
        assert_eq!(
            w[lit(2)].as_slice(),
            &[Watcher::Binary {
                other: lit(1),
                learnt: false
            }]
        );
        assert!(w[lit(1)].is_empty());
    }

    #[test]
    fn test_attach_ternary_all_three() {
        let mut w = WatchLists::new(3);
        w.attach_ternary(lit(1), lit(2), lit(3));
        assert_eq!(w[lit(-1)].len(), 1);
        assert_eq!(w[lit(-2)].len(), 1);
        assert_eq!(w[lit(-3)].len(), 1);
        assert_eq!(w.num_entries(), 3);
    }

    #[test]
    fn test_attach_detach_long_preserves_order() {
        let mut w = WatchLists::new(4);
        let c1 = ClauseRef::default();
        w.attach_binary(lit(1), lit(2), false);
        w.attach_long(c1, lit(1), lit(3));

        assert_eq!(w[lit(-1)].len(), 2);
        w.detach_long(c1, lit(1), lit(3));
        assert_eq!(w[lit(-1)].len(), 1);
        assert!(matches!(w[lit(-1)][0], Watcher::Binary { .. }));
        assert!(w[lit(-3)].is_empty());
    }
}
