#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Two-watched-literal unit propagation.
//!
//! `propagate` drains the propagation queue, assigning implied literals
//! until the queue empties or a clause is falsified. For each literal `p`
//! popped from the queue the watch list of `p` is scanned in order; the
//! order in which simultaneously implied literals are discovered is fixed
//! by the watch-list and trail orders, which makes a worker's propagation
//! deterministic.

use crate::sat::assignment::{Reason, Value};
use crate::sat::clause_arena::ClauseRef;
use crate::sat::literal::Lit;
use crate::sat::searcher::Searcher;
use crate::sat::watch::Watcher;

/// The outcome of one propagation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropResult {
    NoConflict,
    Conflict(ConflictInfo),
}

/// A falsified clause, in the shape conflict analysis consumes. `p` is the
/// watched literal whose falsification exposed the conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictInfo {
    Binary { p: Lit, other: Lit },
    Ternary { p: Lit, a: Lit, b: Lit },
    Long { cref: ClauseRef },
}

impl Searcher {
    /// Drains the propagation queue. On conflict the rest of the queue is
    /// skipped; the caller backtracks before propagating again.
    pub(crate) fn propagate(&mut self) -> PropResult {
        while let Some(p) = self.trail.next_to_propagate() {
            self.stats.propagations += 1;
            if let Some(confl) = self.propagate_lit(p) {
                self.trail.drain_queue();
                return PropResult::Conflict(confl);
            }
        }
        PropResult::NoConflict
    }

    /// Scans the watch list of the just-made-true literal `p`. Every entry
    /// refers to a clause containing `¬p`.
    fn propagate_lit(&mut self, p: Lit) -> Option<ConflictInfo> {
        let false_lit = p.negated();
        let mut confl = None;

        let mut i = 0;
        let mut j = 0;
        'scan: while i < self.watches[p].len() {
            let w = self.watches[p][i];
            i += 1;

            match w {
                Watcher::Binary { other, .. } => match self.val(other) {
                    Value::True => {
                        self.watches[p][j] = w;
                        j += 1;
                    }
                    Value::Undef => {
                        self.enqueue(other, Reason::Binary(false_lit));
                        self.watches[p][j] = w;
                        j += 1;
                    }
                    Value::False => {
                        confl = Some(ConflictInfo::Binary {
                            p: false_lit,
                            other,
                        });
                        self.watches[p][j] = w;
                        j += 1;
                        break 'scan;
                    }
                },

                Watcher::Ternary { a, b } => {
                    let (va, vb) = (self.val(a), self.val(b));
                    if va.is_true() || vb.is_true() || (va.is_undef() && vb.is_undef()) {
                        // Satisfied or still two non-false literals.
                    } else if va.is_undef() {
                        self.enqueue(a, Reason::Ternary(false_lit, b));
                    } else if vb.is_undef() {
                        self.enqueue(b, Reason::Ternary(false_lit, a));
                    } else {
                        confl = Some(ConflictInfo::Ternary {
                            p: false_lit,
                            a,
                            b,
                        });
                        self.watches[p][j] = w;
                        j += 1;
                        break 'scan;
                    }
                    self.watches[p][j] = w;
                    j += 1;
                }

                Watcher::Long { cref, blocker } => {
                    // Likely-true blocker short-circuits the clause load.
                    if self.val(blocker).is_true() {
                        self.watches[p][j] = w;
                        j += 1;
                        continue;
                    }

                    // Put the falsified watched literal at position 1.
                    {
                        let lits = self.arena.lits_mut(cref);
                        if lits[0] == false_lit {
                            lits.swap(0, 1);
                        }
                        debug_assert_eq!(lits[1], false_lit);
                    }
                    let first = self.arena.lits(cref)[0];
                    if self.val(first).is_true() {
                        self.watches[p][j] = Watcher::Long {
                            cref,
                            blocker: first,
                        };
                        j += 1;
                        continue;
                    }

                    if let Some(k) = self.find_replacement_watch(cref) {
                        let new_watch = {
                            let lits = self.arena.lits_mut(cref);
                            lits.swap(1, k);
                            lits[1]
                        };
                        self.watches[new_watch.negated()].push(Watcher::Long {
                            cref,
                            blocker: first,
                        });
                        // Entry moved to the new literal's list; drop it here.
                        continue;
                    }

                    // No replacement: unit or conflict on position 0.
                    if self.val(first).is_undef() {
                        self.enqueue(
                            first,
                            Reason::Long {
                                cref,
                                watch_idx: 0,
                            },
                        );
                        self.watches[p][j] = w;
                        j += 1;
                    } else {
                        confl = Some(ConflictInfo::Long { cref });
                        self.watches[p][j] = w;
                        j += 1;
                        break 'scan;
                    }
                }
            }
        }

        // Preserve any entries not reached before an early break.
        while i < self.watches[p].len() {
            let w = self.watches[p][i];
            self.watches[p][j] = w;
            i += 1;
            j += 1;
        }
        self.watches[p].truncate(j);

        confl
    }

    /// Searches positions `2..` for a non-false literal to watch. Literals
    /// found false at level 0 are swapped out and the clause length
    /// decremented on the fly.
    fn find_replacement_watch(&mut self, cref: ClauseRef) -> Option<usize> {
        let mut k = 2;
        while k < self.arena.len(cref) {
            let l = self.arena.lits(cref)[k];
            if self.val(l).is_false() {
                if self.assignment.level(l.variable()) == 0 && self.arena.len(cref) > 3 {
                    let last = self.arena.len(cref) - 1;
                    self.arena.lits_mut(cref).swap(k, last);
                    self.arena.shrink_by_one(cref);
                    self.stats.watch_shrunk_lits += 1;
                    // Re-examine position k, now holding the last literal.
                    continue;
                }
                k += 1;
            } else {
                return Some(k);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;
    use crate::sat::config::SolverConf;
    use crate::sat::searcher::Searcher;

    fn lit(d: i32) -> Lit {
        Lit::from_dimacs(d)
    }

    fn searcher(clauses: Vec<Vec<i32>>, num_vars: usize) -> Searcher {
        let cnf = Cnf::new(clauses, num_vars);
        Searcher::single(&cnf, SolverConf::default())
    }

    fn decide(s: &mut Searcher, l: Lit) {
        s.trail.new_decision_level();
        s.enqueue(l, Reason::None);
    }

    #[test]
    fn test_binary_chain_propagates_in_order() {
        let mut s = searcher(vec![vec![-1, 2], vec![-2, 3]], 4);
        decide(&mut s, lit(1));
        assert_eq!(s.propagate(), PropResult::NoConflict);

        assert!(s.val(lit(2)).is_true());
        assert!(s.val(lit(3)).is_true());
        assert_eq!(s.assignment.reason(1), Reason::Binary(lit(-1)));
        assert_eq!(s.assignment.reason(2), Reason::Binary(lit(-2)));
    }

    #[test]
    fn test_binary_conflict() {
        let mut s = searcher(vec![vec![-1, 2], vec![-1, -2]], 3);
        decide(&mut s, lit(1));
        let res = s.propagate();
        assert!(matches!(res, PropResult::Conflict(ConflictInfo::Binary { .. })));
    }

    #[test]
    fn test_ternary_propagation_and_reason() {
        let mut s = searcher(vec![vec![-1, -2, 3]], 4);
        decide(&mut s, lit(1));
        assert_eq!(s.propagate(), PropResult::NoConflict);
        assert!(s.val(lit(3)).is_undef());

        decide(&mut s, lit(2));
        assert_eq!(s.propagate(), PropResult::NoConflict);
        assert!(s.val(lit(3)).is_true());
        assert!(matches!(s.assignment.reason(2), Reason::Ternary(..)));
    }

    #[test]
    fn test_long_clause_moves_watch_before_propagating() {
        let mut s = searcher(vec![vec![-1, -2, -3, 4]], 5);
        decide(&mut s, lit(1));
        assert_eq!(s.propagate(), PropResult::NoConflict);
        assert!(s.val(lit(4)).is_undef());

        decide(&mut s, lit(2));
        assert_eq!(s.propagate(), PropResult::NoConflict);
        decide(&mut s, lit(3));
        assert_eq!(s.propagate(), PropResult::NoConflict);
        assert!(s.val(lit(4)).is_true());
        assert!(matches!(s.assignment.reason(3), Reason::Long { .. }));
    }

    #[test]
    fn test_long_clause_conflict() {
        // Two long clauses force 4 both ways once 1..3 hold.
        let mut s = searcher(vec![vec![-1, -2, -3, 4], vec![-1, -2, -3, -4]], 5);
        decide(&mut s, lit(1));
        assert_eq!(s.propagate(), PropResult::NoConflict);
        decide(&mut s, lit(2));
        assert_eq!(s.propagate(), PropResult::NoConflict);
        decide(&mut s, lit(3));
        assert!(matches!(
            s.propagate(),
            PropResult::Conflict(ConflictInfo::Long { .. })
        ));
    }

    #[test]
    fn test_reason_positions_match_watch_invariant() {
        // After propagation, a long reason clause has the implied literal
        // at position 0 and only false literals elsewhere.
        let mut s = searcher(vec![vec![-1, -2, 3, 4], vec![-4]], 5);
        assert_eq!(s.propagate(), PropResult::NoConflict);
        decide(&mut s, lit(1));
        assert_eq!(s.propagate(), PropResult::NoConflict);
        decide(&mut s, lit(2));
        assert_eq!(s.propagate(), PropResult::NoConflict);

        assert!(s.val(lit(3)).is_true());
        let Reason::Long { cref, watch_idx } = s.assignment.reason(2) else {
            panic!("expected a long reason");
        };
        assert_eq!(watch_idx, 0);
        let lits = s.arena.lits(cref);
        assert_eq!(lits[0], lit(3));
        assert!(lits[1..].iter().all(|&l| s.val(l).is_false()));
    }
}
