#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The input formula and per-variable flags.
//!
//! A [`Cnf`] is a conjunction of clauses over variables `0..num_vars`.
//! Clauses are deduplicated and tautologies dropped at construction; empty
//! clauses are kept so the solver can report UNSAT for them.

use crate::sat::literal::{Lit, Variable};
use bit_vec::BitVec;
use itertools::Itertools;

#[derive(Debug, Clone, Default)]
pub struct Cnf {
    pub num_vars: usize,
    pub clauses: Vec<Vec<Lit>>,
}

impl Cnf {
    /// Builds a formula from DIMACS-style integer clauses.
    ///
    /// `num_vars` is at least the declared count (pass 0 when unknown) and
    /// grows to cover every variable that actually occurs.
    #[must_use]
    pub fn new<J, I>(clauses_dimacs: I, declared_vars: usize) -> Self
    where
        J: IntoIterator<Item = i32>,
        I: IntoIterator<Item = J>,
    {
        let mut num_vars = declared_vars;
        let mut clauses = Vec::new();

        for clause_dimacs in clauses_dimacs {
            let lits: Vec<Lit> = clause_dimacs
                .into_iter()
                .map(Lit::from_dimacs)
                .unique()
                .collect();

            if lits
                .iter()
                .any(|&l| lits.contains(&l.negated()))
            {
                continue;
            }

            for &l in &lits {
                num_vars = num_vars.max(l.variable() as usize + 1);
            }
            clauses.push(lits);
        }

        Self { num_vars, clauses }
    }

    /// Adds one clause, growing `num_vars` as needed. No tautology or
    /// duplicate filtering; callers adding raw literals do that themselves.
    pub fn add_clause(&mut self, lits: Vec<Lit>) {
        for &l in &lits {
            self.num_vars = self.num_vars.max(l.variable() as usize + 1);
        }
        self.clauses.push(lits);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// Checks a total assignment against every clause.
    #[must_use]
    pub fn verify(&self, model: &[bool]) -> bool {
        self.clauses.iter().all(|clause| {
            clause
                .iter()
                .any(|l| model[l.variable() as usize] == l.polarity())
        })
    }
}

/// Per-variable status supplied by the simplification collaborators.
#[derive(Debug, Clone)]
pub struct VarFlags {
    decision: BitVec,
    elimed: BitVec,
}

impl VarFlags {
    /// Every variable a decision variable, none eliminated; the state when
    /// no preprocessing ran.
    #[must_use]
    pub fn all_decision(num_vars: usize) -> Self {
        Self {
            decision: BitVec::from_elem(num_vars, true),
            elimed: BitVec::from_elem(num_vars, false),
        }
    }

    #[must_use]
    pub fn is_decision(&self, var: Variable) -> bool {
        self.decision.get(var as usize).unwrap_or(false) && !self.is_elimed(var)
    }

    #[must_use]
    pub fn is_elimed(&self, var: Variable) -> bool {
        self.elimed.get(var as usize).unwrap_or(false)
    }

    pub fn set_decision(&mut self, var: Variable, dvar: bool) {
        self.decision.set(var as usize, dvar);
    }

    pub fn set_elimed(&mut self, var: Variable) {
        self.elimed.set(var as usize, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_drops_tautologies_and_duplicates() {
        let cnf = Cnf::new(vec![vec![1, -1], vec![2, 2, 3]], 0);
        assert_eq!(cnf.len(), 1);
        assert_eq!(cnf.clauses[0].len(), 2);
        assert_eq!(cnf.num_vars, 3);
    }

    #[test]
    fn test_empty_clause_is_kept() {
        let cnf = Cnf::new(vec![Vec::<i32>::new()], 2);
        assert_eq!(cnf.len(), 1);
        assert!(cnf.clauses[0].is_empty());
        assert_eq!(cnf.num_vars, 2);
    }

    #[test]
    fn test_verify() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 3]], 0);
        assert!(cnf.verify(&[true, false, true]));
        assert!(!cnf.verify(&[true, true, false]));
        assert!(cnf.verify(&[false, true, false]));
    }

    #[test]
    fn test_var_flags() {
        let mut flags = VarFlags::all_decision(3);
        assert!(flags.is_decision(1));
        flags.set_decision(1, false);
        assert!(!flags.is_decision(1));
        flags.set_elimed(2);
        assert!(!flags.is_decision(2));
        assert!(flags.is_elimed(2));
    }
}
