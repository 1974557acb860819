#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Read-only implication data supplied by out-of-search preprocessing.
//!
//! The implication cache records, for each literal, literals known to be
//! entailed by it; conflict analysis uses it to shrink learnt clauses. The
//! reachability table records, for each literal, an optional dominating
//! literal that branching may prefer. Both are read-only during search and
//! default to empty when no preprocessing ran.

use crate::sat::literal::Lit;

/// Per-literal entailed literal sets.
#[derive(Debug, Clone, Default)]
pub struct ImplicationCache {
    entries: Vec<Vec<Lit>>,
}

impl ImplicationCache {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            entries: vec![Vec::new(); num_vars * 2],
        }
    }

    /// The literals entailed by `lit`.
    #[must_use]
    pub fn entails(&self, lit: Lit) -> &[Lit] {
        self.entries
            .get(lit.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Records that `lit` entails each of `entailed`. Builder-side API for
    /// the preprocessing collaborator.
    pub fn add(&mut self, lit: Lit, entailed: impl IntoIterator<Item = Lit>) {
        self.entries[lit.index()].extend(entailed);
    }
}

/// Per-literal dominating literals.
#[derive(Debug, Clone, Default)]
pub struct LitReachable {
    dominator: Vec<Option<Lit>>,
}

impl LitReachable {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            dominator: vec![None; num_vars * 2],
        }
    }

    /// A literal recorded as dominating `lit`, if any.
    #[must_use]
    pub fn dominator(&self, lit: Lit) -> Option<Lit> {
        self.dominator.get(lit.index()).copied().flatten()
    }

    /// Records a dominator. Builder-side API for the preprocessing
    /// collaborator.
    pub fn set_dominator(&mut self, lit: Lit, dom: Lit) {
        self.dominator[lit.index()] = Some(dom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(d: i32) -> Lit {
        Lit::from_dimacs(d)
    }

    #[test]
    fn test_cache_lookup() {
        let mut c = ImplicationCache::new(3);
        c.add(lit(1), [lit(2), lit(-3)]);
        assert_eq!(c.entails(lit(1)), &[lit(2), lit(-3)]);
        assert!(c.entails(lit(-1)).is_empty());
    }

    #[test]
    fn test_reachability_lookup() {
        let mut r = LitReachable::new(3);
        assert_eq!(r.dominator(lit(2)), None);
        r.set_dominator(lit(2), lit(-1));
        assert_eq!(r.dominator(lit(2)), Some(lit(-1)));
    }
}
