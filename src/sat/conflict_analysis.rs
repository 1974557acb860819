#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
//! Conflict analysis: First-UIP learning and clause minimisation.
//!
//! A conflict at decision level > 0 is resolved backwards along the trail
//! until exactly one literal of the current level remains; that literal is
//! the first unique implication point and takes position 0 of the learnt
//! clause. The clause is then shrunk further using the implication cache
//! and the binary/ternary watch lists, in the manner of self-subsuming
//! resolution.

use crate::sat::assignment::Reason;
use crate::sat::literal::{Lit, Variable};
use crate::sat::propagation::ConflictInfo;
use crate::sat::searcher::Searcher;
use crate::sat::watch::Watcher;
use bit_vec::BitVec;
use itertools::Itertools;
use smallvec::SmallVec;

/// Reusable buffers for conflict analysis, one per worker.
#[derive(Debug, Clone, Default)]
pub struct Analyser {
    /// Variables touched by the current resolution.
    seen: BitVec,
    /// Literal-indexed marks used during further minimisation.
    seen_lits: BitVec,
    /// Variables whose `seen` bit needs clearing afterwards.
    to_clear: Vec<Variable>,
    /// The clause under construction; position 0 is the UIP.
    learnt: Vec<Lit>,
}

impl Analyser {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self {
            seen: BitVec::from_elem(num_vars, false),
            seen_lits: BitVec::from_elem(num_vars * 2, false),
            to_clear: Vec::new(),
            learnt: Vec::new(),
        }
    }

    #[inline]
    fn is_seen(&self, var: Variable) -> bool {
        self.seen.get(var as usize).unwrap_or(false)
    }

    #[inline]
    fn set_seen(&mut self, var: Variable) {
        self.seen.set(var as usize, true);
    }

    #[inline]
    fn unset_seen(&mut self, var: Variable) {
        self.seen.set(var as usize, false);
    }

    fn clear_seen(&mut self) {
        for i in 0..self.to_clear.len() {
            let var = self.to_clear[i];
            self.seen.set(var as usize, false);
        }
        self.to_clear.clear();
    }
}

impl Searcher {
    /// Analyses a conflict into a learnt clause.
    ///
    /// Returns the clause (UIP at position 0, the deepest remaining level
    /// at position 1), the backtrack level and the glue value.
    pub(crate) fn analyse(&mut self, confl: ConflictInfo) -> (Vec<Lit>, usize, u32) {
        let mut an = std::mem::take(&mut self.analyser);
        let current_level = self.decision_level() as u32;
        debug_assert!(current_level > 0);

        an.learnt.clear();
        let mut path_c = 0_u32;

        // Seed the resolution with the conflicting clause.
        match confl {
            ConflictInfo::Binary { p, other } => {
                self.analyse_mark(&mut an, p, current_level, &mut path_c);
                self.analyse_mark(&mut an, other, current_level, &mut path_c);
            }
            ConflictInfo::Ternary { p, a, b } => {
                self.analyse_mark(&mut an, p, current_level, &mut path_c);
                self.analyse_mark(&mut an, a, current_level, &mut path_c);
                self.analyse_mark(&mut an, b, current_level, &mut path_c);
            }
            ConflictInfo::Long { cref } => {
                self.arena.bump_activity(cref, 1.0);
                let lits: SmallVec<[Lit; 32]> = self.arena.lits(cref).iter().copied().collect();
                for q in lits {
                    self.analyse_mark(&mut an, q, current_level, &mut path_c);
                }
            }
        }
        debug_assert!(path_c > 0, "conflict without current-level literals");

        // Resolve backwards along the trail until one current-level
        // literal remains.
        let mut index = self.trail.len();
        let uip = loop {
            loop {
                debug_assert!(index > 0, "ran off the trail during analysis");
                index -= 1;
                if an.is_seen(self.trail[index].variable()) {
                    break;
                }
            }
            let pivot = self.trail[index];
            an.unset_seen(pivot.variable());
            path_c -= 1;
            if path_c == 0 {
                break pivot;
            }

            match self.assignment.reason(pivot.variable()) {
                Reason::None => unreachable!("non-UIP pivot without a reason"),
                Reason::Binary(o) => self.analyse_mark(&mut an, o, current_level, &mut path_c),
                Reason::Ternary(a, b) => {
                    self.analyse_mark(&mut an, a, current_level, &mut path_c);
                    self.analyse_mark(&mut an, b, current_level, &mut path_c);
                }
                Reason::Long { cref, watch_idx } => {
                    self.arena.bump_activity(cref, 1.0);
                    let lits: SmallVec<[Lit; 32]> =
                        self.arena.lits(cref).iter().copied().collect();
                    for (i, q) in lits.into_iter().enumerate() {
                        if i != watch_idx as usize {
                            self.analyse_mark(&mut an, q, current_level, &mut path_c);
                        }
                    }
                }
            }
        };
        an.learnt.insert(0, uip.negated());
        an.clear_seen();

        self.stats.max_literals += an.learnt.len() as u64;

        let glue = self.calc_glue(&an.learnt);
        if self.should_minimise_further(glue, an.learnt.len()) {
            self.minimise_further(&mut an);
        }
        let glue = self.calc_glue(&an.learnt);
        self.stats.tot_literals += an.learnt.len() as u64;

        // The second-deepest level is the backjump target; its literal
        // moves to position 1 so it gets watched.
        let backtrack_level = if an.learnt.len() <= 1 {
            0
        } else {
            let mut max_i = 1;
            for i in 2..an.learnt.len() {
                if self.assignment.level(an.learnt[i].variable())
                    > self.assignment.level(an.learnt[max_i].variable())
                {
                    max_i = i;
                }
            }
            an.learnt.swap(1, max_i);
            self.assignment.level(an.learnt[1].variable()) as usize
        };

        let learnt = an.learnt.clone();
        self.analyser = an;
        (learnt, backtrack_level, glue)
    }

    /// Adds one literal of a resolved clause to the analysis state.
    fn analyse_mark(
        &mut self,
        an: &mut Analyser,
        q: Lit,
        current_level: u32,
        path_c: &mut u32,
    ) {
        let var = q.variable();
        if self.assignment.level(var) == 0 || an.is_seen(var) {
            return;
        }
        debug_assert!(self.val(q).is_false());
        self.heap.bump(var);
        an.set_seen(var);
        an.to_clear.push(var);
        if self.assignment.level(var) >= current_level {
            *path_c += 1;
        } else {
            an.learnt.push(q);
        }
    }

    /// Number of distinct decision levels among the clause literals.
    fn calc_glue(&self, lits: &[Lit]) -> u32 {
        lits.iter()
            .map(|l| self.assignment.level(l.variable()))
            .filter(|&lv| lv > 0)
            .unique()
            .count() as u32
    }

    /// The configurable gate for further minimisation: always when asked
    /// to, otherwise only for clauses better than the running averages.
    fn should_minimise_further(&self, glue: u32, len: usize) -> bool {
        self.conf.do_cache
            && self.conf.do_minim_learnt_more
            && len > 1
            && (self.conf.do_always_f_minim
                || f64::from(glue) < 0.65 * self.glue_hist.avg_all()
                || (len as f64) < 0.65 * self.learnt_size_hist.avg())
    }

    /// Shrinks the learnt clause with the implication cache and with the
    /// binary/ternary watch lists (self-subsuming resolution in place).
    /// Position 0 is never removed.
    fn minimise_further(&mut self, an: &mut Analyser) {
        self.stats.further_minim_attempts += 1;

        for &l in &an.learnt {
            an.seen_lits.set(l.index(), true);
        }

        for idx in 0..an.learnt.len() {
            let lit = an.learnt[idx];
            if !an.seen_lits.get(lit.index()).unwrap_or(false) {
                continue;
            }

            // ¬lit entailing q gives the clause {lit, q}; resolving on q
            // removes ¬q from the learnt clause.
            for &q in self.impl_cache.entails(lit.negated()) {
                an.seen_lits.set(q.negated().index(), false);
            }

            // Clauses containing `lit` allow resolving away the complement
            // of their other literals.
            for w in &self.watches[lit.negated()] {
                match *w {
                    Watcher::Binary { other, .. } => {
                        an.seen_lits.set(other.negated().index(), false);
                    }
                    Watcher::Ternary { a, b } => {
                        if an.seen_lits.get(b.index()).unwrap_or(false) {
                            an.seen_lits.set(a.negated().index(), false);
                        }
                        if an.seen_lits.get(a.index()).unwrap_or(false) {
                            an.seen_lits.set(b.negated().index(), false);
                        }
                    }
                    Watcher::Long { .. } => {}
                }
            }
        }

        an.seen_lits.set(an.learnt[0].index(), true);
        let before = an.learnt.len();
        let mut j = 0;
        for i in 0..an.learnt.len() {
            let l = an.learnt[i];
            if an.seen_lits.get(l.index()).unwrap_or(false) {
                an.learnt[j] = l;
                j += 1;
            }
            an.seen_lits.set(l.index(), false);
        }
        an.learnt.truncate(j);

        let removed = (before - j) as u64;
        self.stats.shrunk_clauses += u64::from(removed > 0);
        self.stats.shrunk_lits += removed;
    }

    /// Expresses a failed assumption in terms of the assumptions that
    /// forced it: the returned literals are assumptions whose conjunction
    /// is unsatisfiable with the formula.
    pub(crate) fn analyse_final(&mut self, failed: Lit) -> Vec<Lit> {
        let mut out = vec![failed];
        if self.decision_level() == 0 {
            return out;
        }

        let mut an = std::mem::take(&mut self.analyser);
        an.set_seen(failed.variable());

        let start = self.trail.level_start(1);
        for i in (start..self.trail.len()).rev() {
            let lit = self.trail[i];
            let var = lit.variable();
            if !an.is_seen(var) {
                continue;
            }
            match self.assignment.reason(var) {
                Reason::None => {
                    debug_assert!(self.assignment.level(var) > 0);
                    out.push(lit);
                }
                Reason::Binary(o) => self.final_mark(&mut an, o),
                Reason::Ternary(a, b) => {
                    self.final_mark(&mut an, a);
                    self.final_mark(&mut an, b);
                }
                Reason::Long { cref, watch_idx } => {
                    let lits: SmallVec<[Lit; 32]> =
                        self.arena.lits(cref).iter().copied().collect();
                    for (k, q) in lits.into_iter().enumerate() {
                        if k != watch_idx as usize {
                            self.final_mark(&mut an, q);
                        }
                    }
                }
            }
            an.unset_seen(var);
        }
        an.unset_seen(failed.variable());

        self.analyser = an;
        out
    }

    fn final_mark(&self, an: &mut Analyser, q: Lit) {
        if self.assignment.level(q.variable()) > 0 {
            an.set_seen(q.variable());
        }
    }
}
