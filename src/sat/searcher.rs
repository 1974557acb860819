#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
//! The per-worker CDCL search engine.
//!
//! One `Searcher` owns a complete copy of the search state: assignment,
//! trail, watch lists, clause arena, branching heap and heuristics. The
//! driver alternates propagation and decisions; each conflict is analysed
//! into a learnt clause which is attached locally and published to the
//! peers, and peer clauses are drained and integrated at conflict
//! boundaries. With a single worker and a fixed seed the search is fully
//! deterministic.

use crate::sat::agility::Agility;
use crate::sat::assignment::{Assignment, Reason, Value};
use crate::sat::cache::{ImplicationCache, LitReachable};
use crate::sat::clause_arena::{ClauseArena, ClauseRef};
use crate::sat::cnf::{Cnf, VarFlags};
use crate::sat::config::SolverConf;
use crate::sat::conflict_analysis::Analyser;
use crate::sat::exchange::{BinClause, Cursors, Logs, PendingImports, SharedExchange};
use crate::sat::heap::VsidsHeap;
use crate::sat::history::BoundedQueue;
use crate::sat::literal::Lit;
use crate::sat::polarity::Polarities;
use crate::sat::propagation::PropResult;
use crate::sat::stats::SearchStats;
use crate::sat::trail::Trail;
use crate::sat::watch::WatchLists;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::sync::Arc;

/// The outcome of one solve call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Sat,
    Unsat,
    /// The conflict budget ran out or the solve was interrupted.
    Undef,
}

/// Parameters of one restart's worth of searching.
#[derive(Debug, Clone)]
pub(crate) struct SearchParams {
    pub conflicts_to_do: u64,
    pub update: bool,
    pub conflicts_done: u64,
    pub need_to_stop: bool,
}

const VAR_DECAY: f64 = 0.95;
const BRANCH_DEPTH_WINDOW: usize = 500;
const LEARNT_SIZE_WINDOW: usize = 1000;

/// One CDCL search worker.
#[derive(Debug)]
pub struct Searcher {
    pub(crate) conf: SolverConf,
    pub(crate) num_vars: usize,

    pub(crate) assignment: Assignment,
    pub(crate) trail: Trail,
    pub(crate) watches: WatchLists,
    pub(crate) arena: ClauseArena,
    pub(crate) heap: VsidsHeap,
    pub(crate) polarities: Polarities,
    pub(crate) flags: VarFlags,

    pub(crate) reachable: Arc<LitReachable>,
    pub(crate) impl_cache: Arc<ImplicationCache>,

    pub(crate) analyser: Analyser,
    pub(crate) agility: Agility,
    pub(crate) glue_hist: BoundedQueue,
    pub(crate) branch_depth_hist: BoundedQueue,
    pub(crate) learnt_size_hist: BoundedQueue,

    pub(crate) assumptions: Vec<Lit>,
    pub(crate) conflict: Vec<Lit>,
    pub(crate) model: Option<Vec<bool>>,

    pub(crate) shared: Arc<SharedExchange>,
    pub(crate) worker_id: usize,
    pub(crate) cursors: Cursors,
    pub(crate) pending: PendingImports,
    pub(crate) learnts: Vec<ClauseRef>,

    pub(crate) rng: StdRng,
    pub(crate) ok: bool,
    pub(crate) in_burst: bool,
    pub(crate) stats: SearchStats,
}

impl Searcher {
    /// Builds a worker over `cnf`, attaches every clause and runs the
    /// initial propagation.
    #[must_use]
    pub fn new(
        cnf: &Cnf,
        flags: &VarFlags,
        conf: SolverConf,
        shared: Arc<SharedExchange>,
        reachable: Arc<LitReachable>,
        impl_cache: Arc<ImplicationCache>,
        worker_id: usize,
    ) -> Self {
        let num_vars = cnf.num_vars;
        let mut searcher = Self {
            num_vars,
            assignment: Assignment::new(num_vars),
            trail: Trail::new(num_vars),
            watches: WatchLists::new(num_vars),
            arena: ClauseArena::new(),
            heap: VsidsHeap::new(num_vars, VAR_DECAY),
            polarities: Polarities::new(num_vars, conf.polarity_mode),
            flags: flags.clone(),
            reachable,
            impl_cache,
            analyser: Analyser::new(num_vars),
            agility: Agility::new(
                conf.agility_g,
                conf.forget_low_agility_after,
                conf.count_agility_from_this_confl,
            ),
            glue_hist: BoundedQueue::new(conf.short_term_glue_history_size),
            branch_depth_hist: BoundedQueue::new(BRANCH_DEPTH_WINDOW),
            learnt_size_hist: BoundedQueue::new(LEARNT_SIZE_WINDOW),
            assumptions: Vec::new(),
            conflict: Vec::new(),
            model: None,
            shared,
            worker_id,
            cursors: Cursors::default(),
            pending: PendingImports::default(),
            learnts: Vec::new(),
            rng: StdRng::seed_from_u64(conf.orig_seed),
            ok: true,
            in_burst: false,
            stats: SearchStats::default(),
            conf,
        };
        searcher.initialise(cnf);
        searcher
    }

    /// A stand-alone single worker with default flags and empty caches;
    /// the library entry point when no parallelism is wanted.
    #[must_use]
    pub fn single(cnf: &Cnf, conf: SolverConf) -> Self {
        let num_vars = cnf.num_vars;
        Self::new(
            cnf,
            &VarFlags::all_decision(num_vars),
            conf.clone(),
            Arc::new(SharedExchange::new(1, conf.first_clean_limit)),
            Arc::new(LitReachable::new(num_vars)),
            Arc::new(ImplicationCache::new(num_vars)),
            0,
        )
    }

    fn initialise(&mut self, cnf: &Cnf) {
        for clause in &cnf.clauses {
            if !self.ok {
                return;
            }
            match clause.len() {
                0 => self.ok = false,
                1 => match self.val(clause[0]) {
                    Value::True => {}
                    Value::False => self.ok = false,
                    Value::Undef => self.enqueue(clause[0], Reason::None),
                },
                2 => self.watches.attach_binary(clause[0], clause[1], false),
                3 => self
                    .watches
                    .attach_ternary(clause[0], clause[1], clause[2]),
                _ => {
                    let cref = self.arena.alloc(clause, false, 0);
                    self.watches.attach_long(cref, clause[0], clause[1]);
                }
            }
        }
        if matches!(self.propagate(), PropResult::Conflict(_)) {
            self.ok = false;
        }

        let assignment = &self.assignment;
        let flags = &self.flags;
        self.heap
            .retain(|v| assignment.value(v).is_undef() && flags.is_decision(v));
    }

    #[inline]
    pub(crate) fn val(&self, lit: Lit) -> Value {
        self.assignment.lit_value(lit)
    }

    #[inline]
    pub(crate) fn decision_level(&self) -> usize {
        self.trail.decision_level()
    }

    /// Makes a literal true, updating the agility estimate with whether the
    /// assignment flips the saved phase.
    pub(crate) fn enqueue(&mut self, lit: Lit, reason: Reason) {
        debug_assert!(self.val(lit).is_undef());
        let var = lit.variable();
        let flipped = self.polarities.saved(var) != lit.polarity();
        self.agility.update(flipped);
        self.assignment
            .assign(lit, self.decision_level() as u32, reason);
        self.trail.push(lit);
    }

    /// Reverts to `level`, saving phases and re-queueing the undone
    /// variables for branching. A no-op at or below the current level.
    pub(crate) fn cancel_until(&mut self, level: usize) {
        if self.decision_level() <= level {
            return;
        }
        let from = self.trail.level_start(level + 1);
        for i in (from..self.trail.len()).rev() {
            let lit = self.trail[i];
            let var = lit.variable();
            self.polarities.save(var, lit.polarity());
            self.assignment.unassign(var);
            if self.flags.is_decision(var) {
                self.heap.insert(var);
            }
        }
        self.trail.cancel_to(level);
    }

    /// Solves under the given assumptions within the configured conflict
    /// budget.
    pub fn solve(&mut self, assumptions: &[Lit]) -> SolveStatus {
        self.conflict.clear();
        self.model = None;
        self.assumptions = assumptions.to_vec();
        if !self.ok {
            return SolveStatus::Unsat;
        }

        // Pick up anything the peers (or the coordinator's preload)
        // published before this worker got going.
        self.sync_inbox();
        if !self.import_pending() {
            self.ok = false;
            return SolveStatus::Unsat;
        }

        let mut status = SolveStatus::Undef;
        let mut restart_budget = self.conf.restart_first as f64;
        let mut burst = self.conf.burst_search_len;

        while status == SolveStatus::Undef
            && !self.shared.should_stop()
            && self.stats.conflicts < self.conf.max_conflicts
        {
            let update = burst == 0;
            self.in_burst = !update;
            let budget = if update { restart_budget as u64 } else { burst };
            let mut params = SearchParams {
                conflicts_to_do: budget,
                update,
                conflicts_done: 0,
                need_to_stop: false,
            };
            status = self.search(&mut params);
            if update {
                restart_budget *= self.conf.restart_inc;
            } else {
                burst = 0;
            }

            if status == SolveStatus::Undef
                && !self.shared.should_stop()
                && self.shared.conflicts() > self.shared.next_clean_limit()
                && !self.cleanup_epoch()
            {
                status = SolveStatus::Unsat;
            }
        }

        if status == SolveStatus::Sat {
            self.model = Some(self.build_model());
        } else if status == SolveStatus::Unsat && self.conflict.is_empty() {
            self.ok = false;
        }
        self.cancel_until(0);
        self.stats.mem_used_bytes = self.arena.mem_bytes();

        debug!(
            "worker {} finished: {:?}, {} conflicts, {} restarts",
            self.worker_id, status, self.stats.conflicts, self.stats.restarts
        );
        status
    }

    /// Searches until SAT, UNSAT or a restart is requested.
    fn search(&mut self, params: &mut SearchParams) -> SolveStatus {
        debug_assert!(self.ok);
        if params.update {
            self.stats.restarts += 1;
        }
        self.glue_hist.fast_clear();
        self.agility.reset();
        self.polarities.randomise_on_restart(&mut self.rng);

        loop {
            let old_trail = self.trail.len();
            let confl = self.propagate();
            if self.decision_level() == 0 && self.trail.len() > old_trail {
                self.publish_level0_units(old_trail);
            }

            match confl {
                PropResult::Conflict(ci) => {
                    self.log_agility_stats();
                    self.check_need_restart(params);
                    if !self.handle_conflict(params, ci) {
                        return SolveStatus::Unsat;
                    }
                    if !self.import_pending() {
                        return SolveStatus::Unsat;
                    }
                }
                PropResult::NoConflict => {
                    if params.need_to_stop
                        || self.shared.conflicts() > self.shared.next_clean_limit()
                    {
                        self.cancel_until(0);
                        return SolveStatus::Undef;
                    }
                    if let Some(decided) = self.new_decision() {
                        return decided;
                    }
                }
            }
        }
    }

    /// Consumes pending assumptions, then branches. `Some` ends the search:
    /// SAT when no branch variable remains, UNSAT when an assumption is
    /// already false.
    fn new_decision(&mut self) -> Option<SolveStatus> {
        let mut next = None;
        while self.decision_level() < self.assumptions.len() {
            let p = self.assumptions[self.decision_level()];
            match self.val(p) {
                // Already satisfied: push a dummy level to keep the
                // level-to-assumption correspondence.
                Value::True => self.trail.new_decision_level(),
                Value::False => {
                    self.conflict = self.analyse_final(p);
                    return Some(SolveStatus::Unsat);
                }
                Value::Undef => {
                    next = Some(p);
                    break;
                }
            }
        }

        let next = match next {
            Some(p) => p,
            None => {
                self.stats.decisions += 1;
                match self.pick_branch_lit() {
                    Some(lit) => lit,
                    None => return Some(SolveStatus::Sat),
                }
            }
        };

        debug_assert!(self.val(next).is_undef());
        self.trail.new_decision_level();
        self.enqueue(next, Reason::None);
        None
    }

    /// Picks the next branch literal, or `None` when every decision
    /// variable is assigned.
    fn pick_branch_lit(&mut self) -> Option<Lit> {
        // Rare random pick straight out of the heap, leaving it queued.
        if self.rng.gen::<f64>() < self.conf.random_var_freq && !self.heap.is_empty() {
            if let Some(var) = self.heap.random_entry(&mut self.rng) {
                if self.assignment.value(var).is_undef() && self.flags.is_decision(var) {
                    self.stats.rnd_decisions += 1;
                    return Some(Lit::new(var, self.choose_sign(var)));
                }
            }
        }

        loop {
            let var = self.heap.pop_max()?;
            if !self.assignment.value(var).is_undef() || !self.flags.is_decision(var) {
                continue;
            }
            let sign = self.choose_sign(var);
            let lit = Lit::new(var, sign);

            // Half the time, prefer a recorded dominator of the chosen
            // literal.
            if let Some(dom) = self.reachable.dominator(lit) {
                if self.assignment.value(dom.variable()).is_undef()
                    && self.flags.is_decision(dom.variable())
                    && self.rng.gen_bool(0.5)
                {
                    // The reachability table may be stale, so the original
                    // pick goes back into the heap.
                    self.heap.insert(var);
                    return Some(dom);
                }
            }
            return Some(lit);
        }
    }

    fn choose_sign(&mut self, var: crate::sat::literal::Variable) -> bool {
        if self.in_burst {
            self.rng.gen_bool(0.5)
        } else {
            self.polarities.choose(var, &mut self.rng)
        }
    }

    fn check_need_restart(&mut self, params: &mut SearchParams) {
        if self.shared.should_stop() {
            trace!("worker {}: interrupt set, restarting", self.worker_id);
            params.need_to_stop = true;
        }

        if self.agility.agility() < self.conf.agility_limit {
            self.agility.too_low(params.conflicts_done);
        }
        if self.agility.num_too_low() > self.conf.num_too_low_agilities_limit {
            trace!("worker {}: agility too low, restarting", self.worker_id);
            params.need_to_stop = true;
        }

        if params.conflicts_done > params.conflicts_to_do
            || self.stats.conflicts >= self.conf.max_conflicts
        {
            trace!(
                "worker {}: over conflict budget, restarting",
                self.worker_id
            );
            params.need_to_stop = true;
        }
    }

    /// Analyses a conflict, learns and attaches the resulting clause and
    /// publishes it to the peers. Returns `false` on UNSAT.
    fn handle_conflict(
        &mut self,
        params: &mut SearchParams,
        ci: crate::sat::propagation::ConflictInfo,
    ) -> bool {
        self.stats.conflicts += 1;
        params.conflicts_done += 1;
        self.shared.add_conflict();

        if self.decision_level() == 0 {
            return false;
        }

        let (learnt, backtrack_level, glue) = self.analyse(ci);
        debug_assert!(!learnt.is_empty());

        if params.update {
            self.branch_depth_hist.push(self.decision_level() as u32);
            self.glue_hist.push(glue);
            self.learnt_size_hist.push(learnt.len() as u32);
        }

        self.cancel_until(backtrack_level);
        debug_assert!(self.val(learnt[0]).is_undef());

        let glue = glue.min(self.conf.max_glue);
        self.publish_learnt(&learnt, glue);

        match learnt.len() {
            1 => {
                debug_assert_eq!(backtrack_level, 0);
                self.enqueue(learnt[0], Reason::None);
            }
            2 => {
                self.watches.attach_binary(learnt[0], learnt[1], true);
                self.enqueue(learnt[0], Reason::Binary(learnt[1]));
            }
            3 => {
                self.watches
                    .attach_ternary(learnt[0], learnt[1], learnt[2]);
                self.enqueue(learnt[0], Reason::Ternary(learnt[1], learnt[2]));
            }
            _ => {
                let cref = self.arena.alloc(&learnt, true, glue);
                self.learnts.push(cref);
                self.watches.attach_long(cref, learnt[0], learnt[1]);
                self.enqueue(
                    learnt[0],
                    Reason::Long {
                        cref,
                        watch_idx: 0,
                    },
                );
            }
        }

        self.heap.decay();
        true
    }

    // ------------------------------------------------------------------
    // Inter-worker exchange
    // ------------------------------------------------------------------

    /// Copies everything the peers appended since the last drain into the
    /// pending-import buffers. Call with the log lock held.
    fn drain_into_pending(&mut self, logs: &Logs) {
        self.cursors.catch_up(logs);
        for &u in &logs.units[self.cursors.unit..] {
            self.pending.units.push(u);
        }
        self.cursors.unit = logs.units.len();

        for &b in &logs.bins[self.cursors.bin..] {
            self.pending.bins.push(b);
        }
        self.cursors.bin = logs.bins.len();

        for (lits, glue) in &logs.longs[self.cursors.long..] {
            self.pending.longs.push((lits.clone(), *glue));
        }
        self.cursors.long = logs.longs.len();
    }

    /// Publishes a freshly learnt clause, draining the inbox in the same
    /// critical section. The own cursor moves past the appended entry so a
    /// worker never re-imports its own clauses.
    fn publish_learnt(&mut self, lits: &[Lit], glue: u32) {
        let shared = Arc::clone(&self.shared);
        let mut logs = shared.lock_logs();
        self.drain_into_pending(&logs);
        match lits.len() {
            1 => {
                logs.units.push(lits[0]);
                self.cursors.unit += 1;
                self.stats.published_units += 1;
            }
            2 => {
                logs.bins.push(BinClause {
                    a: lits[0],
                    b: lits[1],
                    learnt: true,
                });
                self.cursors.bin += 1;
                self.stats.published_bins += 1;
            }
            _ => {
                logs.longs.push((lits.to_vec(), glue));
                self.cursors.long += 1;
                self.stats.published_longs += 1;
            }
        }
    }

    /// Publishes the units derived at level 0 since trail position `from`.
    fn publish_level0_units(&mut self, from: usize) {
        debug_assert_eq!(self.decision_level(), 0);
        let shared = Arc::clone(&self.shared);
        let mut logs = shared.lock_logs();
        self.drain_into_pending(&logs);
        for i in from..self.trail.len() {
            logs.units.push(self.trail[i]);
            self.cursors.unit += 1;
            self.stats.published_units += 1;
        }
    }

    /// Drains the logs without publishing anything.
    fn sync_inbox(&mut self) {
        let shared = Arc::clone(&self.shared);
        let logs = shared.lock_logs();
        self.drain_into_pending(&logs);
    }

    /// Integrates every pending imported clause into the current state.
    /// Returns `false` when an import proves the formula unsatisfiable.
    fn import_pending(&mut self) -> bool {
        let units = std::mem::take(&mut self.pending.units);
        for u in units {
            self.stats.imported_units += 1;
            if !self.import_unit(u) {
                return false;
            }
        }
        let bins = std::mem::take(&mut self.pending.bins);
        for b in bins {
            self.stats.imported_bins += 1;
            if !self.import_bin(b) {
                return false;
            }
        }
        let longs = std::mem::take(&mut self.pending.longs);
        for (lits, glue) in longs {
            self.stats.imported_longs += 1;
            if !self.import_long(&lits, glue) {
                return false;
            }
        }
        true
    }

    fn import_unit(&mut self, u: Lit) -> bool {
        // Already a level-0 fact, nothing to do.
        if self.val(u).is_true() && self.assignment.level(u.variable()) == 0 {
            return true;
        }
        self.cancel_until(0);
        match self.val(u) {
            Value::Undef => {
                self.enqueue(u, Reason::None);
                true
            }
            Value::True => true,
            Value::False => false,
        }
    }

    fn import_bin(&mut self, bin: BinClause) -> bool {
        self.watches.attach_binary(bin.a, bin.b, bin.learnt);

        let (mut l0, mut l1) = (bin.a, bin.b);
        if self.val(l0).is_true() || self.val(l1).is_true() {
            return true;
        }
        if self.val(l1).is_undef() {
            std::mem::swap(&mut l0, &mut l1);
        }
        if self.val(l1).is_undef() {
            // Both unassigned.
            return true;
        }
        if self.val(l0).is_undef() {
            self.enqueue(l0, Reason::Binary(l1));
            return true;
        }

        // Both false: unassign the one at the deeper level.
        if self.assignment.level(l0.variable()) < self.assignment.level(l1.variable()) {
            std::mem::swap(&mut l0, &mut l1);
        }
        let deepest = self.assignment.level(l0.variable()) as usize;
        if deepest == 0 {
            self.cancel_until(0);
            return false;
        }
        self.cancel_until(deepest - 1);
        if self.val(l1).is_false() {
            self.enqueue(l0, Reason::Binary(l1));
        } else {
            // Both were on the same level and got unassigned together.
            debug_assert!(self.val(l0).is_undef() && self.val(l1).is_undef());
        }
        true
    }

    fn import_long(&mut self, lits: &[Lit], glue: u32) -> bool {
        debug_assert!(lits.len() >= 3);

        // Order the literals True > Undef > False, deeper levels first, so
        // the two best candidates end up watched.
        let mut order: Vec<usize> = (0..lits.len()).collect();
        let rank = |v: Value| match v {
            Value::True => 0_u8,
            Value::Undef => 1,
            Value::False => 2,
        };
        order.sort_by(|&i, &j| {
            rank(self.val(lits[i]))
                .cmp(&rank(self.val(lits[j])))
                .then_with(|| {
                    self.assignment
                        .level(lits[j].variable())
                        .cmp(&self.assignment.level(lits[i].variable()))
                })
        });
        let sorted: Vec<Lit> = order.into_iter().map(|i| lits[i]).collect();

        let cref = if sorted.len() == 3 {
            self.watches.attach_ternary(sorted[0], sorted[1], sorted[2]);
            None
        } else {
            let cref = self.arena.alloc(&sorted, true, glue);
            self.learnts.push(cref);
            self.watches.attach_long(cref, sorted[0], sorted[1]);
            Some(cref)
        };
        let reason = cref.map_or(Reason::Ternary(sorted[1], sorted[2]), |cref| Reason::Long {
            cref,
            watch_idx: 0,
        });

        let (v0, v1) = (self.val(sorted[0]), self.val(sorted[1]));
        if v0.is_true() || (v0.is_undef() && v1.is_undef()) {
            return true;
        }
        if v0.is_undef() {
            // Every other literal is false.
            debug_assert!(sorted[1..].iter().all(|&l| self.val(l).is_false()));
            self.enqueue(sorted[0], reason);
            return true;
        }

        // All literals false; unassign at least the deepest one.
        debug_assert!(v0.is_false());
        let deepest = self.assignment.level(sorted[0].variable()) as usize;
        if deepest == 0 {
            return false;
        }
        self.cancel_until(deepest - 1);
        debug_assert!(self.val(sorted[0]).is_undef());
        if self.val(sorted[1]).is_false() {
            self.enqueue(sorted[0], reason);
        }
        true
    }

    // ------------------------------------------------------------------
    // Clean-up epochs
    // ------------------------------------------------------------------

    /// The three-phase quiescent barrier: sync inboxes, integrate, then
    /// reduce the learnt database while the leader truncates the logs.
    fn cleanup_epoch(&mut self) -> bool {
        let shared = Arc::clone(&self.shared);
        shared.rendezvous().arrive();
        self.sync_inbox();
        shared.rendezvous().arrive();
        let ok = self.import_pending();
        let leader = shared.rendezvous().arrive();

        shared.advance_clean_limit(self.conf.first_clean_limit);
        if leader {
            let mut logs = shared.lock_logs();
            debug!(
                "clean-up epoch led by worker {}: truncating {}u/{}b/{}l shared clauses",
                self.worker_id,
                logs.units.len(),
                logs.bins.len(),
                logs.longs.len()
            );
            logs.truncate();
        }
        self.local_reduce();

        shared.rendezvous().arrive();
        ok
    }

    /// Frees the worst half of the deletable learnt long clauses, ordered
    /// by glue then activity. Clauses acting as reasons stay.
    fn local_reduce(&mut self) {
        let mut locked: FxHashSet<ClauseRef> = FxHashSet::default();
        for i in 0..self.trail.len() {
            if let Reason::Long { cref, .. } = self.assignment.reason(self.trail[i].variable()) {
                locked.insert(cref);
            }
        }

        let arena = &self.arena;
        let mut cands: Vec<ClauseRef> = self
            .learnts
            .iter()
            .copied()
            .filter(|&c| !arena.is_freed(c) && arena.glue(c) > 2 && !locked.contains(&c))
            .collect();
        cands.sort_by_key(|&c| {
            (
                arena.glue(c),
                Reverse(ordered_float::OrderedFloat(arena.activity(c))),
                c,
            )
        });

        let num_to_remove = cands.len() / 2;
        for &cref in cands.iter().rev().take(num_to_remove) {
            let (l0, l1) = {
                let lits = self.arena.lits(cref);
                (lits[0], lits[1])
            };
            self.watches.detach_long(cref, l0, l1);
            self.arena.free(cref);
        }
        let arena = &self.arena;
        self.learnts.retain(|&c| !arena.is_freed(c));
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    /// The full assignment after SAT. Unassigned non-decision variables
    /// fall back to their saved phase; model reconstruction for eliminated
    /// variables is the simplifier's job.
    fn build_model(&self) -> Vec<bool> {
        (0..self.num_vars as u32)
            .map(|v| match self.assignment.value(v) {
                Value::True => true,
                Value::False => false,
                Value::Undef => self.polarities.saved(v),
            })
            .collect()
    }

    fn log_agility_stats(&self) {
        if self.conf.verbosity >= 3 && self.stats.conflicts % 100 == 99 {
            trace!(
                "worker {}: confl {:6}, rest {:4}, agility {:.4}, tooLow {:3}",
                self.worker_id,
                self.stats.conflicts,
                self.stats.restarts,
                self.agility.agility(),
                self.agility.num_too_low()
            );
        }
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    /// The model found by the last solve, if it was SAT.
    pub fn take_model(&mut self) -> Option<Vec<bool>> {
        self.model.take()
    }

    /// The conflicting assumption subset of the last UNSAT-under-assumptions
    /// solve.
    pub fn take_conflict(&mut self) -> Vec<Lit> {
        std::mem::take(&mut self.conflict)
    }
}

/// Pigeonhole principle: `pigeons` into `holes`. Variable `p*holes+h+1`
/// means pigeon `p` sits in hole `h`. Unsatisfiable whenever
/// `pigeons > holes`.
#[cfg(test)]
pub(crate) fn php_clauses(pigeons: i32, holes: i32) -> Vec<Vec<i32>> {
    let var = |p: i32, h: i32| p * holes + h + 1;
    let mut clauses = Vec::new();
    for p in 0..pigeons {
        clauses.push((0..holes).map(|h| var(p, h)).collect());
    }
    for h in 0..holes {
        for p1 in 0..pigeons {
            for p2 in p1 + 1..pigeons {
                clauses.push(vec![-var(p1, h), -var(p2, h)]);
            }
        }
    }
    clauses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sat::cnf::Cnf;

    fn solve_single(clauses: Vec<Vec<i32>>) -> (SolveStatus, Option<Vec<bool>>) {
        let cnf = Cnf::new(clauses, 0);
        let mut searcher = Searcher::single(&cnf, SolverConf::default());
        let status = searcher.solve(&[]);
        (status, searcher.take_model())
    }

    #[test]
    fn test_empty_formula_is_sat() {
        let (status, model) = solve_single(vec![]);
        assert_eq!(status, SolveStatus::Sat);
        assert_eq!(model, Some(vec![]));
    }

    #[test]
    fn test_single_unit() {
        let (status, model) = solve_single(vec![vec![1]]);
        assert_eq!(status, SolveStatus::Sat);
        assert_eq!(model, Some(vec![true]));
    }

    #[test]
    fn test_contradicting_units_unsat_at_level_zero() {
        let (status, model) = solve_single(vec![vec![1], vec![-1]]);
        assert_eq!(status, SolveStatus::Unsat);
        assert!(model.is_none());
    }

    #[test]
    fn test_unsat_after_learning_both_unit_polarities() {
        // Learns ¬a, then a, giving a level-0 conflict.
        let (status, _) = solve_single(vec![vec![1, 2], vec![1, -2], vec![-1, 3], vec![-1, -3]]);
        assert_eq!(status, SolveStatus::Unsat);
    }

    #[test]
    fn test_sat_model_satisfies_formula() {
        let clauses = vec![vec![1, 2, 3], vec![-1, -2], vec![-2, -3], vec![2, 3]];
        let cnf = Cnf::new(clauses.clone(), 0);
        let mut searcher = Searcher::single(&cnf, SolverConf::default());
        assert_eq!(searcher.solve(&[]), SolveStatus::Sat);
        let model = searcher.take_model().unwrap();
        assert!(cnf.verify(&model));
    }

    #[test]
    fn test_assumption_conflict_is_the_assumption_itself() {
        // All clauses force a; assuming ¬a is a minimal conflict by itself.
        let clauses = vec![
            vec![1, 2, 3],
            vec![1, 2, -3],
            vec![1, -2, 3],
            vec![1, -2, -3],
        ];
        let cnf = Cnf::new(clauses, 0);
        let mut searcher = Searcher::single(&cnf, SolverConf::default());
        let not_a = Lit::from_dimacs(-1);
        assert_eq!(searcher.solve(&[not_a]), SolveStatus::Unsat);
        assert_eq!(searcher.take_conflict(), vec![not_a]);
    }

    #[test]
    fn test_sat_under_assumptions_extends_them() {
        let cnf = Cnf::new(vec![vec![1, 2], vec![-1, 3]], 0);
        let mut searcher = Searcher::single(&cnf, SolverConf::default());
        let assumps = [Lit::from_dimacs(1), Lit::from_dimacs(3)];
        assert_eq!(searcher.solve(&assumps), SolveStatus::Sat);
        let model = searcher.take_model().unwrap();
        assert!(model[0]);
        assert!(model[2]);
        assert!(cnf.verify(&model));
    }

    #[test]
    fn test_contradicting_assumptions() {
        let cnf = Cnf::new(vec![vec![1, 2]], 0);
        let mut searcher = Searcher::single(&cnf, SolverConf::default());
        let assumps = [Lit::from_dimacs(2), Lit::from_dimacs(-2)];
        assert_eq!(searcher.solve(&assumps), SolveStatus::Unsat);
        let conflict = searcher.take_conflict();
        assert!(conflict.contains(&Lit::from_dimacs(-2)));
        assert!(conflict.contains(&Lit::from_dimacs(2)));
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let clauses: Vec<Vec<i32>> = vec![
            vec![1, 2, -3],
            vec![-1, 3, 4],
            vec![2, -4, 5],
            vec![-2, -5, 6],
            vec![3, -6, -1],
            vec![-3, 5, -4],
        ];
        let run = || {
            let cnf = Cnf::new(clauses.clone(), 0);
            let mut s = Searcher::single(
                &cnf,
                SolverConf {
                    orig_seed: 42,
                    random_var_freq: 0.1,
                    ..SolverConf::default()
                },
            );
            let status = s.solve(&[]);
            (status, s.take_model(), s.stats().decisions)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_budget_exhaustion_returns_undef() {
        // A pigeonhole instance too big to finish in two conflicts.
        let cnf = Cnf::new(php_clauses(4, 3), 0);
        let mut searcher = Searcher::single(
            &cnf,
            SolverConf {
                max_conflicts: 2,
                ..SolverConf::default()
            },
        );
        assert_eq!(searcher.solve(&[]), SolveStatus::Undef);
    }

    #[test]
    fn test_pigeonhole_three_in_two_unsat() {
        let cnf = Cnf::new(php_clauses(3, 2), 0);
        let mut searcher = Searcher::single(&cnf, SolverConf::default());
        assert_eq!(searcher.solve(&[]), SolveStatus::Unsat);
        assert!(searcher.stats().conflicts < 1000);
    }
}
