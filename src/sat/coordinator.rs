#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! The thin parallel coordinator.
//!
//! Spawns N symmetric workers over the same formula, each with a
//! diversified configuration, and collects their reports. The first worker
//! to reach a definitive verdict marks the solve finished, which makes the
//! others wind down at their next conflict boundary. Clause exchange and
//! clean-up run entirely between the workers; the coordinator only fans
//! out and gathers.

use crate::sat::cache::{ImplicationCache, LitReachable};
use crate::sat::cnf::{Cnf, VarFlags};
use crate::sat::config::SolverConf;
use crate::sat::exchange::{BinClause, Rendezvous, SharedExchange};
use crate::sat::literal::Lit;
use crate::sat::searcher::{Searcher, SolveStatus};
use crate::sat::stats::SearchStats;
use log::info;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::thread;

/// What one worker came back with.
#[derive(Debug)]
struct WorkerReport {
    worker_id: usize,
    status: SolveStatus,
    model: Option<Vec<bool>>,
    conflict: Vec<Lit>,
    stats: SearchStats,
}

/// The aggregated result of a parallel solve.
#[derive(Debug)]
pub struct SolveReport {
    pub status: SolveStatus,
    /// A satisfying assignment, on SAT.
    pub model: Option<Vec<bool>>,
    /// The conflicting assumption subset, on UNSAT under assumptions.
    pub conflict: Vec<Lit>,
    /// Per-worker statistics, ordered by worker id.
    pub stats: Vec<SearchStats>,
}

/// Ensures a terminating worker leaves the rendezvous group even when it
/// unwinds, so no peer stays blocked at a barrier.
struct LeaveGuard<'a>(&'a Rendezvous);

impl Drop for LeaveGuard<'_> {
    fn drop(&mut self) {
        self.0.leave();
    }
}

/// A portfolio solver: the public front door of the crate.
#[derive(Debug)]
pub struct ParallelSolver {
    cnf: Cnf,
    conf: SolverConf,
    flags: VarFlags,
    reachable: Arc<LitReachable>,
    impl_cache: Arc<ImplicationCache>,
    preloaded: Vec<(Vec<Lit>, u32)>,
    interrupt: Arc<AtomicBool>,
}

impl ParallelSolver {
    #[must_use]
    pub fn new(cnf: Cnf, conf: SolverConf) -> Self {
        let num_vars = cnf.num_vars;
        Self {
            cnf,
            conf,
            flags: VarFlags::all_decision(num_vars),
            reachable: Arc::new(LitReachable::new(num_vars)),
            impl_cache: Arc::new(ImplicationCache::new(num_vars)),
            preloaded: Vec::new(),
            interrupt: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the per-variable decision/elimination flags.
    pub fn set_var_flags(&mut self, flags: VarFlags) {
        self.flags = flags;
    }

    /// Installs the reachability table computed by preprocessing.
    pub fn set_reachable(&mut self, reachable: LitReachable) {
        self.reachable = Arc::new(reachable);
    }

    /// Installs the implication cache computed by preprocessing.
    pub fn set_implication_cache(&mut self, cache: ImplicationCache) {
        self.impl_cache = Arc::new(cache);
    }

    /// Seeds already-learnt clauses (for instance from an earlier solve of
    /// the same formula); workers pick them up through the exchange logs.
    pub fn preload_learnts<I: IntoIterator<Item = Vec<Lit>>>(&mut self, clauses: I) {
        for lits in clauses {
            let glue = lits.len().min(u32::MAX as usize) as u32;
            self.preloaded.push((lits, glue));
        }
    }

    /// A handle the caller may set from another thread to cancel the
    /// solve; workers then return Undef at their next conflict boundary.
    #[must_use]
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    /// Solves without assumptions.
    pub fn solve(&mut self) -> SolveReport {
        self.solve_with_assumptions(&[])
    }

    /// Solves under the given assumptions.
    ///
    /// # Panics
    ///
    /// Panics if a worker thread panicked (an invariant violation).
    pub fn solve_with_assumptions(&mut self, assumptions: &[Lit]) -> SolveReport {
        let num_workers = self.conf.num_workers.max(1);
        let shared = Arc::new(SharedExchange::with_interrupt(
            num_workers,
            self.conf.first_clean_limit,
            Arc::clone(&self.interrupt),
        ));

        // Pre-learnt clauses enter through the logs like any peer clause.
        {
            let mut logs = shared.lock_logs();
            for (lits, glue) in &self.preloaded {
                match lits.len() {
                    0 => {}
                    1 => logs.units.push(lits[0]),
                    2 => logs.bins.push(BinClause {
                        a: lits[0],
                        b: lits[1],
                        learnt: true,
                    }),
                    _ => logs.longs.push((lits.clone(), *glue)),
                }
            }
        }

        let (tx, rx) = crossbeam_channel::unbounded::<WorkerReport>();
        let mut reports: Vec<WorkerReport> = thread::scope(|scope| {
            for worker_id in 0..num_workers {
                let conf = self.conf.diversified(worker_id);
                let shared = Arc::clone(&shared);
                let reachable = Arc::clone(&self.reachable);
                let impl_cache = Arc::clone(&self.impl_cache);
                let cnf = &self.cnf;
                let flags = &self.flags;
                let tx = tx.clone();

                scope.spawn(move || {
                    let _leave = LeaveGuard(shared.rendezvous());
                    let mut searcher = Searcher::new(
                        cnf,
                        flags,
                        conf,
                        Arc::clone(&shared),
                        reachable,
                        impl_cache,
                        worker_id,
                    );
                    let status = searcher.solve(assumptions);
                    if status != SolveStatus::Undef {
                        shared.finish();
                    }
                    let _ = tx.send(WorkerReport {
                        worker_id,
                        status,
                        model: searcher.take_model(),
                        conflict: searcher.take_conflict(),
                        stats: searcher.stats().clone(),
                    });
                });
            }
            drop(tx);
            rx.iter().collect()
        });
        reports.sort_by_key(|r| r.worker_id);

        let winner = reports
            .iter()
            .position(|r| r.status != SolveStatus::Undef);
        let (status, model, conflict) = winner.map_or(
            (SolveStatus::Undef, None, Vec::new()),
            |i| {
                let r = &mut reports[i];
                (r.status, r.model.take(), std::mem::take(&mut r.conflict))
            },
        );

        info!(
            "solve finished: {status:?} ({} workers, {} conflicts total)",
            num_workers,
            reports.iter().map(|r| r.stats.conflicts).sum::<u64>()
        );

        SolveReport {
            status,
            model,
            conflict,
            stats: reports.into_iter().map(|r| r.stats).collect(),
        }
    }
}
