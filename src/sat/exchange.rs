#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Shared state for inter-worker clause exchange.
//!
//! Workers publish learnt clauses into three append-only logs (units,
//! binaries, longer clauses), each consumed by every peer through private
//! cursors. Appends and reads happen under one critical section, whose
//! lock release is the only memory fence the protocol needs: a clause
//! appended before the release is visible to any peer draining afterwards.
//!
//! The logs are truncated only at clean-up epochs, when all live workers
//! are quiesced at the [`Rendezvous`]. The log `epoch` counter lets a
//! worker detect a truncation it did not lead and rewind its cursors.

use crate::sat::literal::Lit;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// A shared binary clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinClause {
    pub a: Lit,
    pub b: Lit,
    pub learnt: bool,
}

/// The three append-only learnt-clause logs.
#[derive(Debug, Default)]
pub struct Logs {
    pub units: Vec<Lit>,
    pub bins: Vec<BinClause>,
    /// Longer clauses together with their glue.
    pub longs: Vec<(Vec<Lit>, u32)>,
    /// Bumped on every truncation so stale cursors can be detected.
    pub epoch: u64,
}

impl Logs {
    /// Empties all three logs, invalidating every outstanding cursor.
    pub fn truncate(&mut self) {
        self.units.clear();
        self.bins.clear();
        self.longs.clear();
        self.epoch += 1;
    }
}

/// Clauses drained from the logs but not yet integrated into a worker's
/// search state.
#[derive(Debug, Default)]
pub struct PendingImports {
    pub units: Vec<Lit>,
    pub bins: Vec<BinClause>,
    pub longs: Vec<(Vec<Lit>, u32)>,
}

/// A worker's read positions into the logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cursors {
    pub unit: usize,
    pub bin: usize,
    pub long: usize,
    pub epoch: u64,
}

impl Cursors {
    /// Rewinds to the start of the logs if they were truncated since this
    /// cursor set last moved.
    pub fn catch_up(&mut self, logs: &Logs) {
        if self.epoch != logs.epoch {
            *self = Self {
                epoch: logs.epoch,
                ..Self::default()
            };
        }
    }
}

/// A barrier with dynamic membership.
///
/// Workers arrive repeatedly over the solve; a worker that terminates
/// leaves the group, which releases any peers already waiting on the
/// current generation. This is what makes first-finisher termination safe
/// while the rest of the portfolio sits at a clean-up barrier.
#[derive(Debug)]
pub struct Rendezvous {
    state: Mutex<RendezvousState>,
    cond: Condvar,
}

#[derive(Debug)]
struct RendezvousState {
    members: usize,
    arrived: usize,
    generation: u64,
}

impl Rendezvous {
    #[must_use]
    pub fn new(members: usize) -> Self {
        Self {
            state: Mutex::new(RendezvousState {
                members,
                arrived: 0,
                generation: 0,
            }),
            cond: Condvar::new(),
        }
    }

    /// Blocks until every live member has arrived. Returns `true` for
    /// exactly one member per generation (the leader), unless the
    /// generation was released by a departing member.
    pub fn arrive(&self) -> bool {
        let mut st = self.state.lock().expect("rendezvous poisoned");
        let gen = st.generation;
        st.arrived += 1;
        if st.arrived >= st.members {
            st.arrived = 0;
            st.generation += 1;
            self.cond.notify_all();
            return true;
        }
        while st.generation == gen {
            st = self.cond.wait(st).expect("rendezvous poisoned");
        }
        false
    }

    /// Permanently removes one member, releasing the current generation if
    /// the departure completes it.
    pub fn leave(&self) {
        let mut st = self.state.lock().expect("rendezvous poisoned");
        st.members -= 1;
        if st.members > 0 && st.arrived >= st.members {
            st.arrived = 0;
            st.generation += 1;
        }
        self.cond.notify_all();
    }
}

/// Everything shared between the workers of one solve call.
#[derive(Debug)]
pub struct SharedExchange {
    logs: Mutex<Logs>,
    rendezvous: Rendezvous,
    conflicts: AtomicU64,
    next_clean_limit: AtomicU64,
    interrupt: Arc<AtomicBool>,
    finished: AtomicBool,
}

impl SharedExchange {
    #[must_use]
    pub fn new(num_workers: usize, first_clean_limit: u64) -> Self {
        Self::with_interrupt(num_workers, first_clean_limit, Arc::default())
    }

    /// Uses an externally owned interrupt flag, so a caller can cancel the
    /// solve from outside.
    #[must_use]
    pub fn with_interrupt(
        num_workers: usize,
        first_clean_limit: u64,
        interrupt: Arc<AtomicBool>,
    ) -> Self {
        Self {
            logs: Mutex::new(Logs::default()),
            rendezvous: Rendezvous::new(num_workers),
            conflicts: AtomicU64::new(0),
            next_clean_limit: AtomicU64::new(first_clean_limit),
            interrupt,
            finished: AtomicBool::new(false),
        }
    }

    /// Enters the critical section guarding the logs.
    ///
    /// # Panics
    ///
    /// Panics if a worker died while holding the lock.
    pub fn lock_logs(&self) -> MutexGuard<'_, Logs> {
        self.logs.lock().expect("log mutex poisoned")
    }

    #[must_use]
    pub fn rendezvous(&self) -> &Rendezvous {
        &self.rendezvous
    }

    /// Counts one conflict and returns the new global total.
    pub fn add_conflict(&self) -> u64 {
        self.conflicts.fetch_add(1, Ordering::Relaxed) + 1
    }

    #[must_use]
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn next_clean_limit(&self) -> u64 {
        self.next_clean_limit.load(Ordering::Relaxed)
    }

    /// Moves the clean-up threshold past the current conflict count.
    /// Monotonic, so concurrent callers cannot pull it backwards.
    pub fn advance_clean_limit(&self, step: u64) {
        self.next_clean_limit
            .fetch_max(self.conflicts() + step, Ordering::Relaxed);
    }

    /// Requests cancellation of all workers.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Marks that some worker reached a definitive result.
    pub fn finish(&self) {
        self.finished.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    /// `true` when workers should wind down.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.interrupted() || self.finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn lit(d: i32) -> Lit {
        Lit::from_dimacs(d)
    }

    #[test]
    fn test_cursors_catch_up_on_truncation() {
        let mut logs = Logs::default();
        logs.units.push(lit(1));
        logs.units.push(lit(2));

        let mut cursors = Cursors::default();
        cursors.catch_up(&logs);
        cursors.unit = logs.units.len();

        logs.truncate();
        logs.units.push(lit(3));
        cursors.catch_up(&logs);
        assert_eq!(cursors.unit, 0);
        assert_eq!(cursors.epoch, logs.epoch);
    }

    #[test]
    fn test_publication_is_visible_after_drain() {
        let ex = SharedExchange::new(2, 1000);
        {
            let mut logs = ex.lock_logs();
            logs.bins.push(BinClause {
                a: lit(1),
                b: lit(-2),
                learnt: true,
            });
        }
        let logs = ex.lock_logs();
        assert_eq!(logs.bins.len(), 1);
    }

    #[test]
    fn test_clean_limit_is_monotonic() {
        let ex = SharedExchange::new(1, 100);
        for _ in 0..150 {
            ex.add_conflict();
        }
        ex.advance_clean_limit(100);
        assert_eq!(ex.next_clean_limit(), 250);
        // a straggler advancing with a smaller step cannot regress it
        ex.advance_clean_limit(10);
        assert_eq!(ex.next_clean_limit(), 250);
    }

    #[test]
    fn test_rendezvous_releases_all_members() {
        let r = Arc::new(Rendezvous::new(3));
        let mut handles = Vec::new();
        for _ in 0..3 {
            let r = Arc::clone(&r);
            handles.push(thread::spawn(move || r.arrive()));
        }
        let leaders: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(leaders.iter().filter(|&&l| l).count(), 1);
    }

    #[test]
    fn test_rendezvous_leave_unblocks_waiters() {
        let r = Arc::new(Rendezvous::new(2));
        let waiter = {
            let r = Arc::clone(&r);
            thread::spawn(move || r.arrive())
        };
        // Give the waiter a moment to block, then leave instead of arriving.
        thread::sleep(std::time::Duration::from_millis(20));
        r.leave();
        // The waiter must return rather than deadlock.
        let _ = waiter.join().unwrap();
    }
}
