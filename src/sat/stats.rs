#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::cast_precision_loss)]
//! Per-worker search statistics.

use std::fmt;

/// Counters gathered by one search worker.
#[derive(Debug, Clone, Default)]
pub struct SearchStats {
    pub restarts: u64,
    pub conflicts: u64,
    pub decisions: u64,
    pub rnd_decisions: u64,
    pub propagations: u64,

    /// Learnt-clause literals before and after minimisation.
    pub max_literals: u64,
    pub tot_literals: u64,

    /// Further-minimisation attempts and their effect.
    pub further_minim_attempts: u64,
    pub shrunk_clauses: u64,
    pub shrunk_lits: u64,
    /// Literals dropped by on-the-fly watch shrinking.
    pub watch_shrunk_lits: u64,

    pub published_units: u64,
    pub published_bins: u64,
    pub published_longs: u64,
    pub imported_units: u64,
    pub imported_bins: u64,
    pub imported_longs: u64,

    /// Bytes held by the clause arena at the end of the solve.
    pub mem_used_bytes: usize,
}

impl SearchStats {
    /// Percentage of learnt literals removed by minimisation.
    #[must_use]
    pub fn lits_deleted_pct(&self) -> f64 {
        if self.max_literals == 0 {
            0.0
        } else {
            (self.max_literals - self.tot_literals) as f64 * 100.0 / self.max_literals as f64
        }
    }

    /// Percentage of decisions that were random picks.
    #[must_use]
    pub fn rnd_decision_pct(&self) -> f64 {
        if self.decisions == 0 {
            0.0
        } else {
            self.rnd_decisions as f64 * 100.0 / self.decisions as f64
        }
    }
}

fn stats_line(
    f: &mut fmt::Formatter<'_>,
    left: &str,
    value: impl fmt::Display,
    extra: &str,
) -> fmt::Result {
    writeln!(f, "c {left:<27}: {value:<11} {extra}")
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        stats_line(f, "restarts", self.restarts, "")?;
        stats_line(f, "conflicts", self.conflicts, "")?;
        stats_line(
            f,
            "decisions",
            self.decisions,
            &format!("({:.2} % random)", self.rnd_decision_pct()),
        )?;
        stats_line(f, "propagations", self.propagations, "")?;
        stats_line(
            f,
            "conflict literals",
            self.tot_literals,
            &format!("({:.2} % deleted)", self.lits_deleted_pct()),
        )?;
        stats_line(
            f,
            "OTF cl watch-shrink lits",
            self.watch_shrunk_lits,
            "",
        )?;
        stats_line(
            f,
            "tried to recurMin cls",
            self.further_minim_attempts,
            &format!(
                "({} shrunk, {} lits)",
                self.shrunk_clauses, self.shrunk_lits
            ),
        )?;
        stats_line(
            f,
            "learnts published u/b/l",
            format!(
                "{}/{}/{}",
                self.published_units, self.published_bins, self.published_longs
            ),
            "",
        )?;
        stats_line(
            f,
            "learnts imported u/b/l",
            format!(
                "{}/{}/{}",
                self.imported_units, self.imported_bins, self.imported_longs
            ),
            "",
        )?;
        stats_line(
            f,
            "memory used",
            format!("{:.2} MB", self.mem_used_bytes as f64 / 1_048_576.0),
            "",
        )
    }
}
