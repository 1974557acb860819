#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Solver configuration.

use crate::sat::polarity::PolarityMode;

/// Everything a worker needs to know about how to search.
///
/// The coordinator hands each worker a [`SolverConf::diversified`] copy so
/// the portfolio explores the space differently while sharing clauses.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct SolverConf {
    /// Base random seed; each worker derives its own seed from it.
    pub orig_seed: u64,
    /// Number of parallel search workers.
    pub num_workers: usize,
    /// Probability of attempting a random branch variable pick.
    pub random_var_freq: f64,
    /// Branch sign selection mode.
    pub polarity_mode: PolarityMode,

    /// Decay factor of the agility moving average.
    pub agility_g: f64,
    /// Agility below this value counts as a too-low observation.
    pub agility_limit: f64,
    /// Too-low observations are forgotten after this many conflicts
    /// without one.
    pub forget_low_agility_after: u64,
    /// Too-low observations are ignored before this many conflicts of the
    /// current restart have happened.
    pub count_agility_from_this_confl: u64,
    /// Number of too-low observations that requests a restart.
    pub num_too_low_agilities_limit: u32,

    /// Window size of the short-term glue history.
    pub short_term_glue_history_size: usize,
    /// Whether the implication cache may be consulted at all.
    pub do_cache: bool,
    /// Whether learnt clauses are minimised beyond First-UIP.
    pub do_minim_learnt_more: bool,
    /// Run further minimisation on every conflict instead of gating it on
    /// the glue and size averages.
    pub do_always_f_minim: bool,

    /// 0 = quiet .. 3 = trace.
    pub verbosity: u8,

    /// Conflict budget for one solve call; `u64::MAX` means unbounded.
    pub max_conflicts: u64,
    /// Conflicts allowed in the first restart.
    pub restart_first: u64,
    /// Growth factor of the per-restart conflict budget.
    pub restart_inc: f64,
    /// Conflicts of the initial burst search (random polarity, no stats).
    pub burst_search_len: u64,
    /// Global conflicts before the first clean-up barrier, and the step
    /// between subsequent ones.
    pub first_clean_limit: u64,
    /// Upper clamp for glue values.
    pub max_glue: u32,
}

impl Default for SolverConf {
    fn default() -> Self {
        Self {
            orig_seed: 0,
            num_workers: 1,
            random_var_freq: 0.001,
            polarity_mode: PolarityMode::Auto,
            agility_g: 0.9999,
            agility_limit: 0.20,
            forget_low_agility_after: 10_000,
            count_agility_from_this_confl: 100,
            num_too_low_agilities_limit: 30,
            short_term_glue_history_size: 100,
            do_cache: true,
            do_minim_learnt_more: true,
            do_always_f_minim: false,
            verbosity: 0,
            max_conflicts: u64::MAX,
            restart_first: 100,
            restart_inc: 1.2,
            burst_search_len: 300,
            first_clean_limit: 20_000,
            max_glue: 100_000,
        }
    }
}

impl SolverConf {
    /// The configuration actually given to worker `worker`.
    ///
    /// Worker 0 runs the configuration as given; the others vary the seed,
    /// the random-branch frequency, the polarity mode and the restart
    /// budget so the portfolio diverges.
    #[must_use]
    pub fn diversified(&self, worker: usize) -> Self {
        let mut conf = self.clone();
        conf.orig_seed = self
            .orig_seed
            .wrapping_add((worker as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15));
        if worker == 0 {
            return conf;
        }
        conf.random_var_freq = [self.random_var_freq, 0.0, 0.02, 0.05][worker % 4];
        conf.polarity_mode = match worker % 4 {
            1 => PolarityMode::RndOnRestart,
            2 => PolarityMode::Random,
            _ => self.polarity_mode,
        };
        conf.restart_first = self.restart_first << (worker % 3);
        conf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_zero_unchanged() {
        let conf = SolverConf::default();
        let w0 = conf.diversified(0);
        assert_eq!(w0.random_var_freq, conf.random_var_freq);
        assert_eq!(w0.polarity_mode, conf.polarity_mode);
        assert_eq!(w0.orig_seed, conf.orig_seed);
    }

    #[test]
    fn test_workers_get_distinct_seeds() {
        let conf = SolverConf::default();
        let seeds: Vec<u64> = (0..4).map(|w| conf.diversified(w).orig_seed).collect();
        for i in 0..4 {
            for j in i + 1..4 {
                assert_ne!(seeds[i], seeds[j]);
            }
        }
    }
}
