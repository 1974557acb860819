#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
//! Saved branching polarities (phase saving).

use crate::sat::literal::Variable;
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt;

/// How the branch sign is chosen for a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PolarityMode {
    /// Phase saving: branch on the sign the variable last had.
    #[default]
    Auto,
    /// Always branch positive.
    Positive,
    /// Always branch negative.
    Negative,
    /// A fresh random sign on every decision.
    Random,
    /// Phase saving, with all saved signs re-randomised at each restart.
    RndOnRestart,
}

impl fmt::Display for PolarityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Random => "random",
            Self::RndOnRestart => "rnd-on-restart",
        })
    }
}

/// Per-variable saved signs plus the selection mode.
#[derive(Debug, Clone, Default)]
pub struct Polarities {
    saved: Vec<bool>,
    mode: PolarityMode,
}

impl Polarities {
    #[must_use]
    pub fn new(num_vars: usize, mode: PolarityMode) -> Self {
        Self {
            saved: vec![false; num_vars],
            mode,
        }
    }

    /// The sign the variable last had (or the default before any
    /// assignment).
    #[must_use]
    pub fn saved(&self, var: Variable) -> bool {
        self.saved[var as usize]
    }

    /// Records the sign a variable had when it was unassigned.
    pub fn save(&mut self, var: Variable, polarity: bool) {
        self.saved[var as usize] = polarity;
    }

    /// Chooses the branch sign for `var` under the configured mode.
    pub fn choose(&self, var: Variable, rng: &mut StdRng) -> bool {
        match self.mode {
            PolarityMode::Auto | PolarityMode::RndOnRestart => self.saved(var),
            PolarityMode::Positive => true,
            PolarityMode::Negative => false,
            PolarityMode::Random => rng.gen_bool(0.5),
        }
    }

    /// Re-randomises the saved signs; only meaningful in `RndOnRestart`
    /// mode, where it is called at every restart.
    pub fn randomise_on_restart(&mut self, rng: &mut StdRng) {
        if self.mode == PolarityMode::RndOnRestart {
            for s in &mut self.saved {
                *s = rng.gen_bool(0.5);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_phase_saving() {
        let mut p = Polarities::new(3, PolarityMode::Auto);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!p.choose(0, &mut rng));
        p.save(0, true);
        assert!(p.choose(0, &mut rng));
        assert!(!p.choose(1, &mut rng));
    }

    #[test]
    fn test_fixed_modes() {
        let mut rng = StdRng::seed_from_u64(1);
        let p = Polarities::new(2, PolarityMode::Positive);
        assert!(p.choose(0, &mut rng));
        let n = Polarities::new(2, PolarityMode::Negative);
        assert!(!n.choose(0, &mut rng));
    }

    #[test]
    fn test_rnd_on_restart_only_changes_in_that_mode() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut p = Polarities::new(64, PolarityMode::Auto);
        p.randomise_on_restart(&mut rng);
        assert!((0..64).all(|v| !p.saved(v)));

        let mut q = Polarities::new(64, PolarityMode::RndOnRestart);
        q.randomise_on_restart(&mut rng);
        assert!((0..64).any(|v| q.saved(v)));
    }
}
