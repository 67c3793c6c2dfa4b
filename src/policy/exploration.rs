//! Run-indexed exploration probability.

use rand::Rng;

use crate::algorithms::qlearning::ConfigError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Probability of exploring as a function of the run counter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExplorationSchedule {
    /// The same probability every run.
    Constant(f64),
    /// p(run) = end + (start - end) * e<sup>-rate * run</sup>
    EpsilonDecay { start: f64, end: f64, rate: f64 },
    /// `early` before `switch_run`, `late` from then on.
    TwoTier { switch_run: u32, early: f64, late: f64 },
}

impl ExplorationSchedule {
    pub fn probability(&self, run: u32) -> f64 {
        match *self {
            Self::Constant(p) => p,
            Self::EpsilonDecay { start, end, rate } => {
                end + (start - end) * (-rate * f64::from(run)).exp()
            }
            Self::TwoTier {
                switch_run,
                early,
                late,
            } => {
                if run < switch_run {
                    early
                } else {
                    late
                }
            }
        }
    }

    /// Draws whether to explore in `run`.
    pub fn explore<R: Rng + ?Sized>(&self, run: u32, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.probability(run)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let check = |name: &'static str, value: f64| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::InvalidProbability { name, value })
            }
        };
        match *self {
            Self::Constant(p) => check("constant", p),
            Self::EpsilonDecay { start, end, rate } => {
                check("start", start)?;
                check("end", end)?;
                if rate.is_nan() || rate < 0.0 {
                    return Err(ConfigError::InvalidDecayRate(rate));
                }
                Ok(())
            }
            Self::TwoTier { early, late, .. } => {
                check("early", early)?;
                check("late", late)
            }
        }
    }
}

impl Default for ExplorationSchedule {
    fn default() -> Self {
        Self::EpsilonDecay {
            start: 1.0,
            end: 0.05,
            rate: 0.01,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn decay_starts_at_start_and_approaches_end() {
        let s = ExplorationSchedule::EpsilonDecay {
            start: 0.9,
            end: 0.1,
            rate: 0.5,
        };
        assert!((s.probability(0) - 0.9).abs() < 1e-12);
        assert!(s.probability(5) < s.probability(1));
        assert!((s.probability(200) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn two_tier_switches() {
        let s = ExplorationSchedule::TwoTier {
            switch_run: 3,
            early: 0.5,
            late: 0.0,
        };
        assert_eq!(s.probability(2), 0.5);
        assert_eq!(s.probability(3), 0.0);
    }

    #[test]
    fn extreme_probabilities_are_deterministic() {
        let mut rng = StdRng::seed_from_u64(9);
        for run in 0..20 {
            assert!(!ExplorationSchedule::Constant(0.0).explore(run, &mut rng));
            assert!(ExplorationSchedule::Constant(1.0).explore(run, &mut rng));
        }
    }

    #[test]
    fn validation_names_the_field() {
        let s = ExplorationSchedule::TwoTier {
            switch_run: 1,
            early: 0.5,
            late: 1.5,
        };
        assert_eq!(
            s.validate(),
            Err(ConfigError::InvalidProbability {
                name: "late",
                value: 1.5
            })
        );
        let s = ExplorationSchedule::EpsilonDecay {
            start: 1.0,
            end: 0.0,
            rate: -1.0,
        };
        assert_eq!(s.validate(), Err(ConfigError::InvalidDecayRate(-1.0)));
        assert!(ExplorationSchedule::default().validate().is_ok());
    }
}
