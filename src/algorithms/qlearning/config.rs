//! Configuration for the Q-learning tables and experience replay.

use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Learning rate must be in (0, 1], got {0}")]
    InvalidLearningRate(f64),

    #[error("Discount factor must be in [0, 1), got {0}")]
    InvalidDiscount(f64),

    #[error("Exploration probability `{name}` must be in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },

    #[error("Exploration decay rate must be non-negative, got {0}")]
    InvalidDecayRate(f64),

    #[error("Replay threshold must be at least 1 when replay is enabled")]
    InvalidReplayThreshold,

    #[error("Export period must be at least 1 run")]
    InvalidExportPeriod,

    #[error("Statistics window must cover at least 1 iteration")]
    InvalidStatisticsWindow,
}

/// Experience replay settings.
///
/// A `sample_size` of zero disables replay: every reward updates the tables
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReplayConfig {
    /// Transitions drawn per replayed batch.
    pub sample_size: usize,
    /// Minimum buffered transitions of an agent before any batch is drawn.
    pub threshold: usize,
    /// New transitions between two consecutive batches.
    pub interval: usize,
}

impl ReplayConfig {
    pub fn is_enabled(&self) -> bool {
        self.sample_size > 0
    }
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            sample_size: 0,
            threshold: 32,
            interval: 8,
        }
    }
}

/// Learning-rule settings for the value tables.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LearnerConfig {
    /// Learning rate α, `0 < α ≤ 1`.
    pub alpha: f64,
    /// Discount factor γ, `0 ≤ γ < 1`.
    pub gamma: f64,
    /// Maintain optimistic upper-bound tables (interval Q-learning).
    pub interval: bool,
    /// One table set shared by all agents instead of one per agent.
    pub shared_tables: bool,
    pub replay: ReplayConfig,
}

impl LearnerConfig {
    /// Geometric-series bound `1 / (1 - γ)` on the return of rewards in `[0, 1]`.
    pub fn upper_bound(&self) -> f64 {
        1.0 / (1.0 - self.gamma)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(ConfigError::InvalidLearningRate(self.alpha));
        }
        if !(self.gamma >= 0.0 && self.gamma < 1.0) {
            return Err(ConfigError::InvalidDiscount(self.gamma));
        }
        if self.replay.is_enabled() && self.replay.threshold == 0 {
            return Err(ConfigError::InvalidReplayThreshold);
        }
        Ok(())
    }
}

impl Default for LearnerConfig {
    fn default() -> Self {
        Self {
            alpha: 0.1,
            gamma: 0.9,
            interval: false,
            shared_tables: false,
            replay: ReplayConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = LearnerConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(!cfg.replay.is_enabled());
    }

    #[test]
    fn upper_bound_is_geometric_series() {
        let cfg = LearnerConfig {
            gamma: 0.75,
            ..LearnerConfig::default()
        };
        assert!((cfg.upper_bound() - 4.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_learning_rate() {
        for alpha in [0.0, -0.5, 1.5, f64::NAN] {
            let cfg = LearnerConfig {
                alpha,
                ..LearnerConfig::default()
            };
            assert!(matches!(
                cfg.validate(),
                Err(ConfigError::InvalidLearningRate(_))
            ));
        }
        let cfg = LearnerConfig {
            alpha: 1.0,
            ..LearnerConfig::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_discount() {
        for gamma in [1.0, -0.1] {
            let cfg = LearnerConfig {
                gamma,
                ..LearnerConfig::default()
            };
            assert_eq!(cfg.validate(), Err(ConfigError::InvalidDiscount(gamma)));
        }
    }

    #[test]
    fn rejects_zero_threshold_with_replay() {
        let cfg = LearnerConfig {
            replay: ReplayConfig {
                sample_size: 4,
                threshold: 0,
                interval: 1,
            },
            ..LearnerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidReplayThreshold));
    }

    #[test]
    fn error_display() {
        assert_eq!(
            ConfigError::InvalidDiscount(1.0).to_string(),
            "Discount factor must be in [0, 1), got 1"
        );
    }
}
