//! Configuration for the station policy.

use std::path::PathBuf;

use crate::algorithms::qlearning::{ConfigError, EvaluationMode, LearnerConfig};

use super::exploration::ExplorationSchedule;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// When and how the policy explores.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExplorationConfig {
    pub schedule: ExplorationSchedule,
    /// Scoring used for exploring rounds in interval mode.
    pub explore_mode: EvaluationMode,
}

impl Default for ExplorationConfig {
    fn default() -> Self {
        Self {
            schedule: ExplorationSchedule::default(),
            explore_mode: EvaluationMode::ExploreActionElimination,
        }
    }
}

/// Periodic dump of the value tables at run boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExportConfig {
    pub directory: PathBuf,
    /// Export whenever the run counter is a multiple of this.
    pub every_runs: u32,
}

/// Configuration of a [`StationPolicy`](super::StationPolicy).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolicyConfig {
    pub learner: LearnerConfig,
    pub exploration: ExplorationConfig,
    /// Runs aggregated by the visit statistics; `None` keeps every run.
    pub statistics_window: Option<usize>,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Only honoured in interval mode.
    pub export: Option<ExportConfig>,
}

impl PolicyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.learner.validate()?;
        self.exploration.schedule.validate()?;
        if self.statistics_window == Some(0) {
            return Err(ConfigError::InvalidStatisticsWindow);
        }
        if let Some(export) = &self.export {
            if export.every_runs == 0 {
                return Err(ConfigError::InvalidExportPeriod);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = PolicyConfig::default();
        assert!(cfg.validate().is_ok());
        assert!(cfg.export.is_none());
        assert_eq!(
            cfg.exploration.explore_mode,
            EvaluationMode::ExploreActionElimination
        );
    }

    #[test]
    fn rejects_empty_statistics_window() {
        let cfg = PolicyConfig {
            statistics_window: Some(0),
            ..PolicyConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidStatisticsWindow));
    }

    #[test]
    fn rejects_zero_export_period() {
        let cfg = PolicyConfig {
            export: Some(ExportConfig {
                directory: PathBuf::from("tables"),
                every_runs: 0,
            }),
            ..PolicyConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidExportPeriod));
    }

    #[test]
    fn learner_errors_surface() {
        let cfg = PolicyConfig {
            learner: LearnerConfig {
                alpha: 0.0,
                ..LearnerConfig::default()
            },
            ..PolicyConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidLearningRate(0.0)));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_roundtrip() {
        let cfg = PolicyConfig {
            seed: Some(7),
            statistics_window: Some(3),
            export: Some(ExportConfig {
                directory: PathBuf::from("out"),
                every_runs: 10,
            }),
            ..PolicyConfig::default()
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: PolicyConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
