//! Learning and forecasting engines behind the station policy.

pub mod qlearning;
pub mod simulation;

pub use qlearning::{EvaluationMode, LearnerConfig, QLearner};
pub use simulation::{QueueSimulator, TargetScorer};
