//! Interval Q-learning over station pairs.
//!
//! Every owner (one agent, or all agents when tables are shared) keeps a
//! "free" and a "queued" table indexed by `(source, target)`. The score of a
//! target blends the two by the forecast queue pressure at arrival. In
//! interval mode each table has an optimistic twin that only ever decreases,
//! and the gap between the two drives exploration.

mod config;
mod export;
mod learner;
mod replay;
mod table;
mod tables;

pub use config::{ConfigError, LearnerConfig, ReplayConfig};
pub use export::ExportError;
pub use learner::{QLearner, ScoreRound, TableOwner};
pub use replay::{ReplayBuffer, ReplayKey, Transition};
pub use table::QTable;
pub use tables::{EvaluationMode, UpperBounds, ValueTables};
