//! Host-facing decision policy.
//!
//! [`StationPolicy`] implements [`StationStrategy`]: it answers the host's
//! per-candidate `evaluate` calls with learned scores filtered by hard
//! constraints, records the communicated choice, and learns from the
//! subsequent `reward`. All mutable state lives in a caller-owned
//! [`PolicyState`].
//!
//! Runs are not announced by the host. A new run is detected when host time
//! goes back to 1 after later times were seen; at that point replay buffers
//! are drained into the tables, the visit statistics close an iteration and
//! per-run bookkeeping is reset.

pub mod config;
pub mod error;
pub mod exploration;
mod forecast;
pub mod state;
pub mod station;
pub mod trait_;


pub use config::{ExplorationConfig, ExportConfig, PolicyConfig};
pub use error::PolicyError;
pub use exploration::ExplorationSchedule;
pub use state::{PendingDecision, PolicyState};
pub use station::{StationPolicy, NEVER};
pub use trait_::{DecisionInput, StationStrategy};
