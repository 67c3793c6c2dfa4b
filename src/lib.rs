//! qstation - decentralized station scheduling for mobile agents.
//!
//! Each agent independently decides, once per time unit, which capacity-limited
//! station to visit next. Decisions are scored by interval Q-learning tables
//! that distinguish "target is free" from "target is queued", and queue
//! occupancy at the arrival horizon is forecast either from empirical visit
//! statistics or from a forward discrete-event simulation of all agents.
//!
//! The host drives the policy through three synchronous calls exposed by
//! [`policy::StationStrategy`]: `evaluate`, `communicate` and `reward`.

pub mod algorithms;
pub mod index;
pub mod policy;
pub mod routing;
pub mod scenario;
pub mod statistics;
pub mod world;

pub use index::{AgentIdx, AgentRegistry, StationIdx, StationIndex};
pub use policy::{PolicyConfig, PolicyState, StationPolicy, StationStrategy};
pub use scenario::{Agent, Communication, Intention, Scenario, Station};
pub use world::World;

/// Simulation time in host time units. Host time starts at 1 every run.
pub type Time = u64;

/// Visit duration used when neither the agent nor the station declares one.
///
/// Large but finite so that ETA arithmetic stays well defined.
pub const UNBOUNDED_VISIT_TIME: Time = 1_000_000;
