//! Host-facing strategy trait.

use crate::scenario::{Agent, Communication, Intention, Station};
use crate::Time;

use super::state::PolicyState;

/// Everything the host passes along with a call.
#[derive(Debug, Clone, Copy)]
pub struct DecisionInput<'a> {
    /// The deciding agent.
    pub agent: &'a Agent,
    /// Every agent of the run with its current intention. May include `agent`.
    pub others: &'a [Communication<'a>],
    /// All stations, in any order.
    pub stations: &'a [Station],
    /// Host time, starting at 1 every run.
    pub time: Time,
}

/// A per-agent station selection strategy.
///
/// The host calls, for one agent and one time unit, `evaluate` once per
/// candidate station, then `communicate` once with its pick, and later
/// `reward` once the outcome of that pick is known.
///
/// Implementations never fail a call: internal errors are logged and the
/// call is answered with a safe default.
pub trait StationStrategy {
    /// Scores `candidate`; higher is better, `-1.0` means "never pick".
    fn evaluate(&self, state: &mut PolicyState, input: &DecisionInput<'_>, candidate: &Station) -> f64;

    /// Final say on the agent's broadcast for this time unit.
    fn communicate(&self, state: &mut PolicyState, input: &DecisionInput<'_>, default: Intention) -> Intention;

    /// Outcome of the last communicated choice, in `[0, 1]`.
    fn reward(&self, state: &mut PolicyState, input: &DecisionInput<'_>, value: f64);

    /// Returns a human-readable name for this strategy.
    fn name(&self) -> &str;
}
