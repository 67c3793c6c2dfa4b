//! Visit duration, station fill and estimated time of arrival.

use crate::scenario::{AgentType, StationType};
use crate::{Time, UNBOUNDED_VISIT_TIME};

use super::TypeGraph;

/// `min(agent.time, station.time)`, where an unset side does not cap the other.
///
/// Both unset yields [`UNBOUNDED_VISIT_TIME`].
pub fn visit_time(agent: &AgentType, station: &StationType) -> Time {
    match (agent.attributes.time, station.attributes.time) {
        (Some(a), Some(s)) => a.min(s) as Time,
        (Some(t), None) | (None, Some(t)) => t as Time,
        (None, None) => UNBOUNDED_VISIT_TIME,
    }
}

/// Station space one agent consumes once admitted.
///
/// The agent's declared size, else the station's declared space, else 1.
pub fn fill_factor(agent: &AgentType, station: &StationType) -> u64 {
    agent
        .attributes
        .size
        .or(station.attributes.space)
        .map(u64::from)
        .unwrap_or(1)
}

/// `distance(source, target) + visit_time(agent, target)`, or `None` when the
/// target is unreachable.
pub fn eta(
    graph: &TypeGraph,
    agent: &AgentType,
    source: &StationType,
    target: &StationType,
) -> Option<Time> {
    let distance = graph.distance(&source.name, &target.name)?;
    Some(distance.saturating_add(visit_time(agent, target)))
}
