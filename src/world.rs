//! Read-only view over the scenario and the canonical indices.

use crate::index::{AgentIdx, AgentRegistry, StationIdx, StationIndex};
use crate::routing::{fill_factor, visit_time};
use crate::scenario::{AgentType, Scenario, StationType};
use crate::{Time, UNBOUNDED_VISIT_TIME};

/// What the policy knows about one agent at decision time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentSnapshot {
    pub agent: AgentIdx,
    /// Host flag: the agent is currently being served at its target.
    pub visiting: bool,
    /// Station the agent was last known to be at.
    pub last_station: Option<StationIdx>,
    /// Communicated target and time of reaching it.
    pub intention: Option<(StationIdx, Time)>,
}

/// Everything the learner, the statistics and the simulator need to know
/// about the static world, resolved to integer indices.
#[derive(Debug, Clone, Copy)]
pub struct World<'a> {
    pub scenario: &'a Scenario,
    pub stations: &'a StationIndex,
    pub agents: &'a AgentRegistry,
}

impl<'a> World<'a> {
    pub fn new(scenario: &'a Scenario, stations: &'a StationIndex, agents: &'a AgentRegistry) -> Self {
        Self {
            scenario,
            stations,
            agents,
        }
    }

    pub fn station_count(&self) -> usize {
        self.stations.len()
    }

    pub fn agent_type(&self, agent: AgentIdx) -> Option<&'a AgentType> {
        self.scenario.agent_type(self.agents.agent_type(agent))
    }

    pub fn station_type(&self, station: StationIdx) -> Option<&'a StationType> {
        self.scenario.station_type(self.stations.station_type(station))
    }

    /// Visit duration of `agent` at `station`.
    pub fn visit_time(&self, agent: AgentIdx, station: StationIdx) -> Time {
        match (self.agent_type(agent), self.station_type(station)) {
            (Some(at), Some(st)) => visit_time(at, st),
            _ => UNBOUNDED_VISIT_TIME,
        }
    }

    /// Station space `agent` consumes at `station`.
    pub fn fill(&self, agent: AgentIdx, station: StationIdx) -> u64 {
        match (self.agent_type(agent), self.station_type(station)) {
            (Some(at), Some(st)) => fill_factor(at, st),
            _ => 1,
        }
    }

    /// Travel distance plus visit time, or `None` when `to` is unreachable.
    pub fn eta(&self, agent: AgentIdx, from: StationIdx, to: StationIdx) -> Option<Time> {
        let distance = self.stations.distance(from, to)?;
        Some(distance.saturating_add(self.visit_time(agent, to)))
    }

    /// Whether the agent's type may visit the station's type.
    pub fn can_visit(&self, agent: AgentIdx, station: StationIdx) -> bool {
        self.scenario.can_visit(
            self.agents.agent_type(agent),
            self.stations.station_type(station),
        )
    }

    /// Stations the agent may visit that are transitively reachable from `from`,
    /// in canonical order.
    pub fn reachable_targets(&self, agent: AgentIdx, from: StationIdx) -> Vec<StationIdx> {
        self.stations
            .iter()
            .filter(|&to| self.stations.reachable(from, to) && self.can_visit(agent, to))
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::two_stations;
    use super::*;

    #[test]
    fn eta_is_distance_plus_visit_time() {
        let fx = two_stations(1);
        let world = fx.world();
        let a = AgentIdx(0);
        assert_eq!(world.eta(a, StationIdx(0), StationIdx(1)), Some(3 + 4));
        assert_eq!(world.eta(a, StationIdx(1), StationIdx(0)), Some(3 + 2));
        assert_eq!(world.eta(a, StationIdx(0), StationIdx(0)), Some(2));
    }

    #[test]
    fn fill_uses_agent_size() {
        let fx = two_stations(1);
        assert_eq!(fx.world().fill(AgentIdx(0), StationIdx(0)), 1);
    }

    #[test]
    fn reachable_targets_are_canonical() {
        let fx = two_stations(1);
        let targets = fx.world().reachable_targets(AgentIdx(0), StationIdx(1));
        assert_eq!(targets, vec![StationIdx(0), StationIdx(1)]);
    }
}
