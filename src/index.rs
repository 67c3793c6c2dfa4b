//! Canonical integer indices for stations and agents.
//!
//! Tables, buffers, statistics and the simulator are keyed by these indices
//! instead of by object identity. The station ordering is lexicographic by
//! name, established once from the first station list the policy sees and
//! never re-permuted afterwards.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::scenario::{Agent, Scenario, Station};
use crate::Time;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position of a station in the canonical ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationIdx(pub usize);

/// Stable index assigned to an agent the first time it is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentIdx(pub usize);

impl fmt::Display for StationIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

impl fmt::Display for AgentIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    #[error("Station list is empty")]
    NoStations,

    #[error("Station `{station}` has unknown type `{station_type}`")]
    UnknownStationType {
        station: String,
        station_type: String,
    },

    #[error("Agent `{agent}` has unknown type `{agent_type}`")]
    UnknownAgentType { agent: String, agent_type: String },

    #[error("Station `{0}` is not part of the canonical ordering")]
    UnknownStation(String),

    #[error("Station name declared more than once: {0}")]
    DuplicateStation(String),
}

/// Canonical station ordering plus pairwise routing facts.
///
/// # Invariants
///
/// - Indices are dense: `0..len()`
/// - `names` is sorted ascending
/// - The pairwise caches are square `len() × len()`
#[derive(Debug, Clone)]
pub struct StationIndex {
    names: Vec<String>,
    types: Vec<String>,
    space: Vec<Option<u32>>,
    by_name: HashMap<String, StationIdx>,
    distance: Vec<Option<Time>>,
    reachable: Vec<bool>,
    reachable_without_skip: Vec<bool>,
}

impl StationIndex {
    /// Builds the ordering from the host's station list.
    ///
    /// # Errors
    ///
    /// - `NoStations` for an empty list
    /// - `DuplicateStation` when two stations share a name
    /// - `UnknownStationType` when a station's type is not in the scenario
    pub fn new(stations: &[Station], scenario: &Scenario) -> Result<Self, IndexError> {
        if stations.is_empty() {
            return Err(IndexError::NoStations);
        }

        let mut sorted: Vec<&Station> = stations.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        let mut names = Vec::with_capacity(sorted.len());
        let mut types = Vec::with_capacity(sorted.len());
        let mut space = Vec::with_capacity(sorted.len());
        let mut by_name = HashMap::with_capacity(sorted.len());

        for (i, station) in sorted.iter().enumerate() {
            let st = scenario.station_type(&station.station_type).ok_or_else(|| {
                IndexError::UnknownStationType {
                    station: station.name.clone(),
                    station_type: station.station_type.clone(),
                }
            })?;
            if by_name.insert(station.name.clone(), StationIdx(i)).is_some() {
                return Err(IndexError::DuplicateStation(station.name.clone()));
            }
            names.push(station.name.clone());
            types.push(station.station_type.clone());
            space.push(st.attributes.space);
        }

        let n = names.len();
        let graph = scenario.graph();
        let mut distance = Vec::with_capacity(n * n);
        let mut reachable = Vec::with_capacity(n * n);
        let mut reachable_without_skip = Vec::with_capacity(n * n);
        for from in &types {
            for to in &types {
                distance.push(graph.distance(from, to));
                reachable.push(graph.can_reach_transitive(from, to));
                reachable_without_skip.push(graph.can_reach_transitive_without_skip(from, to));
            }
        }

        Ok(Self {
            names,
            types,
            space,
            by_name,
            distance,
            reachable,
            reachable_without_skip,
        })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// All station indices in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = StationIdx> + '_ {
        (0..self.names.len()).map(StationIdx)
    }

    pub fn idx(&self, name: &str) -> Option<StationIdx> {
        self.by_name.get(name).copied()
    }

    /// Like [`idx`](Self::idx) but reports a missing station as an error.
    pub fn require(&self, name: &str) -> Result<StationIdx, IndexError> {
        self.idx(name)
            .ok_or_else(|| IndexError::UnknownStation(name.to_string()))
    }

    pub fn name(&self, station: StationIdx) -> &str {
        &self.names[station.0]
    }

    pub fn station_type(&self, station: StationIdx) -> &str {
        &self.types[station.0]
    }

    /// Declared capacity; `None` means unbounded.
    pub fn space(&self, station: StationIdx) -> Option<u32> {
        self.space[station.0]
    }

    /// Stations sharing the type of `station`.
    pub fn same_type(&self, station: StationIdx) -> impl Iterator<Item = StationIdx> + '_ {
        let ty = self.station_type(station);
        self.iter().filter(move |&s| self.station_type(s) == ty)
    }

    fn cell(&self, from: StationIdx, to: StationIdx) -> usize {
        from.0 * self.names.len() + to.0
    }

    pub fn distance(&self, from: StationIdx, to: StationIdx) -> Option<Time> {
        self.distance[self.cell(from, to)]
    }

    pub fn reachable(&self, from: StationIdx, to: StationIdx) -> bool {
        self.reachable[self.cell(from, to)]
    }

    pub fn reachable_without_skip(&self, from: StationIdx, to: StationIdx) -> bool {
        self.reachable_without_skip[self.cell(from, to)]
    }
}

/// Stable agent indices, assigned in order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    names: Vec<String>,
    types: Vec<String>,
    by_name: HashMap<String, AgentIdx>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the agent's index, registering it on first sight.
    ///
    /// # Errors
    ///
    /// `UnknownAgentType` when the agent's type is not in the scenario.
    pub fn register(&mut self, agent: &Agent, scenario: &Scenario) -> Result<AgentIdx, IndexError> {
        if scenario.agent_type(&agent.agent_type).is_none() {
            return Err(IndexError::UnknownAgentType {
                agent: agent.name.clone(),
                agent_type: agent.agent_type.clone(),
            });
        }
        if let Some(&idx) = self.by_name.get(&agent.name) {
            if self.types[idx.0] != agent.agent_type {
                self.types[idx.0] = agent.agent_type.clone();
            }
            return Ok(idx);
        }
        let idx = AgentIdx(self.names.len());
        self.names.push(agent.name.clone());
        self.types.push(agent.agent_type.clone());
        self.by_name.insert(agent.name.clone(), idx);
        Ok(idx)
    }

    pub fn idx(&self, name: &str) -> Option<AgentIdx> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, agent: AgentIdx) -> &str {
        &self.names[agent.0]
    }

    pub fn agent_type(&self, agent: AgentIdx) -> &str {
        &self.types[agent.0]
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = AgentIdx> {
        (0..self.names.len()).map(AgentIdx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{AgentType, EdgeDirection, PlaceEdge, StationType};

    fn scenario() -> Scenario {
        Scenario::new(
            vec![
                StationType::new("Dock")
                    .with_space(2)
                    .with_place_edge(PlaceEdge::new("Yard", 3, EdgeDirection::OUTGOING)),
                StationType::new("Yard"),
            ],
            vec![AgentType::new("Truck").visiting("Dock").visiting("Yard")],
        )
        .unwrap()
    }

    #[test]
    fn ordering_is_lexicographic() {
        let stations = vec![
            Station::new("zeta", "Yard"),
            Station::new("alpha", "Dock"),
            Station::new("mid", "Dock"),
        ];
        let index = StationIndex::new(&stations, &scenario()).unwrap();
        assert_eq!(index.idx("alpha"), Some(StationIdx(0)));
        assert_eq!(index.idx("mid"), Some(StationIdx(1)));
        assert_eq!(index.idx("zeta"), Some(StationIdx(2)));
        assert_eq!(index.name(StationIdx(2)), "zeta");
    }

    #[test]
    fn caches_routing_facts() {
        let stations = vec![Station::new("S1", "Dock"), Station::new("S2", "Yard")];
        let index = StationIndex::new(&stations, &scenario()).unwrap();
        let (s1, s2) = (StationIdx(0), StationIdx(1));
        assert_eq!(index.distance(s1, s2), Some(3));
        assert_eq!(index.distance(s2, s1), None);
        assert!(index.reachable(s1, s2));
        assert!(!index.reachable(s2, s1));
        assert_eq!(index.space(s1), Some(2));
        assert_eq!(index.space(s2), None);
    }

    #[test]
    fn same_type_lists_siblings() {
        let stations = vec![
            Station::new("d1", "Dock"),
            Station::new("d2", "Dock"),
            Station::new("y1", "Yard"),
        ];
        let index = StationIndex::new(&stations, &scenario()).unwrap();
        let docks: Vec<_> = index.same_type(StationIdx(0)).collect();
        assert_eq!(docks, vec![StationIdx(0), StationIdx(1)]);
    }

    #[test]
    fn rejects_unknown_station_type() {
        let stations = vec![Station::new("S1", "Depot")];
        let err = StationIndex::new(&stations, &scenario()).unwrap_err();
        assert!(matches!(err, IndexError::UnknownStationType { .. }));
    }

    #[test]
    fn rejects_empty_and_duplicate_lists() {
        assert_eq!(
            StationIndex::new(&[], &scenario()).unwrap_err(),
            IndexError::NoStations
        );
        let dup = vec![Station::new("S1", "Dock"), Station::new("S1", "Yard")];
        assert_eq!(
            StationIndex::new(&dup, &scenario()).unwrap_err(),
            IndexError::DuplicateStation("S1".into())
        );
    }

    #[test]
    fn registry_assigns_stable_indices() {
        let sc = scenario();
        let mut registry = AgentRegistry::new();
        let a = registry.register(&Agent::new("b", "Truck"), &sc).unwrap();
        let b = registry.register(&Agent::new("a", "Truck"), &sc).unwrap();
        let again = registry.register(&Agent::new("b", "Truck"), &sc).unwrap();
        assert_eq!(a, AgentIdx(0));
        assert_eq!(b, AgentIdx(1));
        assert_eq!(again, a);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name(b), "a");
    }

    #[test]
    fn registry_rejects_unknown_agent_type() {
        let mut registry = AgentRegistry::new();
        let err = registry
            .register(&Agent::new("x", "Drone"), &scenario())
            .unwrap_err();
        assert!(matches!(err, IndexError::UnknownAgentType { .. }));
    }
}
