//! Static scenario model and the host-owned instances.
//!
//! A [`Scenario`] bundles the station and agent types produced by the external
//! graph loader and precomputes the traversable type graph used for distance
//! and reachability queries.

pub mod error;
pub mod instance;
pub mod types;

use std::collections::{BTreeMap, HashSet};

pub use error::ScenarioError;
pub use instance::{Agent, Communication, Intention, Station};
pub use types::{AgentType, Attributes, EdgeDirection, PlaceEdge, StationType, TimeEdge, VisitEdge};

use crate::routing::TypeGraph;

/// Validated static scenario: types plus the derived routing graph.
///
/// # Invariants
///
/// - Type names are unique across station and agent types
/// - Every edge points at a declared type of the right kind
#[derive(Debug, Clone)]
pub struct Scenario {
    station_types: BTreeMap<String, StationType>,
    agent_types: BTreeMap<String, AgentType>,
    /// (agent type, station type) pairs linked by a visit edge in either direction.
    visits: HashSet<(String, String)>,
    graph: TypeGraph,
}

impl Scenario {
    /// Validates the type definitions and builds the routing graph.
    ///
    /// # Errors
    ///
    /// - `DuplicateType` if a name is declared twice
    /// - `UnknownEdgeTarget` if an edge references an undeclared type
    /// - `PlaceEdgeNotBetweenStations` / `VisitEdgeKindMismatch` for edges of the wrong kind
    pub fn new(
        station_types: Vec<StationType>,
        agent_types: Vec<AgentType>,
    ) -> Result<Self, ScenarioError> {
        let mut stations = BTreeMap::new();
        for st in station_types {
            if stations.contains_key(&st.name) {
                return Err(ScenarioError::DuplicateType(st.name));
            }
            stations.insert(st.name.clone(), st);
        }

        let mut agents = BTreeMap::new();
        for at in agent_types {
            if stations.contains_key(&at.name) || agents.contains_key(&at.name) {
                return Err(ScenarioError::DuplicateType(at.name));
            }
            agents.insert(at.name.clone(), at);
        }

        let known = |name: &str| stations.contains_key(name) || agents.contains_key(name);
        let mut visits = HashSet::new();

        for st in stations.values() {
            for edge in &st.place_edges {
                if !known(&edge.to) {
                    return Err(unknown(&st.name, &edge.to));
                }
                if !stations.contains_key(&edge.to) {
                    return Err(ScenarioError::PlaceEdgeNotBetweenStations {
                        from: st.name.clone(),
                        to: edge.to.clone(),
                    });
                }
            }
            for edge in &st.time_edges {
                if !known(&edge.to) {
                    return Err(unknown(&st.name, &edge.to));
                }
            }
            for edge in &st.visit_edges {
                if !known(&edge.to) {
                    return Err(unknown(&st.name, &edge.to));
                }
                if !agents.contains_key(&edge.to) {
                    return Err(ScenarioError::VisitEdgeKindMismatch {
                        from: st.name.clone(),
                        to: edge.to.clone(),
                    });
                }
                visits.insert((edge.to.clone(), st.name.clone()));
            }
        }

        for at in agents.values() {
            for edge in &at.time_edges {
                if !known(&edge.to) {
                    return Err(unknown(&at.name, &edge.to));
                }
            }
            for edge in &at.visit_edges {
                if !known(&edge.to) {
                    return Err(unknown(&at.name, &edge.to));
                }
                if !stations.contains_key(&edge.to) {
                    return Err(ScenarioError::VisitEdgeKindMismatch {
                        from: at.name.clone(),
                        to: edge.to.clone(),
                    });
                }
                visits.insert((at.name.clone(), edge.to.clone()));
            }
        }

        let graph = TypeGraph::new(stations.values());

        Ok(Self {
            station_types: stations,
            agent_types: agents,
            visits,
            graph,
        })
    }

    pub fn station_type(&self, name: &str) -> Option<&StationType> {
        self.station_types.get(name)
    }

    pub fn agent_type(&self, name: &str) -> Option<&AgentType> {
        self.agent_types.get(name)
    }

    pub fn station_types(&self) -> impl Iterator<Item = &StationType> {
        self.station_types.values()
    }

    pub fn agent_types(&self) -> impl Iterator<Item = &AgentType> {
        self.agent_types.values()
    }

    /// Whether agents of `agent_type` may visit stations of `station_type`.
    pub fn can_visit(&self, agent_type: &str, station_type: &str) -> bool {
        self.visits
            .contains(&(agent_type.to_string(), station_type.to_string()))
    }

    /// The traversable station-type graph.
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }
}

fn unknown(from: &str, to: &str) -> ScenarioError {
    ScenarioError::UnknownEdgeTarget {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dock_and_yard() -> Vec<StationType> {
        vec![
            StationType::new("Dock")
                .with_space(2)
                .with_place_edge(PlaceEdge::new("Yard", 3, EdgeDirection::UNDIRECTED)),
            StationType::new("Yard"),
        ]
    }

    #[test]
    fn builds_valid_scenario() {
        let scenario = Scenario::new(
            dock_and_yard(),
            vec![AgentType::new("Truck").visiting("Dock").visiting("Yard")],
        )
        .unwrap();

        assert!(scenario.station_type("Dock").is_some());
        assert!(scenario.agent_type("Truck").is_some());
        assert!(scenario.can_visit("Truck", "Dock"));
        assert!(!scenario.can_visit("Truck", "Depot"));
    }

    #[test]
    fn visit_edge_declared_on_station_counts() {
        let mut stations = dock_and_yard();
        stations[1].visit_edges.push(VisitEdge::new("Truck"));
        let scenario = Scenario::new(stations, vec![AgentType::new("Truck")]).unwrap();
        assert!(scenario.can_visit("Truck", "Yard"));
        assert!(!scenario.can_visit("Truck", "Dock"));
    }

    #[test]
    fn rejects_duplicate_names() {
        let result = Scenario::new(dock_and_yard(), vec![AgentType::new("Dock")]);
        assert_eq!(result.unwrap_err(), ScenarioError::DuplicateType("Dock".into()));
    }

    #[test]
    fn rejects_unknown_edge_target() {
        let stations = vec![StationType::new("Dock").with_place_edge(PlaceEdge::new(
            "Nowhere",
            1,
            EdgeDirection::UNDIRECTED,
        ))];
        let result = Scenario::new(stations, vec![]);
        assert!(matches!(
            result,
            Err(ScenarioError::UnknownEdgeTarget { .. })
        ));
    }

    #[test]
    fn rejects_place_edge_to_agent_type() {
        let stations = vec![StationType::new("Dock").with_place_edge(PlaceEdge::new(
            "Truck",
            1,
            EdgeDirection::UNDIRECTED,
        ))];
        let result = Scenario::new(stations, vec![AgentType::new("Truck")]);
        assert!(matches!(
            result,
            Err(ScenarioError::PlaceEdgeNotBetweenStations { .. })
        ));
    }

    #[test]
    fn rejects_visit_edge_between_agents() {
        let result = Scenario::new(
            dock_and_yard(),
            vec![AgentType::new("Truck").visiting("Van"), AgentType::new("Van")],
        );
        assert!(matches!(
            result,
            Err(ScenarioError::VisitEdgeKindMismatch { .. })
        ));
    }
}
