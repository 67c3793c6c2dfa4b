//! Immutable, graph-scoped type definitions.
//!
//! Station types and agent types are produced by an external graph loader.
//! Every numeric attribute is optional: `None` means "not applicable" and is
//! never silently folded into arithmetic.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Direction flags of an edge, relative to the type that declares it.
///
/// Both flags `false` means the edge is undirected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeDirection {
    pub incoming: bool,
    pub outgoing: bool,
}

impl EdgeDirection {
    /// An edge that can be traversed both ways.
    pub const UNDIRECTED: Self = Self {
        incoming: false,
        outgoing: false,
    };

    /// An edge that can only be traversed away from the declaring type.
    pub const OUTGOING: Self = Self {
        incoming: false,
        outgoing: true,
    };

    /// An edge that can only be traversed towards the declaring type.
    pub const INCOMING: Self = Self {
        incoming: true,
        outgoing: false,
    };

    /// Whether the edge may be traversed from the declaring type to its target.
    pub fn allows_forward(&self) -> bool {
        self.outgoing || !self.incoming
    }

    /// Whether the edge may be traversed from its target back to the declaring type.
    pub fn allows_backward(&self) -> bool {
        self.incoming || !self.outgoing
    }
}

/// Weighted spatial connection between two station types.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PlaceEdge {
    pub to: String,
    pub weight: u32,
    pub direction: EdgeDirection,
}

impl PlaceEdge {
    pub fn new(to: impl Into<String>, weight: u32, direction: EdgeDirection) -> Self {
        Self {
            to: to.into(),
            weight,
            direction,
        }
    }
}

/// Temporal ordering edge. Stored for completeness; routing ignores it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeEdge {
    pub to: String,
    pub direction: EdgeDirection,
    pub and_join_in: bool,
    pub and_join_out: bool,
}

/// "May visit" relation between an agent type and a station type.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VisitEdge {
    pub to: String,
}

impl VisitEdge {
    pub fn new(to: impl Into<String>) -> Self {
        Self { to: to.into() }
    }
}

/// Optional numeric attributes shared by station and agent types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Attributes {
    pub frequency: Option<u32>,
    pub necessity: Option<u32>,
    pub cycle: Option<u32>,
    /// Visit duration.
    pub time: Option<u32>,
    /// Space an agent occupies at a station.
    pub size: Option<u32>,
    /// Capacity of a station.
    pub space: Option<u32>,
    pub priority: Option<u32>,
}

/// A kind of station, e.g. "Dock" or "ChargingBay".
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationType {
    pub name: String,
    pub attributes: Attributes,
    pub place_edges: Vec<PlaceEdge>,
    pub time_edges: Vec<TimeEdge>,
    pub visit_edges: Vec<VisitEdge>,
}

impl StationType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::default(),
            place_edges: Vec::new(),
            time_edges: Vec::new(),
            visit_edges: Vec::new(),
        }
    }

    pub fn with_space(mut self, space: u32) -> Self {
        self.attributes.space = Some(space);
        self
    }

    pub fn with_time(mut self, time: u32) -> Self {
        self.attributes.time = Some(time);
        self
    }

    pub fn with_place_edge(mut self, edge: PlaceEdge) -> Self {
        self.place_edges.push(edge);
        self
    }
}

/// A kind of agent, e.g. "Truck".
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AgentType {
    pub name: String,
    pub attributes: Attributes,
    pub time_edges: Vec<TimeEdge>,
    pub visit_edges: Vec<VisitEdge>,
}

impl AgentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::default(),
            time_edges: Vec::new(),
            visit_edges: Vec::new(),
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.attributes.size = Some(size);
        self
    }

    pub fn with_time(mut self, time: u32) -> Self {
        self.attributes.time = Some(time);
        self
    }

    pub fn visiting(mut self, station_type: impl Into<String>) -> Self {
        self.visit_edges.push(VisitEdge::new(station_type));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undirected_edge_allows_both_ways() {
        assert!(EdgeDirection::UNDIRECTED.allows_forward());
        assert!(EdgeDirection::UNDIRECTED.allows_backward());
    }

    #[test]
    fn outgoing_edge_is_one_way() {
        assert!(EdgeDirection::OUTGOING.allows_forward());
        assert!(!EdgeDirection::OUTGOING.allows_backward());
    }

    #[test]
    fn incoming_edge_is_one_way_back() {
        assert!(!EdgeDirection::INCOMING.allows_forward());
        assert!(EdgeDirection::INCOMING.allows_backward());
    }

    #[test]
    fn both_flags_allow_both_ways() {
        let both = EdgeDirection {
            incoming: true,
            outgoing: true,
        };
        assert!(both.allows_forward());
        assert!(both.allows_backward());
    }

    #[test]
    fn builders_set_attributes() {
        let dock = StationType::new("Dock").with_space(2).with_time(4);
        assert_eq!(dock.attributes.space, Some(2));
        assert_eq!(dock.attributes.time, Some(4));
        assert_eq!(dock.attributes.size, None);

        let truck = AgentType::new("Truck").with_size(1).visiting("Dock");
        assert_eq!(truck.attributes.size, Some(1));
        assert_eq!(truck.visit_edges, vec![VisitEdge::new("Dock")]);
    }
}
