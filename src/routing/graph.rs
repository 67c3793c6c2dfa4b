//! Traversable station-type graph with distance and reachability queries.

use std::collections::HashMap;

use petgraph::algo::{dijkstra, has_path_connecting};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Bfs;

use crate::scenario::StationType;
use crate::Time;

/// Directed graph of station types whose arcs are the traversable directions
/// of the declared place edges.
///
/// A place edge declared on `a` towards `b` contributes the arc `a → b` when
/// `outgoing || !incoming` and the arc `b → a` when `incoming || !outgoing`.
/// Parallel arcs collapse to the lightest one.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    graph: DiGraph<String, u32>,
    node_by_name: HashMap<String, NodeIndex>,
}

impl TypeGraph {
    pub fn new<'a>(station_types: impl IntoIterator<Item = &'a StationType>) -> Self {
        let types: Vec<&StationType> = station_types.into_iter().collect();
        let mut graph = DiGraph::new();
        let mut node_by_name = HashMap::new();

        for st in &types {
            let node = graph.add_node(st.name.clone());
            node_by_name.insert(st.name.clone(), node);
        }

        let mut tg = Self {
            graph,
            node_by_name,
        };

        for st in &types {
            for edge in &st.place_edges {
                let (Some(&from), Some(&to)) =
                    (tg.node_by_name.get(&st.name), tg.node_by_name.get(&edge.to))
                else {
                    continue;
                };
                if edge.direction.allows_forward() {
                    tg.add_arc(from, to, edge.weight);
                }
                if edge.direction.allows_backward() {
                    tg.add_arc(to, from, edge.weight);
                }
            }
        }

        tg
    }

    fn add_arc(&mut self, from: NodeIndex, to: NodeIndex, weight: u32) {
        match self.graph.find_edge(from, to) {
            Some(existing) => {
                if weight < self.graph[existing] {
                    self.graph[existing] = weight;
                }
            }
            None => {
                self.graph.add_edge(from, to, weight);
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn node(&self, name: &str) -> Option<NodeIndex> {
        self.node_by_name.get(name).copied()
    }

    /// Shortest weighted distance from `from` to `to`.
    ///
    /// Returns `Some(0)` for `from == to` and `None` when no path exists or a
    /// name is unknown.
    pub fn distance(&self, from: &str, to: &str) -> Option<Time> {
        let (start, goal) = (self.node(from)?, self.node(to)?);
        let costs = dijkstra(&self.graph, start, Some(goal), |e| *e.weight() as Time);
        costs.get(&goal).copied()
    }

    /// Weight-free reachability. A type always reaches itself.
    pub fn can_reach_transitive(&self, from: &str, to: &str) -> bool {
        match (self.node(from), self.node(to)) {
            (Some(a), Some(b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// Reachability that refuses one-way moves skipping unrecoverable types.
    ///
    /// Holds when `to` is reachable and either `from` is reachable back from
    /// `to`, or every intermediate type discovered by the breadth-first search
    /// before `to` can itself reach `from`. Discovery order decides what counts
    /// as intermediate, so the test is conservative rather than exact.
    pub fn can_reach_transitive_without_skip(&self, from: &str, to: &str) -> bool {
        let (Some(a), Some(b)) = (self.node(from), self.node(to)) else {
            return false;
        };
        if !has_path_connecting(&self.graph, a, b, None) {
            return false;
        }
        if has_path_connecting(&self.graph, b, a, None) {
            return true;
        }

        let mut intermediates = Vec::new();
        let mut bfs = Bfs::new(&self.graph, a);
        while let Some(node) = bfs.next(&self.graph) {
            if node == b {
                break;
            }
            if node != a {
                intermediates.push(node);
            }
        }

        intermediates
            .into_iter()
            .all(|node| has_path_connecting(&self.graph, node, a, None))
    }
}
