//! Reachability and distance over the station-type graph.
//!
//! Distances are shortest weighted paths over place edges honouring their
//! direction flags. Reachability ignores weights and is used for feasibility
//! gating, never for cost.

pub mod eta;
mod graph;

pub use eta::{eta, fill_factor, visit_time};
pub use graph::TypeGraph;
