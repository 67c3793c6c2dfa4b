use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("Type name declared more than once: {0}")]
    DuplicateType(String),

    #[error("Edge from `{from}` points to unknown type `{to}`")]
    UnknownEdgeTarget { from: String, to: String },

    #[error("Place edge from `{from}` to `{to}` must connect two station types")]
    PlaceEdgeNotBetweenStations { from: String, to: String },

    #[error("Visit edge from `{from}` to `{to}` must connect an agent type and a station type")]
    VisitEdgeKindMismatch { from: String, to: String },
}
