use thiserror::Error;

use crate::algorithms::qlearning::ConfigError;
use crate::index::IndexError;

/// Internal failures of a policy call.
///
/// The host-facing calls never return these; they are logged and the call is
/// answered with a safe default.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Station index has not been built; no station list was seen yet")]
    StationsNotIndexed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_error_is_transparent() {
        let e: PolicyError = IndexError::UnknownStation("S9".into()).into();
        assert_eq!(
            e.to_string(),
            "Station `S9` is not part of the canonical ordering"
        );
    }

    #[test]
    fn stations_not_indexed_display() {
        assert_eq!(
            PolicyError::StationsNotIndexed.to_string(),
            "Station index has not been built; no station list was seen yet"
        );
    }
}
