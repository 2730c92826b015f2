//! Error types for tandem-topology.

use thiserror::Error;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;

/// Errors raised while building the node map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// The topology path or network location is malformed.
    #[error("invalid network location: {0}")]
    InvalidLocation(String),

    /// A node with the same topology path is already registered.
    #[error("duplicate node: {0}")]
    DuplicateNode(String),
}
