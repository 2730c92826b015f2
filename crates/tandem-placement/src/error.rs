//! Error types for tandem-placement.

use tandem_namespace::NamespaceError;
use thiserror::Error;

/// Result type for placement operations.
pub type Result<T> = std::result::Result<T, PlacementError>;

/// Errors that can occur while choosing targets.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlacementError {
    /// A metadata call failed while resolving colocation candidates.
    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(#[from] NamespaceError),

    /// The operation has no definition for this policy.
    #[error("operation not implemented: {0}")]
    NotImplemented(&'static str),

    /// A group root was requested for a path outside every group.
    #[error("path is not in a managed group: {0}")]
    NotManaged(String),

    /// A placement operation ran before `initialize`.
    #[error("placement policy used before initialize")]
    NotInitialized,

    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),
}
