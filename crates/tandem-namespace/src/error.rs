//! Error types for tandem-namespace.

use thiserror::Error;

/// Result type for namespace operations.
pub type Result<T> = std::result::Result<T, NamespaceError>;

/// Errors that can occur while reading or mutating metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NamespaceError {
    /// No such file or directory.
    #[error("not found: {0}")]
    NotFound(String),

    /// A directory operation was applied to a file.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The path is already taken.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The path is not absolute or otherwise malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// The metadata service could not be reached.
    #[error("metadata service unavailable: {0}")]
    Unavailable(String),
}
