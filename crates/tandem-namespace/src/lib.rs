//! Tandem Namespace
//!
//! Read access to filesystem metadata: file status, directory listings and
//! per-block replica locations.
//!
//! # Design
//!
//! Placement never reads file data. It only needs to know which files
//! exist, how many blocks each one has, and which nodes hold each block.
//! [`MetadataService`] is that contract. [`MetadataConnector`] produces a
//! service from an endpoint string so that hosts can defer connecting
//! until the first placement request actually needs metadata.
//!
//! [`InMemoryNamespace`] is a complete, thread-safe implementation used by
//! tests and the simulator.

mod connector;
mod error;
mod memory;
mod status;

use std::sync::Arc;

pub use connector::StaticConnector;
pub use error::{NamespaceError, Result};
pub use memory::InMemoryNamespace;
pub use status::{normalize_path, parent_of, BlockLocation, FileStatus};

/// Filesystem metadata queries.
pub trait MetadataService: Send + Sync {
    /// Status of a single path.
    fn file_status(&self, path: &str) -> Result<FileStatus>;

    /// Entries directly inside a directory.
    fn list_status(&self, dir: &str) -> Result<Vec<FileStatus>>;

    /// Blocks of `file` overlapping the byte range `[start, start + len)`,
    /// in file order.
    fn block_locations(&self, file: &FileStatus, start: u64, len: u64) -> Result<Vec<BlockLocation>>;
}

/// Factory for metadata services.
pub trait MetadataConnector: Send + Sync {
    /// Connect to the metadata service at `endpoint`.
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn MetadataService>>;
}
