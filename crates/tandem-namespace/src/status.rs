//! Metadata records.

/// Status of a file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Absolute, normalized path.
    pub path: String,
    /// Length in bytes (0 for directories).
    pub len: u64,
    /// Whether this is a directory.
    pub is_dir: bool,
    /// Block size the file was created with.
    pub block_size: u64,
    /// Target replication of the file.
    pub replication: u16,
}

impl FileStatus {
    /// Status record for a directory.
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            len: 0,
            is_dir: true,
            block_size: 0,
            replication: 0,
        }
    }
}

/// Replica locations of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocation {
    /// Byte offset of the block within its file.
    pub offset: u64,
    /// Block length in bytes.
    pub length: u64,
    /// `host:port` of each replica.
    pub hosts: Vec<String>,
    /// Topology path (`/rack/host:port`) of each replica.
    pub topology_paths: Vec<String>,
}

impl BlockLocation {
    /// Build a location from replica topology paths. Host names are the
    /// last component of each path.
    pub fn new(offset: u64, length: u64, topology_paths: Vec<String>) -> Self {
        let hosts = topology_paths
            .iter()
            .map(|p| p.rsplit('/').next().unwrap_or_default().to_string())
            .collect();
        Self {
            offset,
            length,
            hosts,
            topology_paths,
        }
    }
}

/// Normalize an absolute path: collapse repeated slashes and drop a
/// trailing slash. Returns `None` for relative paths.
pub fn normalize_path(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return None;
    }
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Some("/".to_string());
    }
    Some(format!("/{}", segments.join("/")))
}

/// Parent of a normalized path. The root has no parent.
pub fn parent_of(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}
