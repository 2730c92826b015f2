//! Thread-safe in-memory namespace.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use crate::{normalize_path, parent_of, BlockLocation, FileStatus, MetadataService, NamespaceError, Result};

#[derive(Debug)]
struct FileEntry {
    block_size: u64,
    replication: u16,
    /// Replica topology paths per block, in write order.
    blocks: Vec<Vec<String>>,
}

#[derive(Debug)]
struct Tree {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, FileEntry>,
}

impl Default for Tree {
    fn default() -> Self {
        Self {
            dirs: BTreeSet::from(["/".to_string()]),
            files: BTreeMap::new(),
        }
    }
}

impl Tree {
    fn status_of(&self, path: &str) -> Option<FileStatus> {
        if let Some(entry) = self.files.get(path) {
            return Some(FileStatus {
                path: path.to_string(),
                len: (entry.blocks.len() as u64).saturating_mul(entry.block_size),
                is_dir: false,
                block_size: entry.block_size,
                replication: entry.replication,
            });
        }
        self.dirs.contains(path).then(|| FileStatus::directory(path))
    }

    fn mkdirs(&mut self, path: &str) -> Result<()> {
        let mut missing = Vec::new();
        let mut cursor = Some(path);
        while let Some(dir) = cursor {
            if self.files.contains_key(dir) {
                return Err(NamespaceError::NotADirectory(dir.to_string()));
            }
            if self.dirs.contains(dir) {
                break;
            }
            missing.push(dir.to_string());
            cursor = parent_of(dir);
        }
        self.dirs.extend(missing);
        Ok(())
    }
}

/// A namespace held entirely in memory.
///
/// Directories are created implicitly when a file is created beneath them.
/// Every block of a file is considered full, so block `i` starts at
/// `i * block_size`.
#[derive(Debug, Default)]
pub struct InMemoryNamespace {
    tree: RwLock<Tree>,
}

fn normalized(path: &str) -> Result<String> {
    normalize_path(path).ok_or_else(|| NamespaceError::InvalidPath(path.to_string()))
}

impl InMemoryNamespace {
    /// Create a namespace containing only the root directory.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a directory and any missing parents.
    pub fn mkdirs(&self, path: &str) -> Result<()> {
        let path = normalized(path)?;
        self.write().mkdirs(&path)
    }

    /// Create an empty file.
    pub fn create_file(&self, path: &str, block_size: u64, replication: u16) -> Result<FileStatus> {
        let path = normalized(path)?;
        if block_size == 0 {
            return Err(NamespaceError::InvalidPath(path));
        }
        let parent = parent_of(&path)
            .map(str::to_string)
            .ok_or_else(|| NamespaceError::InvalidPath(path.clone()))?;

        let mut tree = self.write();
        if tree.status_of(&path).is_some() {
            return Err(NamespaceError::AlreadyExists(path));
        }
        tree.mkdirs(&parent)?;
        tree.files.insert(
            path.clone(),
            FileEntry {
                block_size,
                replication,
                blocks: Vec::new(),
            },
        );
        trace!(%path, block_size, "created file");
        tree.status_of(&path).ok_or(NamespaceError::NotFound(path))
    }

    /// Append a block held by the given replicas. Returns the block's index.
    pub fn append_block(&self, path: &str, replicas: Vec<String>) -> Result<usize> {
        let path = normalized(path)?;
        let mut tree = self.write();
        if tree.dirs.contains(&path) {
            return Err(NamespaceError::InvalidPath(path));
        }
        let entry = tree
            .files
            .get_mut(&path)
            .ok_or_else(|| NamespaceError::NotFound(path.clone()))?;
        entry.blocks.push(replicas);
        let index = entry.blocks.len() - 1;
        trace!(%path, index, "appended block");
        Ok(index)
    }

    /// Delete a file, or a directory and everything under it.
    pub fn delete(&self, path: &str) -> Result<()> {
        let path = normalized(path)?;
        if path == "/" {
            return Err(NamespaceError::InvalidPath(path));
        }
        let mut tree = self.write();
        if tree.files.remove(&path).is_some() {
            return Ok(());
        }
        if !tree.dirs.remove(&path) {
            return Err(NamespaceError::NotFound(path));
        }
        let prefix = format!("{path}/");
        tree.dirs.retain(|d| !d.starts_with(&prefix));
        tree.files.retain(|f, _| !f.starts_with(&prefix));
        Ok(())
    }
}

impl MetadataService for InMemoryNamespace {
    fn file_status(&self, path: &str) -> Result<FileStatus> {
        let path = normalized(path)?;
        self.read()
            .status_of(&path)
            .ok_or(NamespaceError::NotFound(path))
    }

    fn list_status(&self, dir: &str) -> Result<Vec<FileStatus>> {
        let dir = normalized(dir)?;
        let tree = self.read();
        if tree.files.contains_key(&dir) {
            return Err(NamespaceError::NotADirectory(dir));
        }
        if !tree.dirs.contains(&dir) {
            return Err(NamespaceError::NotFound(dir));
        }

        let children = tree
            .dirs
            .iter()
            .chain(tree.files.keys())
            .filter(|p| p.as_str() != "/" && parent_of(p) == Some(dir.as_str()));
        let mut entries: Vec<FileStatus> = children.filter_map(|p| tree.status_of(p)).collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn block_locations(&self, file: &FileStatus, start: u64, len: u64) -> Result<Vec<BlockLocation>> {
        let path = normalized(&file.path)?;
        let tree = self.read();
        if tree.dirs.contains(&path) {
            return Ok(Vec::new());
        }
        let entry = tree
            .files
            .get(&path)
            .ok_or_else(|| NamespaceError::NotFound(path.clone()))?;

        let end = start.saturating_add(len);
        let size = entry.block_size;
        let locations = entry
            .blocks
            .iter()
            .enumerate()
            .map(|(i, replicas)| ((i as u64).saturating_mul(size), replicas))
            .filter(|(offset, _)| *offset < end && offset.saturating_add(size) > start)
            .map(|(offset, replicas)| BlockLocation::new(offset, size, replicas.clone()))
            .collect();
        Ok(locations)
    }
}
