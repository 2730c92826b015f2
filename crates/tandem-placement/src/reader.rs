//! Metadata reads needed for colocation.

use std::collections::HashSet;

use tandem_namespace::{FileStatus, MetadataService};
use tracing::debug;

use crate::Result;

/// Replica node identifiers for each block of a file, in block order.
pub type BlockMap = Vec<HashSet<String>>;

/// Reads group and block metadata through a [`MetadataService`].
#[derive(Clone, Copy)]
pub struct GroupMetadataReader<'a> {
    metadata: &'a dyn MetadataService,
}

impl<'a> GroupMetadataReader<'a> {
    /// Reader backed by `metadata`.
    pub fn new(metadata: &'a dyn MetadataService) -> Self {
        Self { metadata }
    }

    /// Block map of one file across its whole byte range.
    pub fn block_locations_of(&self, file: &FileStatus) -> Result<BlockMap> {
        let locations = self.metadata.block_locations(file, 0, u64::MAX)?;
        Ok(locations
            .into_iter()
            .map(|location| location.topology_paths.into_iter().collect())
            .collect())
    }

    /// Index the next block of `path` will occupy, i.e. its current block
    /// count.
    ///
    /// Any metadata failure, including a file that does not exist yet,
    /// yields 0: the write is treated as the file's first block.
    pub fn next_block_index(&self, path: &str) -> usize {
        let count = self
            .metadata
            .file_status(path)
            .and_then(|status| self.metadata.block_locations(&status, 0, u64::MAX))
            .map(|locations| locations.len());
        match count {
            Ok(count) => count,
            Err(err) => {
                debug!(path, error = %err, "block count unavailable, assuming first block");
                0
            }
        }
    }

    /// Files directly inside `group_root`. Subdirectories are skipped.
    pub fn list_group_members(&self, group_root: &str) -> Result<Vec<FileStatus>> {
        let entries = self.metadata.list_status(group_root)?;
        Ok(entries.into_iter().filter(|entry| !entry.is_dir).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlacementError;
    use tandem_namespace::{InMemoryNamespace, NamespaceError};

    fn namespace_with_blocks(path: &str, blocks: usize) -> InMemoryNamespace {
        let ns = InMemoryNamespace::new();
        ns.create_file(path, 64, 3).unwrap();
        for i in 0..blocks {
            ns.append_block(path, vec![format!("/rack1/n{i}:1"), format!("/rack2/n{i}:1")])
                .unwrap();
        }
        ns
    }

    #[test]
    fn next_index_of_missing_file_is_zero() {
        let ns = InMemoryNamespace::new();
        assert_eq!(GroupMetadataReader::new(&ns).next_block_index("/managed/g/a"), 0);
    }

    #[test]
    fn next_index_is_block_count() {
        for blocks in [0, 1, 7] {
            let ns = namespace_with_blocks("/managed/g/a", blocks);
            assert_eq!(
                GroupMetadataReader::new(&ns).next_block_index("/managed/g/a"),
                blocks
            );
        }
    }

    #[test]
    fn block_map_collects_topology_paths() {
        let ns = namespace_with_blocks("/managed/g/a", 2);
        let status = ns.file_status("/managed/g/a").unwrap();
        let map = GroupMetadataReader::new(&ns).block_locations_of(&status).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(
            map[1],
            HashSet::from(["/rack1/n1:1".to_string(), "/rack2/n1:1".to_string()])
        );
    }

    #[test]
    fn block_map_of_missing_file_fails() {
        let ns = InMemoryNamespace::new();
        let ghost = FileStatus {
            path: "/managed/g/ghost".into(),
            len: 0,
            is_dir: false,
            block_size: 64,
            replication: 3,
        };
        assert_eq!(
            GroupMetadataReader::new(&ns).block_locations_of(&ghost),
            Err(PlacementError::MetadataUnavailable(NamespaceError::NotFound(
                "/managed/g/ghost".into()
            )))
        );
    }

    #[test]
    fn members_exclude_subdirectories() {
        let ns = InMemoryNamespace::new();
        ns.create_file("/managed/g/a", 64, 3).unwrap();
        ns.create_file("/managed/g/b", 64, 3).unwrap();
        ns.create_file("/managed/g/nested/c", 64, 3).unwrap();

        let members: Vec<_> = GroupMetadataReader::new(&ns)
            .list_group_members("/managed/g/")
            .unwrap()
            .into_iter()
            .map(|m| m.path)
            .collect();
        assert_eq!(members, vec!["/managed/g/a", "/managed/g/b"]);
    }

    #[test]
    fn listing_missing_group_fails() {
        let ns = InMemoryNamespace::new();
        assert!(matches!(
            GroupMetadataReader::new(&ns).list_group_members("/managed/none/"),
            Err(PlacementError::MetadataUnavailable(_))
        ));
    }
}
