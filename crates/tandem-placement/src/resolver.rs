//! Candidate nodes from sibling block locations.

use std::collections::HashSet;

use tandem_namespace::{FileStatus, MetadataService};
use tandem_topology::{ClusterTopology, Datanode};
use tracing::{debug, trace};

use crate::{GroupMetadataReader, PathClassifier, Result};

/// Finds the nodes holding block `i` of a file's siblings.
pub struct ColocationResolver<'a> {
    classifier: &'a PathClassifier,
    reader: GroupMetadataReader<'a>,
    topology: &'a dyn ClusterTopology,
}

impl<'a> ColocationResolver<'a> {
    /// Resolver over the given collaborators.
    pub fn new(
        classifier: &'a PathClassifier,
        metadata: &'a dyn MetadataService,
        topology: &'a dyn ClusterTopology,
    ) -> Self {
        Self {
            classifier,
            reader: GroupMetadataReader::new(metadata),
            topology,
        }
    }

    /// Live nodes holding, in any sibling, the block at the index the next
    /// block of `target_path` will take.
    ///
    /// Unmanaged paths yield no candidates. A failed listing or block map
    /// read fails the whole resolution; partial results are never returned.
    /// The order of the returned nodes is unspecified.
    pub fn resolve_candidates(&self, target_path: &str) -> Result<Vec<Datanode>> {
        if !self.classifier.is_managed(target_path) {
            return Ok(Vec::new());
        }
        let group_root = self.classifier.group_root(target_path)?;
        let index = self.reader.next_block_index(target_path);
        let members = self.reader.list_group_members(group_root)?;

        let identifiers = self.colocated_identifiers(&members, index)?;
        let candidates = self.resolve_nodes(identifiers);
        debug!(
            path = target_path,
            group = group_root,
            index,
            siblings = members.len(),
            candidates = candidates.len(),
            "resolved colocation candidates"
        );
        Ok(candidates)
    }

    /// Union of node identifiers at `index` across `members`.
    pub fn colocated_identifiers(&self, members: &[FileStatus], index: usize) -> Result<HashSet<String>> {
        let mut identifiers = HashSet::new();
        for member in members {
            let mut blocks = self.reader.block_locations_of(member)?;
            if index < blocks.len() {
                trace!(sibling = %member.path, index, "sibling has block at index");
                identifiers.extend(blocks.swap_remove(index));
            }
        }
        Ok(identifiers)
    }

    /// Map identifiers to live nodes, dropping the ones the topology does
    /// not know.
    fn resolve_nodes(&self, identifiers: HashSet<String>) -> Vec<Datanode> {
        identifiers
            .into_iter()
            .filter_map(|id| {
                let node = self.topology.resolve_node(&id);
                if node.is_none() {
                    debug!(node = %id, "dropping unresolved colocation candidate");
                }
                node
            })
            .collect()
    }
}
