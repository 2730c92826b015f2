//! The capability interface hosts program against.

use std::sync::Arc;

use tandem_topology::{ClusterStats, ClusterTopology, Datanode};

use crate::{Block, LocatedBlock, PlacementConfig, PlacementRequest, Result};

/// A block placement policy.
///
/// `initialize` must be called once before any other operation. After
/// that, operations take `&self` and may run concurrently.
pub trait BlockPlacementPolicy: Send + Sync {
    /// Bind the policy to its configuration and cluster.
    fn initialize(
        &mut self,
        config: &PlacementConfig,
        stats: Arc<dyn ClusterStats>,
        topology: Arc<dyn ClusterTopology>,
    ) -> Result<()>;

    /// Choose targets for a new block, in pipeline order.
    ///
    /// The result may be shorter than requested when the cluster cannot
    /// supply enough good targets.
    fn choose_target(&self, request: &PlacementRequest<'_>) -> Result<Vec<Datanode>>;

    /// How many more racks the block's replicas should span. 0 means the
    /// placement is acceptable.
    fn verify_block_placement(&self, src_path: &str, block: &LocatedBlock, min_racks: usize) -> Result<usize>;

    /// Pick the replica to drop when a block is over-replicated.
    ///
    /// `more_existing` holds replicas on racks that have more than one
    /// replica; `existing` holds the rest.
    fn choose_replica_to_delete(
        &self,
        src_path: &str,
        block: &Block,
        replication: u16,
        existing: &[Datanode],
        more_existing: &[Datanode],
    ) -> Result<Option<Datanode>>;
}
