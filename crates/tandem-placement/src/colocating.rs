//! The colocating placement façade.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tandem_namespace::{MetadataConnector, MetadataService};
use tandem_topology::{ClusterStats, ClusterTopology, Datanode};
use tracing::{debug, info};

use crate::{
    compose_targets, Block, BlockPlacementPolicy, ColocationResolver, LocatedBlock, PathClassifier,
    PlacementConfig, PlacementError, PlacementRequest, RackAwarePolicy, Result,
};

struct Bound {
    config: PlacementConfig,
    classifier: PathClassifier,
    topology: Arc<dyn ClusterTopology>,
}

/// Places blocks of grouped files next to the same-index blocks of their
/// siblings, and hands everything else to a fallback policy.
///
/// The metadata service is connected on first use and then kept for the
/// lifetime of the policy. Concurrent first uses race to connect; the first
/// successful connection wins and the others are discarded.
pub struct ColocatingPolicy<P = RackAwarePolicy> {
    fallback: P,
    connector: Arc<dyn MetadataConnector>,
    bound: Option<Bound>,
    metadata: OnceCell<Arc<dyn MetadataService>>,
}

impl ColocatingPolicy<RackAwarePolicy> {
    /// Colocating policy over a [`RackAwarePolicy`] fallback.
    pub fn with_connector(connector: Arc<dyn MetadataConnector>) -> Self {
        Self::new(RackAwarePolicy::new(), connector)
    }
}

impl<P: BlockPlacementPolicy> ColocatingPolicy<P> {
    /// Colocating policy over an arbitrary fallback.
    pub fn new(fallback: P, connector: Arc<dyn MetadataConnector>) -> Self {
        Self {
            fallback,
            connector,
            bound: None,
            metadata: OnceCell::new(),
        }
    }

    fn bound(&self) -> Result<&Bound> {
        self.bound.as_ref().ok_or(PlacementError::NotInitialized)
    }

    fn metadata(&self, bound: &Bound) -> Result<&Arc<dyn MetadataService>> {
        let endpoint = bound.config.metadata_endpoint.as_str();
        let metadata = self
            .metadata
            .get_or_try_init(|| self.connector.connect(endpoint))?;
        Ok(metadata)
    }

    /// Nodes holding the siblings' blocks at the index the next block of
    /// `path` will occupy. Order is unspecified.
    ///
    /// Unmanaged paths never touch the metadata service.
    pub fn resolve_candidates(&self, path: &str) -> Result<Vec<Datanode>> {
        let bound = self.bound()?;
        if !bound.classifier.is_managed(path) {
            return Ok(Vec::new());
        }
        let metadata = self.metadata(bound)?;
        ColocationResolver::new(&bound.classifier, metadata.as_ref(), bound.topology.as_ref())
            .resolve_candidates(path)
    }
}

impl<P: BlockPlacementPolicy> BlockPlacementPolicy for ColocatingPolicy<P> {
    fn initialize(
        &mut self,
        config: &PlacementConfig,
        stats: Arc<dyn ClusterStats>,
        topology: Arc<dyn ClusterTopology>,
    ) -> Result<()> {
        config.validate()?;
        self.fallback.initialize(config, stats, Arc::clone(&topology))?;
        self.bound = Some(Bound {
            config: config.clone(),
            classifier: PathClassifier::new(config.managed_segment.clone()),
            topology,
        });
        self.metadata = OnceCell::new();
        info!(
            segment = %config.managed_segment,
            endpoint = %config.metadata_endpoint,
            "colocating placement initialized"
        );
        Ok(())
    }

    /// Colocated candidates first, then the caller's chosen nodes, cut to
    /// `num_replicas`. Without candidates the request goes to the fallback
    /// unchanged.
    fn choose_target(&self, request: &PlacementRequest<'_>) -> Result<Vec<Datanode>> {
        let candidates = self.resolve_candidates(request.src_path)?;
        if candidates.is_empty() {
            debug!(path = request.src_path, "no colocation candidates, using fallback");
            return self.fallback.choose_target(request);
        }

        let targets = compose_targets(candidates, request.chosen_nodes, request.num_replicas);
        debug!(
            path = request.src_path,
            targets = ?targets.iter().map(Datanode::topology_path).collect::<Vec<_>>(),
            "colocated targets chosen"
        );
        Ok(targets)
    }

    fn verify_block_placement(&self, src_path: &str, block: &LocatedBlock, min_racks: usize) -> Result<usize> {
        self.fallback.verify_block_placement(src_path, block, min_racks)
    }

    fn choose_replica_to_delete(
        &self,
        _src_path: &str,
        _block: &Block,
        _replication: u16,
        _existing: &[Datanode],
        _more_existing: &[Datanode],
    ) -> Result<Option<Datanode>> {
        Err(PlacementError::NotImplemented("choose_replica_to_delete"))
    }
}
