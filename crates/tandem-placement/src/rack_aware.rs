//! Generic rack-aware allocator.
//!
//! Replica placement follows the usual pipeline shape:
//! 1. the writer, when it is a good target
//! 2. a node on another rack
//! 3. a node on the second replica's rack (or another remote rack when the
//!    first two already share one)
//! 4. anywhere
//!
//! Among eligible nodes the one with the most free space is taken, ties
//! going to the lowest topology path, so selection is deterministic.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tandem_topology::{ClusterStats, ClusterTopology, Datanode};
use tracing::{debug, info, trace, warn};

use crate::{
    Block, BlockPlacementPolicy, FallbackConfig, LocatedBlock, PlacementConfig, PlacementError,
    PlacementRequest, Result,
};

struct Bound {
    config: FallbackConfig,
    stats: Arc<dyn ClusterStats>,
    topology: Arc<dyn ClusterTopology>,
}

/// Rack-aware, capacity-aware default placement.
#[derive(Default)]
pub struct RackAwarePolicy {
    bound: Option<Bound>,
}

impl RackAwarePolicy {
    /// An uninitialized policy.
    pub fn new() -> Self {
        Self::default()
    }

    fn bound(&self) -> Result<&Bound> {
        self.bound.as_ref().ok_or(PlacementError::NotInitialized)
    }
}

/// Working state of one `choose_target` call.
struct Selection<'a> {
    nodes: &'a [Datanode],
    config: FallbackConfig,
    block_size: u64,
    avg_load: f64,
    max_per_rack: usize,
    excluded: HashSet<String>,
    results: Vec<Datanode>,
}

impl Selection<'_> {
    fn is_good_target(&self, node: &Datanode) -> bool {
        if self.excluded.contains(&node.topology_path()) {
            return false;
        }
        let required = self.block_size.saturating_mul(self.config.min_blocks_for_write);
        if node.remaining < required {
            trace!(node = %node, remaining = node.remaining, required, "not enough space");
            return false;
        }
        if self.config.consider_load
            && self.avg_load > 0.0
            && node.xceiver_count as f64 > 2.0 * self.avg_load
        {
            trace!(node = %node, load = node.xceiver_count, "node too busy");
            return false;
        }
        let on_rack = self.results.iter().filter(|r| r.is_on_same_rack(node)).count();
        on_rack < self.max_per_rack
    }

    fn best<F>(&self, filter: F) -> Option<Datanode>
    where
        F: Fn(&Datanode) -> bool,
    {
        self.nodes
            .iter()
            .filter(|n| filter(*n) && self.is_good_target(*n))
            .max_by(|a, b| {
                a.remaining
                    .cmp(&b.remaining)
                    .then_with(|| b.topology_path().cmp(&a.topology_path()))
            })
            .cloned()
    }

    fn choose_local(&self, writer: Option<&Datanode>) -> Option<Datanode> {
        let local = writer.and_then(|w| {
            let path = w.topology_path();
            self.nodes.iter().find(|n| n.topology_path() == path)
        });
        match local {
            Some(local) if self.is_good_target(local) => Some(local.clone()),
            Some(local) => self.choose_local_rack(local),
            None => self.best(|_| true),
        }
    }

    fn choose_local_rack(&self, reference: &Datanode) -> Option<Datanode> {
        self.best(|n| n.is_on_same_rack(reference))
            .or_else(|| self.best(|_| true))
    }

    fn choose_remote_rack(&self, reference: &Datanode) -> Option<Datanode> {
        self.best(|n| !n.is_on_same_rack(reference))
            .or_else(|| self.choose_local_rack(reference))
    }

    fn choose_next(&self, writer: Option<&Datanode>) -> Option<Datanode> {
        match self.results.as_slice() {
            [] => self.choose_local(writer),
            [first] => self.choose_remote_rack(first),
            [first, second] if first.is_on_same_rack(second) => self.choose_remote_rack(first),
            [_, second] => self.choose_local_rack(second),
            _ => self.best(|_| true),
        }
    }
}

impl BlockPlacementPolicy for RackAwarePolicy {
    fn initialize(
        &mut self,
        config: &PlacementConfig,
        stats: Arc<dyn ClusterStats>,
        topology: Arc<dyn ClusterTopology>,
    ) -> Result<()> {
        info!(
            consider_load = config.fallback.consider_load,
            min_blocks_for_write = config.fallback.min_blocks_for_write,
            "rack-aware placement initialized"
        );
        self.bound = Some(Bound {
            config: config.fallback,
            stats,
            topology,
        });
        Ok(())
    }

    fn choose_target(&self, request: &PlacementRequest<'_>) -> Result<Vec<Datanode>> {
        let bound = self.bound()?;
        let chosen = request.chosen_nodes;
        let nodes = bound.topology.nodes();
        if request.num_replicas == 0 || nodes.is_empty() {
            return Ok(if request.return_chosen_nodes {
                chosen.to_vec()
            } else {
                Vec::new()
            });
        }

        let total = request.num_replicas + chosen.len();
        let num_racks = bound.topology.num_racks().max(1);
        let mut excluded = request.excluded_nodes.cloned().unwrap_or_default();
        excluded.extend(chosen.iter().map(Datanode::topology_path));

        let mut selection = Selection {
            nodes: &nodes,
            config: bound.config,
            block_size: request.block_size,
            avg_load: bound.stats.total_load() as f64 / nodes.len() as f64,
            max_per_rack: (total - 1) / num_racks + 2,
            excluded,
            results: chosen.to_vec(),
        };

        for _ in 0..request.num_replicas {
            let Some(node) = selection.choose_next(request.writer) else {
                warn!(
                    path = request.src_path,
                    wanted = request.num_replicas,
                    placed = selection.results.len() - chosen.len(),
                    "not able to place enough replicas"
                );
                break;
            };
            selection.excluded.insert(node.topology_path());
            selection.results.push(node);
        }

        let mut targets = selection.results;
        if !request.return_chosen_nodes {
            targets.drain(..chosen.len());
        }
        debug!(path = request.src_path, targets = targets.len(), "rack-aware targets chosen");
        Ok(targets)
    }

    fn verify_block_placement(&self, _src_path: &str, block: &LocatedBlock, min_racks: usize) -> Result<usize> {
        let bound = self.bound()?;
        let required = min_racks.min(bound.topology.num_racks());
        let racks: BTreeSet<&str> = block
            .locations
            .iter()
            .map(|node| node.network_location.as_str())
            .collect();
        Ok(required.saturating_sub(racks.len()))
    }

    fn choose_replica_to_delete(
        &self,
        _src_path: &str,
        _block: &Block,
        _replication: u16,
        existing: &[Datanode],
        more_existing: &[Datanode],
    ) -> Result<Option<Datanode>> {
        let pool = if more_existing.is_empty() { existing } else { more_existing };
        Ok(pool
            .iter()
            .min_by(|a, b| {
                a.remaining
                    .cmp(&b.remaining)
                    .then_with(|| a.topology_path().cmp(&b.topology_path()))
            })
            .cloned())
    }
}
