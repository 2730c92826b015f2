//! Scenario replay for Tandem placement.
//!
//! A scenario describes a cluster and a sequence of block writes. Each
//! write asks the colocating policy for targets and records the block in
//! an in-memory namespace, so later writes see earlier placements. Every
//! target loses one block of free space, so the capacity-aware fallback
//! spreads unrelated writes across the cluster.
//!
//! ```json
//! {
//!   "replication": 2,
//!   "block_size": 134217728,
//!   "nodes": [{"path": "/rack1/10.0.0.1:50010"}, {"path": "/rack2/10.0.0.2:50010"}],
//!   "writes": [{"path": "/managed/orders/part-0", "writer": "/rack1/10.0.0.1:50010"}]
//! }
//! ```

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use serde::{Deserialize, Serialize};
use tandem_namespace::{InMemoryNamespace, MetadataService, NamespaceError, StaticConnector};
use tandem_placement::{BlockPlacementPolicy, ColocatingPolicy, PlacementConfig, PlacementError, PlacementRequest};
use tandem_topology::{ClusterStats, ClusterTopology, Datanode, NetworkTopology, TopologyError};
use thiserror::Error;
use tracing::{debug, info};

/// Result type for simulator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop a replay.
#[derive(Debug, Error)]
pub enum Error {
    /// Scenario could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario is not valid JSON.
    #[error("Scenario error: {0}")]
    Scenario(#[from] serde_json::Error),

    /// Node list is inconsistent.
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),

    /// Namespace rejected a write.
    #[error("Namespace error: {0}")]
    Namespace(#[from] NamespaceError),

    /// The policy failed a write.
    #[error("Placement error: {0}")]
    Placement(#[from] PlacementError),

    /// A write names a writer that is not a cluster node.
    #[error("Unknown writer: {0}")]
    UnknownWriter(String),
}

fn default_replication() -> u16 {
    3
}

fn default_block_size() -> u64 {
    128 * 1024 * 1024
}

fn default_capacity() -> u64 {
    1 << 40
}

/// A cluster and the writes to replay against it.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Placement settings. Taken from `TANDEM_*` variables when absent.
    #[serde(default)]
    pub config: Option<PlacementConfig>,
    /// Replicas per block.
    #[serde(default = "default_replication")]
    pub replication: u16,
    /// Block size of every file.
    #[serde(default = "default_block_size")]
    pub block_size: u64,
    /// Cluster nodes.
    pub nodes: Vec<NodeSpec>,
    /// Block writes, in order.
    pub writes: Vec<WriteSpec>,
}

/// One cluster node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    /// Topology path, `/rack/host:port`.
    pub path: String,
    /// Capacity in bytes, all free.
    #[serde(default = "default_capacity")]
    pub capacity: u64,
}

/// One block write.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteSpec {
    /// File receiving the block.
    pub path: String,
    /// Topology path of the writing node.
    #[serde(default)]
    pub writer: Option<String>,
}

/// Outcome of one write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// File that received the block.
    pub path: String,
    /// Index of the new block.
    pub block_index: usize,
    /// Topology paths of the chosen targets, in pipeline order.
    pub targets: Vec<String>,
}

impl Scenario {
    /// Parse a scenario from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Node map shared with the policy, updated as blocks land.
#[derive(Debug)]
struct LiveTopology {
    inner: RwLock<NetworkTopology>,
}

impl LiveTopology {
    fn new(topology: NetworkTopology) -> Self {
        Self {
            inner: RwLock::new(topology),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, NetworkTopology> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take `bytes` of free space from each of `targets`.
    fn consume(&self, targets: &[String], bytes: u64) {
        let mut topology = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        for path in targets {
            let Some(node) = topology.get_node(path).cloned() else {
                continue;
            };
            let remaining = node.remaining.saturating_sub(bytes);
            topology.update(node.with_remaining(remaining));
        }
    }
}

impl ClusterTopology for LiveTopology {
    fn resolve_node(&self, topology_path: &str) -> Option<Datanode> {
        self.read().get_node(topology_path).cloned()
    }

    fn nodes(&self) -> Vec<Datanode> {
        self.read().nodes().cloned().collect()
    }

    fn num_racks(&self) -> usize {
        self.read().num_racks()
    }
}

impl ClusterStats for LiveTopology {
    fn total_load(&self) -> usize {
        self.read().total_load()
    }
}

/// A cluster being written to.
pub struct Simulation {
    topology: Arc<LiveTopology>,
    namespace: Arc<InMemoryNamespace>,
    policy: ColocatingPolicy,
    replication: u16,
    block_size: u64,
}

impl Simulation {
    /// Build the cluster described by `scenario` and initialize the policy.
    pub fn new(scenario: &Scenario) -> Result<Self> {
        let config = match &scenario.config {
            Some(config) => config.clone(),
            None => PlacementConfig::from_env()?,
        };

        let mut topology = NetworkTopology::new();
        for spec in &scenario.nodes {
            topology.add(Datanode::from_topology_path(&spec.path, spec.capacity)?)?;
        }
        info!(
            nodes = topology.num_nodes(),
            racks = topology.num_racks(),
            "cluster assembled"
        );
        let topology = Arc::new(LiveTopology::new(topology));

        let namespace = Arc::new(InMemoryNamespace::new());
        let connector = Arc::new(StaticConnector::new(namespace.clone()));
        let mut policy = ColocatingPolicy::with_connector(connector);
        policy.initialize(&config, topology.clone(), topology.clone())?;

        Ok(Self {
            topology,
            namespace,
            policy,
            replication: scenario.replication,
            block_size: scenario.block_size,
        })
    }

    /// Place and record one block.
    pub fn write(&self, spec: &WriteSpec) -> Result<Placement> {
        let writer = spec
            .writer
            .as_deref()
            .map(|path| {
                self.topology
                    .resolve_node(path)
                    .ok_or_else(|| Error::UnknownWriter(path.to_string()))
            })
            .transpose()?;

        if self.namespace.file_status(&spec.path).is_err() {
            self.namespace
                .create_file(&spec.path, self.block_size, self.replication)?;
        }

        let mut request =
            PlacementRequest::new(&spec.path, usize::from(self.replication)).block_size(self.block_size);
        if let Some(writer) = &writer {
            request = request.writer(writer);
        }
        let targets: Vec<String> = self
            .policy
            .choose_target(&request)?
            .iter()
            .map(Datanode::topology_path)
            .collect();

        self.topology.consume(&targets, self.block_size);
        let block_index = self.namespace.append_block(&spec.path, targets.clone())?;
        debug!(path = %spec.path, block_index, ?targets, "block written");
        Ok(Placement {
            path: spec.path.clone(),
            block_index,
            targets,
        })
    }

    /// Replay every write of `scenario`, stopping at the first failure.
    pub fn run(&self, scenario: &Scenario) -> Result<Vec<Placement>> {
        scenario.writes.iter().map(|spec| self.write(spec)).collect()
    }
}
