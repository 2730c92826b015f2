//! Tandem Cluster Topology
//!
//! Storage nodes (datanodes) arranged in a two-level rack hierarchy.
//!
//! # Identifiers
//!
//! Every datanode is addressed by its topology path: the rack's network
//! location followed by the node name, e.g. `/rack1/10.0.0.1:50010`.
//! Block location records carry these paths, and placement policies turn
//! them back into live [`Datanode`] handles through [`ClusterTopology`].
//!
//! # Racks
//!
//! A rack is identified by its network location (`/rack1`, `/dc1/rack7`).
//! Only the last path component is the node name; everything before it is
//! the rack.

mod datanode;
mod error;
mod network;

pub use datanode::{parse_topology_path, Datanode};
pub use error::{Result, TopologyError};
pub use network::NetworkTopology;

/// Read access to the cluster's node map.
///
/// Placement policies only ever query the topology; membership changes are
/// the host's business.
pub trait ClusterTopology: Send + Sync {
    /// Look up a live node by its topology path.
    fn resolve_node(&self, topology_path: &str) -> Option<Datanode>;

    /// All live nodes.
    fn nodes(&self) -> Vec<Datanode>;

    /// Number of distinct racks holding at least one node.
    fn num_racks(&self) -> usize;
}

/// Cluster-wide load figures used by load-aware placement.
pub trait ClusterStats: Send + Sync {
    /// Total number of active transfers (xceivers) across all nodes.
    fn total_load(&self) -> usize;
}
