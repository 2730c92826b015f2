//! In-memory node map with rack grouping.

use std::collections::{BTreeMap, HashMap};

use crate::{parse_topology_path, ClusterStats, ClusterTopology, Datanode, Result, TopologyError};

/// The cluster's node map.
///
/// Nodes are indexed by topology path and grouped by rack. Rack iteration
/// order is lexicographic, which keeps every query deterministic.
#[derive(Debug, Default, Clone)]
pub struct NetworkTopology {
    nodes: HashMap<String, Datanode>,
    /// Rack -> topology paths of its nodes, in insertion order.
    racks: BTreeMap<String, Vec<String>>,
}

impl NetworkTopology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node.
    pub fn add(&mut self, node: Datanode) -> Result<()> {
        let path = node.topology_path();
        parse_topology_path(&path)?;
        if self.nodes.contains_key(&path) {
            return Err(TopologyError::DuplicateNode(path));
        }
        self.racks
            .entry(node.network_location.clone())
            .or_default()
            .push(path.clone());
        self.nodes.insert(path, node);
        Ok(())
    }

    /// Unregister a node. Empty racks disappear with their last node.
    pub fn remove(&mut self, topology_path: &str) -> Option<Datanode> {
        let node = self.nodes.remove(topology_path)?;
        if let Some(members) = self.racks.get_mut(&node.network_location) {
            members.retain(|p| p != topology_path);
            if members.is_empty() {
                self.racks.remove(&node.network_location);
            }
        }
        Some(node)
    }

    /// Replace the stored snapshot of an existing node (capacity, load).
    /// Returns false if the node is unknown.
    pub fn update(&mut self, node: Datanode) -> bool {
        match self.nodes.get_mut(&node.topology_path()) {
            Some(existing) => {
                *existing = node;
                true
            }
            None => false,
        }
    }

    /// Get a node by topology path.
    pub fn get_node(&self, topology_path: &str) -> Option<&Datanode> {
        self.nodes.get(topology_path)
    }

    /// Check if a node is registered.
    pub fn contains(&self, topology_path: &str) -> bool {
        self.nodes.contains_key(topology_path)
    }

    /// Number of registered nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of non-empty racks.
    pub fn num_racks(&self) -> usize {
        self.racks.len()
    }

    /// Rack locations, sorted.
    pub fn racks(&self) -> impl Iterator<Item = &str> {
        self.racks.keys().map(String::as_str)
    }

    /// Nodes in one rack, in registration order.
    pub fn nodes_in_rack<'a>(&'a self, rack: &str) -> impl Iterator<Item = &'a Datanode> + 'a {
        self.racks
            .get(rack)
            .into_iter()
            .flatten()
            .filter_map(|path| self.nodes.get(path))
    }

    /// Check whether two registered nodes share a rack.
    /// Unknown nodes are never on the same rack as anything.
    pub fn is_on_same_rack(&self, a: &str, b: &str) -> bool {
        match (self.nodes.get(a), self.nodes.get(b)) {
            (Some(a), Some(b)) => a.is_on_same_rack(b),
            _ => false,
        }
    }

    /// All nodes, grouped by rack.
    pub fn nodes(&self) -> impl Iterator<Item = &Datanode> {
        self.racks
            .values()
            .flatten()
            .filter_map(|path| self.nodes.get(path))
    }
}

impl ClusterTopology for NetworkTopology {
    fn resolve_node(&self, topology_path: &str) -> Option<Datanode> {
        self.get_node(topology_path).cloned()
    }

    fn nodes(&self) -> Vec<Datanode> {
        NetworkTopology::nodes(self).cloned().collect()
    }

    fn num_racks(&self) -> usize {
        NetworkTopology::num_racks(self)
    }
}

impl ClusterStats for NetworkTopology {
    fn total_load(&self) -> usize {
        self.nodes.values().map(|n| n.xceiver_count).sum()
    }
}
