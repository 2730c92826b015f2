//! Datanode handles and topology path parsing.

use std::fmt;

use crate::{Result, TopologyError};

/// A storage node as seen by placement.
///
/// Handles are plain values: two handles are equal when every field is.
/// Capacity figures are a snapshot taken when the handle was produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Datanode {
    /// Transfer address, `host:port`.
    pub name: String,
    /// Rack the node lives in, e.g. `/rack1`.
    pub network_location: String,
    /// Raw capacity in bytes.
    pub capacity: u64,
    /// Free space in bytes.
    pub remaining: u64,
    /// Active block transfers.
    pub xceiver_count: usize,
}

impl Datanode {
    /// Create an empty node with the given capacity, all of it free.
    pub fn new(network_location: impl Into<String>, name: impl Into<String>, capacity: u64) -> Self {
        Self {
            name: name.into(),
            network_location: network_location.into(),
            capacity,
            remaining: capacity,
            xceiver_count: 0,
        }
    }

    /// Build a node from its topology path.
    pub fn from_topology_path(path: &str, capacity: u64) -> Result<Self> {
        let (rack, name) = parse_topology_path(path)?;
        Ok(Self::new(rack, name, capacity))
    }

    /// Set the free space.
    #[must_use]
    pub fn with_remaining(mut self, remaining: u64) -> Self {
        self.remaining = remaining;
        self
    }

    /// Set the number of active transfers.
    #[must_use]
    pub fn with_xceivers(mut self, xceiver_count: usize) -> Self {
        self.xceiver_count = xceiver_count;
        self
    }

    /// The identifier stored in block location records.
    pub fn topology_path(&self) -> String {
        format!("{}/{}", self.network_location, self.name)
    }

    /// Check whether two nodes share a rack.
    pub fn is_on_same_rack(&self, other: &Self) -> bool {
        self.network_location == other.network_location
    }
}

impl fmt::Display for Datanode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network_location, self.name)
    }
}

/// Split a topology path into `(rack, name)`.
///
/// The name is the last component; the rack is everything before it and
/// must itself be an absolute path.
pub fn parse_topology_path(path: &str) -> Result<(&str, &str)> {
    if !path.starts_with('/') {
        return Err(TopologyError::InvalidLocation(path.to_string()));
    }
    match path.rsplit_once('/') {
        Some((rack, name)) if rack.len() > 1 && !name.is_empty() && !rack.ends_with('/') => {
            Ok((rack, name))
        }
        _ => Err(TopologyError::InvalidLocation(path.to_string())),
    }
}
