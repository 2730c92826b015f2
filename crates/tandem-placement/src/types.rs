//! Request and block types shared by placement policies.

use std::collections::HashSet;

use tandem_topology::Datanode;

/// A block of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    /// Block identifier.
    pub id: u64,
    /// Bytes written so far.
    pub num_bytes: u64,
    /// Generation stamp, bumped on recovery.
    pub generation_stamp: u64,
}

/// A block together with the nodes holding its replicas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedBlock {
    /// The block.
    pub block: Block,
    /// Replica holders.
    pub locations: Vec<Datanode>,
}

/// Parameters of a target choice for a new block.
#[derive(Debug, Clone, Copy)]
pub struct PlacementRequest<'a> {
    /// File the block belongs to.
    pub src_path: &'a str,
    /// How many additional targets are wanted.
    pub num_replicas: usize,
    /// Node the client writes from, if it is a cluster member.
    pub writer: Option<&'a Datanode>,
    /// Nodes already chosen for this block.
    pub chosen_nodes: &'a [Datanode],
    /// Include `chosen_nodes` at the head of the result.
    pub return_chosen_nodes: bool,
    /// Topology paths that must not be chosen.
    pub excluded_nodes: Option<&'a HashSet<String>>,
    /// Size of the block to place, in bytes.
    pub block_size: u64,
}

impl<'a> PlacementRequest<'a> {
    /// Request `num_replicas` targets for a block of `src_path`.
    pub fn new(src_path: &'a str, num_replicas: usize) -> Self {
        Self {
            src_path,
            num_replicas,
            writer: None,
            chosen_nodes: &[],
            return_chosen_nodes: false,
            excluded_nodes: None,
            block_size: 0,
        }
    }

    /// Set the writing node.
    #[must_use]
    pub fn writer(mut self, writer: &'a Datanode) -> Self {
        self.writer = Some(writer);
        self
    }

    /// Set the nodes already chosen.
    #[must_use]
    pub fn chosen(mut self, chosen_nodes: &'a [Datanode]) -> Self {
        self.chosen_nodes = chosen_nodes;
        self
    }

    /// Ask for the chosen nodes to lead the result.
    #[must_use]
    pub fn return_chosen(mut self, return_chosen_nodes: bool) -> Self {
        self.return_chosen_nodes = return_chosen_nodes;
        self
    }

    /// Exclude nodes by topology path.
    #[must_use]
    pub fn excluding(mut self, excluded_nodes: &'a HashSet<String>) -> Self {
        self.excluded_nodes = Some(excluded_nodes);
        self
    }

    /// Set the block size.
    #[must_use]
    pub fn block_size(mut self, block_size: u64) -> Self {
        self.block_size = block_size;
        self
    }
}
