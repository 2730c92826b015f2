//! Tandem Block Placement
//!
//! Chooses storage nodes for new blocks so that blocks at the same index
//! in related files end up on the same nodes.
//!
//! # Groups
//!
//! A file belongs to a group when its path contains a `managed` segment
//! followed by a group name and at least one more segment:
//! `/data/managed/orders/part-0` is in group `/data/managed/orders/`. Group
//! membership is computed from the path alone; nothing is registered.
//!
//! # Colocation
//!
//! When block `i` of a grouped file is allocated, the nodes already holding
//! block `i` of any sibling become the preferred targets. Jobs that process
//! corresponding blocks of sibling files together can then run without
//! moving data between nodes.
//!
//! ```text
//! /managed/g1/a   [b0: N1,N2] [b1: N3,N4] [b2: ?]
//! /managed/g1/b   [b0: N1,N2] [b1: N3,N4] [b2: N5,N6]
//!                                            ^ new block of `a` goes to N5,N6
//! ```
//!
//! # Fallback
//!
//! Paths outside any group, and grouped files whose siblings have nothing
//! at the target index, are placed by a generic rack-aware allocator
//! ([`RackAwarePolicy`] by default). Verification is always delegated to
//! it. Choosing a replica to delete is not supported by the colocating
//! policy.

mod classifier;
mod colocating;
mod composer;
mod config;
mod error;
mod policy;
mod rack_aware;
mod reader;
mod resolver;
mod types;

pub use classifier::PathClassifier;
pub use colocating::ColocatingPolicy;
pub use composer::compose_targets;
pub use config::{FallbackConfig, PlacementConfig, DEFAULT_MANAGED_SEGMENT, DEFAULT_METADATA_ENDPOINT};
pub use error::{PlacementError, Result};
pub use policy::BlockPlacementPolicy;
pub use rack_aware::RackAwarePolicy;
pub use reader::{BlockMap, GroupMetadataReader};
pub use resolver::ColocationResolver;
pub use types::{Block, LocatedBlock, PlacementRequest};
