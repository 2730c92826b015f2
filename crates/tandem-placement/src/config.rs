//! Placement configuration.

use serde::{Deserialize, Serialize};

use crate::{PlacementError, Result};

/// Path segment that marks the start of a group.
pub const DEFAULT_MANAGED_SEGMENT: &str = "managed";

/// Metadata endpoint used when none is configured.
pub const DEFAULT_METADATA_ENDPOINT: &str = "memory://";

/// Configuration handed to [`BlockPlacementPolicy::initialize`].
///
/// [`BlockPlacementPolicy::initialize`]: crate::BlockPlacementPolicy::initialize
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Segment literal that introduces a group (`/<segment>/<group>/...`).
    pub managed_segment: String,

    /// Where the metadata connector should connect on first use.
    pub metadata_endpoint: String,

    /// Settings for the generic allocator.
    pub fallback: FallbackConfig,
}

/// Settings for [`RackAwarePolicy`](crate::RackAwarePolicy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Skip nodes carrying more than twice the average transfer load.
    pub consider_load: bool,

    /// A node needs room for this many blocks to be a target.
    pub min_blocks_for_write: u64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            managed_segment: DEFAULT_MANAGED_SEGMENT.to_string(),
            metadata_endpoint: DEFAULT_METADATA_ENDPOINT.to_string(),
            fallback: FallbackConfig::default(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            consider_load: true,
            min_blocks_for_write: 5,
        }
    }
}

impl PlacementConfig {
    /// Read overrides from `TANDEM_*` environment variables on top of the
    /// defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, using the same keys as
    /// [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(segment) = lookup("TANDEM_MANAGED_SEGMENT") {
            config.managed_segment = segment;
        }
        if let Some(endpoint) = lookup("TANDEM_METADATA_ENDPOINT") {
            config.metadata_endpoint = endpoint;
        }
        if let Some(value) = lookup("TANDEM_CONSIDER_LOAD") {
            config.fallback.consider_load = value.trim().parse().map_err(|_| {
                PlacementError::Config(format!("TANDEM_CONSIDER_LOAD: expected true/false, got {value:?}"))
            })?;
        }
        if let Some(value) = lookup("TANDEM_MIN_BLOCKS_FOR_WRITE") {
            config.fallback.min_blocks_for_write = value.trim().parse().map_err(|_| {
                PlacementError::Config(format!("TANDEM_MIN_BLOCKS_FOR_WRITE: expected an integer, got {value:?}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check values that would make classification meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.managed_segment.is_empty() || self.managed_segment.contains('/') {
            return Err(PlacementError::Config(format!(
                "managed_segment must be a single non-empty path segment, got {:?}",
                self.managed_segment
            )));
        }
        Ok(())
    }
}
