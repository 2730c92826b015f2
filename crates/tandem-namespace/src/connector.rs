//! Connectors that hand out metadata services.

use std::sync::Arc;

use tracing::debug;

use crate::{MetadataConnector, MetadataService, Result};

/// Connector that always returns the same service, whatever the endpoint.
#[derive(Clone)]
pub struct StaticConnector {
    service: Arc<dyn MetadataService>,
}

impl StaticConnector {
    /// Wrap an existing service.
    pub fn new(service: Arc<dyn MetadataService>) -> Self {
        Self { service }
    }
}

impl std::fmt::Debug for StaticConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticConnector").finish_non_exhaustive()
    }
}

impl MetadataConnector for StaticConnector {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn MetadataService>> {
        debug!(endpoint, "connecting to static metadata service");
        Ok(Arc::clone(&self.service))
    }
}
