//! Virtualisation host capacity, loaded once.

use metis_client::BuildBackend;
use metis_types::HostResources;

use crate::error::ConsoleError;

/// Host capacity snapshot.
///
/// The inventory is fetched on first use only; later calls reuse it. A failed
/// fetch leaves the catalog unloaded so the next call tries again.
#[derive(Debug, Default)]
pub struct HostCatalog {
    hosts: Vec<HostResources>,
    loaded: bool,
}

impl HostCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn hosts(&self) -> &[HostResources] {
        &self.hosts
    }

    pub fn find(&self, ip: &str) -> Option<&HostResources> {
        self.hosts.iter().find(|h| h.ip == ip)
    }

    pub async fn ensure_loaded(
        &mut self,
        backend: &dyn BuildBackend,
    ) -> Result<&[HostResources], ConsoleError> {
        if !self.loaded {
            self.hosts = backend.host_resources().await.map_err(|e| {
                tracing::warn!(error = %e, "failed to fetch host state");
                ConsoleError::from(e)
            })?;
            self.loaded = true;
            tracing::debug!(hosts = self.hosts.len(), "host catalog loaded");
        }
        Ok(&self.hosts)
    }
}
