//! Integration credential lookups through the credentials cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::{keys, SharedCache};
use crate::error::{Result, ServiceError};
use crate::models::{Credentials, IntegrationStatus, Provider};
use crate::services::CredentialSource;

/// Read-through access to workspace integration credentials.
///
/// Every write to the source is followed by an invalidation of the affected
/// key, so a stale credential is never served after a change made through
/// this service.
#[derive(Clone)]
pub struct CredentialService {
    cache: SharedCache<Credentials>,
    source: Arc<dyn CredentialSource>,
    ttl: Duration,
}

impl CredentialService {
    pub fn new(
        cache: SharedCache<Credentials>,
        source: Arc<dyn CredentialSource>,
        ttl: Duration,
    ) -> Self {
        Self { cache, source, ttl }
    }

    /// Returns credentials for `(workspace_id, provider)`.
    ///
    /// Concurrent misses on the same key may each hit the source. A fetch that
    /// overlaps an invalidation is returned to its caller but not cached.
    pub async fn get_credentials(
        &self,
        workspace_id: &str,
        provider: Provider,
    ) -> Result<Credentials> {
        let key = keys::credential_key(workspace_id, provider.as_str());

        let generation = {
            let mut cache = self.cache.write().await;
            if let Some(credentials) = cache.get(&key) {
                return Ok(credentials);
            }
            cache.generation()
        };

        // Lock is not held across the fetch.
        let fetched = self.source.fetch_credentials(workspace_id, provider).await?;
        match fetched {
            Some(credentials) => {
                let cached = self.cache.write().await.set_if_generation(
                    key,
                    generation,
                    credentials.clone(),
                    self.ttl,
                );
                if cached {
                    debug!(%workspace_id, %provider, "cached integration credentials");
                }
                Ok(credentials)
            }
            None => Err(ServiceError::NotFound(format!(
                "No {provider} credentials for workspace {workspace_id}"
            ))),
        }
    }

    /// Stores new credentials and drops the cached copy.
    pub async fn update_credentials(
        &self,
        workspace_id: &str,
        credentials: &Credentials,
    ) -> Result<()> {
        let provider = credentials.provider();
        self.source.store_credentials(workspace_id, credentials).await?;
        self.invalidate(workspace_id, provider).await;
        Ok(())
    }

    /// Changes an integration's status and drops the cached credentials.
    pub async fn update_integration_status(
        &self,
        workspace_id: &str,
        provider: Provider,
        status: IntegrationStatus,
    ) -> Result<()> {
        self.source
            .update_status(workspace_id, provider, status)
            .await?;
        self.invalidate(workspace_id, provider).await;
        Ok(())
    }

    /// Drops cached credentials of every provider in the workspace.
    pub async fn invalidate_workspace(&self, workspace_id: &str) -> usize {
        let removed = self
            .cache
            .write()
            .await
            .invalidate_by_prefix(&keys::workspace_prefix(workspace_id));
        info!(%workspace_id, removed, "invalidated workspace credentials");
        removed
    }

    async fn invalidate(&self, workspace_id: &str, provider: Provider) {
        let key = keys::credential_key(workspace_id, provider.as_str());
        if self.cache.write().await.invalidate(&key) {
            info!(%workspace_id, %provider, "invalidated cached credentials");
        }
    }
}
