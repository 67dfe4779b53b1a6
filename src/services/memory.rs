//! In-memory sources.
//!
//! Stand-ins for Supabase when running locally or under test. Each one counts
//! how often it is consulted so callers can observe cache hits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Result, ServiceError};
use crate::models::{Credentials, IntegrationStatus, Provider, WorkspaceRole};
use crate::services::{CredentialSource, MembershipSource, TokenVerifier};

#[derive(Debug)]
struct StoredIntegration {
    credentials: Credentials,
    status: IntegrationStatus,
}

// == Credentials ==
/// Integration table keyed by `(workspace, provider)`.
#[derive(Debug, Default)]
pub struct InMemoryCredentialSource {
    rows: Mutex<HashMap<(String, Provider), StoredIntegration>>,
    fetches: AtomicUsize,
    fail_next: AtomicBool,
}

impl InMemoryCredentialSource {
    /// Adds or replaces a connected integration.
    pub fn insert(&self, workspace_id: &str, credentials: Credentials) {
        let key = (workspace_id.to_string(), credentials.provider());
        self.lock().insert(
            key,
            StoredIntegration {
                credentials,
                status: IntegrationStatus::Connected,
            },
        );
    }

    /// Number of `fetch_credentials` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Makes the next fetch fail with an upstream error.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, Provider), StoredIntegration>> {
        // A poisoned map is still a consistent map.
        self.rows.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CredentialSource for InMemoryCredentialSource {
    async fn fetch_credentials(
        &self,
        workspace_id: &str,
        provider: Provider,
    ) -> Result<Option<Credentials>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Upstream("integrations table unavailable".into()));
        }

        Ok(self
            .lock()
            .get(&(workspace_id.to_string(), provider))
            .filter(|row| row.status == IntegrationStatus::Connected)
            .map(|row| row.credentials.clone()))
    }

    async fn store_credentials(&self, workspace_id: &str, credentials: &Credentials) -> Result<()> {
        self.insert(workspace_id, credentials.clone());
        Ok(())
    }

    async fn update_status(
        &self,
        workspace_id: &str,
        provider: Provider,
        status: IntegrationStatus,
    ) -> Result<()> {
        match self.lock().get_mut(&(workspace_id.to_string(), provider)) {
            Some(row) => {
                row.status = status;
                Ok(())
            }
            None => Err(ServiceError::NotFound(format!(
                "No {provider} integration for workspace {workspace_id}"
            ))),
        }
    }
}

// == Tokens ==
/// Fixed token -> user id table.
#[derive(Debug, Default)]
pub struct InMemoryTokenVerifier {
    tokens: Mutex<HashMap<String, String>>,
    verifications: AtomicUsize,
}

impl InMemoryTokenVerifier {
    pub fn insert(&self, token: &str, user_id: &str) {
        self.lock().insert(token.to_string(), user_id.to_string());
    }

    /// Revokes a token at the identity provider.
    pub fn revoke(&self, token: &str) {
        self.lock().remove(token);
    }

    pub fn verification_count(&self) -> usize {
        self.verifications.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.tokens.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TokenVerifier for InMemoryTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<String> {
        self.verifications.fetch_add(1, Ordering::SeqCst);
        self.lock()
            .get(token)
            .cloned()
            .ok_or_else(|| ServiceError::Unauthorized("Invalid or expired token".into()))
    }
}

// == Memberships ==
/// Fixed `(user, workspace)` -> role table.
#[derive(Debug, Default)]
pub struct InMemoryMembershipSource {
    roles: Mutex<HashMap<(String, String), WorkspaceRole>>,
    fetches: AtomicUsize,
}

impl InMemoryMembershipSource {
    pub fn insert(&self, user_id: &str, workspace_id: &str, role: WorkspaceRole) {
        self.lock()
            .insert((user_id.to_string(), workspace_id.to_string()), role);
    }

    pub fn remove(&self, user_id: &str, workspace_id: &str) {
        self.lock()
            .remove(&(user_id.to_string(), workspace_id.to_string()));
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<(String, String), WorkspaceRole>> {
        self.roles.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MembershipSource for InMemoryMembershipSource {
    async fn fetch_role(&self, user_id: &str, workspace_id: &str) -> Result<Option<WorkspaceRole>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .lock()
            .get(&(user_id.to_string(), workspace_id.to_string()))
            .copied())
    }
}
