//! Authoritative sources the caches sit in front of.
//!
//! Implementations are the source of truth; services only ever read through
//! a cache into them and never cache a negative answer.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Credentials, IntegrationStatus, Provider, WorkspaceRole};

/// Stored integration credentials per workspace.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Credentials of a connected integration, `None` if there are none.
    async fn fetch_credentials(
        &self,
        workspace_id: &str,
        provider: Provider,
    ) -> Result<Option<Credentials>>;

    /// Replaces an integration's credentials and marks it connected.
    async fn store_credentials(
        &self,
        workspace_id: &str,
        credentials: &Credentials,
    ) -> Result<()>;

    /// Sets an integration's status.
    async fn update_status(
        &self,
        workspace_id: &str,
        provider: Provider,
        status: IntegrationStatus,
    ) -> Result<()>;
}

/// Identity provider that turns a bearer token into a user id.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Returns the user id, or `Unauthorized` for a rejected token.
    async fn verify_token(&self, token: &str) -> Result<String>;
}

/// Workspace membership table.
#[async_trait]
pub trait MembershipSource: Send + Sync {
    /// The user's role in the workspace, `None` if not a member.
    async fn fetch_role(&self, user_id: &str, workspace_id: &str) -> Result<Option<WorkspaceRole>>;
}
