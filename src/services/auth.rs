//! Bearer-token authentication and workspace authorization.
//!
//! Token verification and membership lookups both read through their own
//! cache. Neither is ever invalidated explicitly; revocation takes effect
//! once the short TTL runs out.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{keys, SharedCache};
use crate::error::{Result, ServiceError};
use crate::models::{AuthContext, WorkspaceRole};
use crate::services::{MembershipSource, TokenVerifier};

#[derive(Clone)]
pub struct AuthService {
    tokens: SharedCache<String>,
    memberships: SharedCache<WorkspaceRole>,
    verifier: Arc<dyn TokenVerifier>,
    membership_source: Arc<dyn MembershipSource>,
    token_ttl: Duration,
    membership_ttl: Duration,
}

impl AuthService {
    pub fn new(
        tokens: SharedCache<String>,
        memberships: SharedCache<WorkspaceRole>,
        verifier: Arc<dyn TokenVerifier>,
        membership_source: Arc<dyn MembershipSource>,
        token_ttl: Duration,
        membership_ttl: Duration,
    ) -> Self {
        Self {
            tokens,
            memberships,
            verifier,
            membership_source,
            token_ttl,
            membership_ttl,
        }
    }

    /// Resolves a bearer token to a user id.
    pub async fn authenticate(&self, token: &str) -> Result<String> {
        if token.trim().is_empty() {
            return Err(ServiceError::Unauthorized("Missing bearer token".into()));
        }

        let key = keys::token_key(token);
        let generation = {
            let mut tokens = self.tokens.write().await;
            if let Some(user_id) = tokens.get(key) {
                return Ok(user_id);
            }
            tokens.generation()
        };

        let user_id = match self.verifier.verify_token(token).await {
            Ok(user_id) => user_id,
            Err(ServiceError::Unauthorized(reason)) => {
                debug!("token rejected");
                return Err(ServiceError::Unauthorized(reason));
            }
            Err(err) => {
                warn!(error = %err, "token verification failed");
                return Err(err);
            }
        };

        self.tokens
            .write()
            .await
            .set_if_generation(key, generation, user_id.clone(), self.token_ttl);
        Ok(user_id)
    }

    /// Returns the user's role in the workspace, `Forbidden` for non-members.
    pub async fn workspace_role(&self, user_id: &str, workspace_id: &str) -> Result<WorkspaceRole> {
        let key = keys::membership_key(user_id, workspace_id);
        let generation = {
            let mut memberships = self.memberships.write().await;
            if let Some(role) = memberships.get(&key) {
                return Ok(role);
            }
            memberships.generation()
        };

        match self
            .membership_source
            .fetch_role(user_id, workspace_id)
            .await?
        {
            Some(role) => {
                self.memberships.write().await.set_if_generation(
                    key,
                    generation,
                    role,
                    self.membership_ttl,
                );
                Ok(role)
            }
            None => Err(ServiceError::Forbidden(format!(
                "Not a member of workspace {workspace_id}"
            ))),
        }
    }

    /// Authenticates `token` and checks membership of `workspace_id`.
    pub async fn authorize(&self, token: &str, workspace_id: &str) -> Result<AuthContext> {
        let user_id = self.authenticate(token).await?;
        let role = self.workspace_role(&user_id, workspace_id).await?;
        Ok(AuthContext {
            user_id,
            workspace_id: workspace_id.to_string(),
            role,
        })
    }
}
