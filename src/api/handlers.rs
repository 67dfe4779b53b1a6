//! API Handlers
//!
//! HTTP request handlers for each endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use tracing::info;

use crate::api::{WorkspaceManager, WorkspaceMember};
use crate::cache::{CachePolicy, CacheSet};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{
    CacheStatsResponse, Credentials, HealthResponse, IntegrationResponse, InvalidateResponse,
    Provider, StatsResponse, UpdateResponse, UpdateStatusRequest,
};
use crate::services::{
    AuthService, CredentialService, CredentialSource, MembershipSource, TokenVerifier,
};
use crate::supabase::SupabaseClient;

/// Header carrying the key for admin routes.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// The authoritative sources behind the caches.
#[derive(Clone)]
pub struct Sources {
    pub credentials: Arc<dyn CredentialSource>,
    pub tokens: Arc<dyn TokenVerifier>,
    pub memberships: Arc<dyn MembershipSource>,
}

impl Sources {
    /// Uses one Supabase project for every source.
    pub fn supabase(client: SupabaseClient) -> Self {
        let client = Arc::new(client);
        Self {
            credentials: client.clone(),
            tokens: client.clone(),
            memberships: client,
        }
    }
}

/// Application state shared across all handlers.
///
/// The caches are held directly for stats and admin resets; the services
/// hold handles to the same instances.
#[derive(Clone)]
pub struct AppState {
    pub caches: CacheSet,
    pub credentials: CredentialService,
    pub auth: AuthService,
    pub admin_key: Option<String>,
}

impl AppState {
    /// Wires services over `caches` and `sources`.
    pub fn new(caches: CacheSet, policy: CachePolicy, sources: Sources) -> Self {
        let credentials = CredentialService::new(
            caches.credentials.clone(),
            sources.credentials,
            policy.credential_ttl,
        );
        let auth = AuthService::new(
            caches.tokens.clone(),
            caches.memberships.clone(),
            sources.tokens,
            sources.memberships,
            policy.token_ttl,
            policy.membership_ttl,
        );
        Self {
            caches,
            credentials,
            auth,
            admin_key: None,
        }
    }

    /// Enables the admin routes behind `key`.
    pub fn with_admin_key(mut self, key: impl Into<String>) -> Self {
        self.admin_key = Some(key.into());
        self
    }

    /// Builds state backed by the configured Supabase project.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = SupabaseClient::from_config(config)?;
        let state = Self::new(
            CacheSet::from_config(config),
            CachePolicy::from(config),
            Sources::supabase(client),
        );
        Ok(match &config.admin_key {
            Some(key) => state.with_admin_key(key.clone()),
            None => state,
        })
    }
}

/// Handler for GET /workspaces/:workspace_id/integrations/:provider
pub async fn get_integration_handler(
    State(state): State<AppState>,
    WorkspaceMember(ctx): WorkspaceMember,
    Path((workspace_id, provider)): Path<(String, String)>,
) -> Result<Json<IntegrationResponse>> {
    let provider: Provider = provider.parse()?;
    let credentials = state
        .credentials
        .get_credentials(&ctx.workspace_id, provider)
        .await?;

    Ok(Json(IntegrationResponse::new(workspace_id, &credentials)))
}

/// Handler for PUT /workspaces/:workspace_id/integrations/:provider/credentials
pub async fn update_credentials_handler(
    State(state): State<AppState>,
    WorkspaceManager(ctx): WorkspaceManager,
    Path((workspace_id, provider)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<UpdateResponse>> {
    let provider: Provider = provider.parse()?;
    let credentials = Credentials::from_json(provider, body).map_err(|e| {
        ServiceError::InvalidRequest(format!("Invalid {provider} credentials: {e}"))
    })?;

    state
        .credentials
        .update_credentials(&workspace_id, &credentials)
        .await?;
    info!(%workspace_id, %provider, user_id = %ctx.user_id, "integration credentials updated");

    Ok(Json(UpdateResponse::credentials_updated(workspace_id, provider)))
}

/// Handler for PUT /workspaces/:workspace_id/integrations/:provider/status
pub async fn update_status_handler(
    State(state): State<AppState>,
    WorkspaceManager(ctx): WorkspaceManager,
    Path((workspace_id, provider)): Path<(String, String)>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateResponse>> {
    let provider: Provider = provider.parse()?;

    state
        .credentials
        .update_integration_status(&workspace_id, provider, req.status)
        .await?;
    info!(
        %workspace_id,
        %provider,
        status = req.status.as_str(),
        user_id = %ctx.user_id,
        "integration status updated"
    );

    Ok(Json(UpdateResponse::status_updated(
        workspace_id,
        provider,
        req.status,
    )))
}

/// Handler for DELETE /workspaces/:workspace_id/cache
pub async fn invalidate_workspace_handler(
    State(state): State<AppState>,
    WorkspaceManager(ctx): WorkspaceManager,
) -> Json<InvalidateResponse> {
    let removed = state
        .credentials
        .invalidate_workspace(&ctx.workspace_id)
        .await;
    Json(InvalidateResponse::new(
        &format!("workspace {}", ctx.workspace_id),
        removed,
    ))
}

/// Handler for DELETE /admin/cache
pub async fn clear_caches_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<InvalidateResponse>> {
    let Some(expected) = state.admin_key.as_deref() else {
        return Err(ServiceError::Forbidden("Admin routes are disabled".into()));
    };
    let provided = headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    if provided != Some(expected) {
        return Err(ServiceError::Forbidden("Invalid admin key".into()));
    }

    let removed = state.caches.clear_all().await;
    info!(removed, "all caches cleared");
    Ok(Json(InvalidateResponse::new("all caches", removed)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let credentials = state.caches.credentials.read().await.stats();
    let tokens = state.caches.tokens.read().await.stats();
    let memberships = state.caches.memberships.read().await.stats();

    Json(StatsResponse {
        credentials: CacheStatsResponse::from(credentials),
        tokens: CacheStatsResponse::from(tokens),
        memberships: CacheStatsResponse::from(memberships),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
