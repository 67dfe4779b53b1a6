//! API Routes
//!
//! Configures the Axum router with all endpoints.

use axum::{
    routing::{delete, get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_caches_handler, get_integration_handler, health_handler, invalidate_workspace_handler,
    stats_handler, update_credentials_handler, update_status_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /stats` - Statistics of the three caches
/// - `GET /workspaces/:workspace_id/integrations/:provider` - Masked credentials (member)
/// - `PUT /workspaces/:workspace_id/integrations/:provider/credentials` - Replace credentials (owner/admin)
/// - `PUT /workspaces/:workspace_id/integrations/:provider/status` - Change status (owner/admin)
/// - `DELETE /workspaces/:workspace_id/cache` - Drop the workspace's cached credentials (owner/admin)
/// - `DELETE /admin/cache` - Clear every cache (`x-admin-key`)
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route(
            "/workspaces/:workspace_id/integrations/:provider",
            get(get_integration_handler),
        )
        .route(
            "/workspaces/:workspace_id/integrations/:provider/credentials",
            put(update_credentials_handler),
        )
        .route(
            "/workspaces/:workspace_id/integrations/:provider/status",
            put(update_status_handler),
        )
        .route(
            "/workspaces/:workspace_id/cache",
            delete(invalidate_workspace_handler),
        )
        .route("/admin/cache", delete(clear_caches_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
