//! API Module
//!
//! HTTP handlers and routing for the cache service.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache statistics
//! - `GET|PUT /workspaces/:workspace_id/integrations/:provider[/...]` - Integration credentials
//! - `DELETE /workspaces/:workspace_id/cache` - Workspace cache invalidation
//! - `DELETE /admin/cache` - Clear all caches

mod extract;
pub mod handlers;
pub mod routes;

pub use extract::{bearer_token, WorkspaceManager, WorkspaceMember};
pub use handlers::*;
pub use routes::create_router;
