//! Cache key construction.
//!
//! Composite keys put the coarsest invalidation scope first, so a whole
//! workspace can be dropped with one prefix.

/// Separator between key segments.
pub const KEY_SEPARATOR: char = ':';

/// Key for cached integration credentials: `workspaceId:provider`.
pub fn credential_key(workspace_id: &str, provider: &str) -> String {
    format!("{workspace_id}{KEY_SEPARATOR}{provider}")
}

/// Prefix covering every credential key of one workspace.
///
/// Ends with the separator so `ws1` never matches `ws10:zoom`.
pub fn workspace_prefix(workspace_id: &str) -> String {
    format!("{workspace_id}{KEY_SEPARATOR}")
}

/// Key for a verified bearer token: the token itself.
pub fn token_key(token: &str) -> &str {
    token
}

/// Key for a workspace membership: `userId:workspaceId`.
pub fn membership_key(user_id: &str, workspace_id: &str) -> String {
    format!("{user_id}{KEY_SEPARATOR}{workspace_id}")
}
