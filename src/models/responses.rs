//! Response DTOs for the HTTP API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::models::{Credentials, IntegrationStatus, Provider};

/// Response body for `GET /workspaces/:workspace_id/integrations/:provider`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationResponse {
    pub workspace_id: String,
    pub provider: Provider,
    pub configured: bool,
    /// Credentials with secrets masked
    pub credentials: serde_json::Value,
}

impl IntegrationResponse {
    pub fn new(workspace_id: impl Into<String>, credentials: &Credentials) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            provider: credentials.provider(),
            configured: true,
            credentials: credentials.redacted(),
        }
    }
}

/// Response body for credential and status updates
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResponse {
    pub message: String,
    pub workspace_id: String,
    pub provider: Provider,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<IntegrationStatus>,
}

impl UpdateResponse {
    pub fn credentials_updated(workspace_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            message: format!("{provider} credentials updated"),
            workspace_id: workspace_id.into(),
            provider,
            status: Some(IntegrationStatus::Connected),
        }
    }

    pub fn status_updated(
        workspace_id: impl Into<String>,
        provider: Provider,
        status: IntegrationStatus,
    ) -> Self {
        Self {
            message: format!("{provider} status set to {}", status.as_str()),
            workspace_id: workspace_id.into(),
            provider,
            status: Some(status),
        }
    }
}

/// Response body for cache invalidation routes
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    pub removed: usize,
}

impl InvalidateResponse {
    pub fn new(scope: &str, removed: usize) -> Self {
        Self {
            message: format!("Invalidated {removed} cached entries for {scope}"),
            removed,
        }
    }
}

/// Statistics of one cache
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub invalidations: u64,
    pub evictions: u64,
    pub total_entries: usize,
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            invalidations: stats.invalidations,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
        }
    }
}

/// Response body for `GET /stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub credentials: CacheStatsResponse,
    pub tokens: CacheStatsResponse,
    pub memberships: CacheStatsResponse,
}

/// Response body for `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ZoomCredentials;

    #[test]
    fn test_integration_response_masks_secret() {
        let creds = Credentials::Zoom(ZoomCredentials {
            account_id: "acct".into(),
            client_id: "client".into(),
            client_secret: "super-secret-value".into(),
        });
        let json = serde_json::to_value(IntegrationResponse::new("ws-1", &creds)).unwrap();

        assert_eq!(json["workspaceId"], "ws-1");
        assert_eq!(json["provider"], "zoom");
        assert_eq!(json["configured"], true);
        assert_eq!(json["credentials"]["clientSecret"], "****alue");
        assert!(!json.to_string().contains("super-secret-value"));
    }

    #[test]
    fn test_update_response_serialize() {
        let json = serde_json::to_value(UpdateResponse::status_updated(
            "ws-1",
            Provider::GoHighLevel,
            IntegrationStatus::Error,
        ))
        .unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "gohighlevel status set to error");
    }

    #[test]
    fn test_stats_response_from_cache_stats() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            total_entries: 7,
            ..CacheStats::default()
        };
        let resp = CacheStatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
        assert_eq!(resp.total_entries, 7);
    }

    #[test]
    fn test_health_response_serialize() {
        let json = serde_json::to_string(&HealthResponse::healthy()).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
