//! Domain types shared by the caches, services and the Supabase adapter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

// == Provider ==
/// Third-party integration a workspace can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Zoom,
    GoHighLevel,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Zoom => "zoom",
            Provider::GoHighLevel => "gohighlevel",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zoom" => Ok(Provider::Zoom),
            "gohighlevel" => Ok(Provider::GoHighLevel),
            other => Err(ServiceError::InvalidRequest(format!(
                "Unknown provider: {other}"
            ))),
        }
    }
}

// == Credentials ==
/// Zoom server-to-server OAuth app credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomCredentials {
    pub account_id: String,
    pub client_id: String,
    pub client_secret: String,
}

/// GoHighLevel location API credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoHighLevelCredentials {
    pub api_key: String,
    pub location_id: String,
}

/// Stored credentials for one workspace integration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Credentials {
    Zoom(ZoomCredentials),
    GoHighLevel(GoHighLevelCredentials),
}

impl Credentials {
    /// Parses a provider's credential object.
    pub fn from_json(provider: Provider, value: serde_json::Value) -> serde_json::Result<Self> {
        Ok(match provider {
            Provider::Zoom => Credentials::Zoom(serde_json::from_value(value)?),
            Provider::GoHighLevel => Credentials::GoHighLevel(serde_json::from_value(value)?),
        })
    }

    pub fn provider(&self) -> Provider {
        match self {
            Credentials::Zoom(_) => Provider::Zoom,
            Credentials::GoHighLevel(_) => Provider::GoHighLevel,
        }
    }

    /// JSON view with the secret half masked.
    pub fn redacted(&self) -> serde_json::Value {
        match self {
            Credentials::Zoom(c) => serde_json::json!({
                "accountId": c.account_id,
                "clientId": c.client_id,
                "clientSecret": mask(&c.client_secret),
            }),
            Credentials::GoHighLevel(c) => serde_json::json!({
                "apiKey": mask(&c.api_key),
                "locationId": c.location_id,
            }),
        }
    }
}

/// Keeps the last four characters of a secret.
fn mask(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

// == Integration Status ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrationStatus {
    Connected,
    Disconnected,
    Error,
}

impl IntegrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::Connected => "connected",
            IntegrationStatus::Disconnected => "disconnected",
            IntegrationStatus::Error => "error",
        }
    }
}

// == Workspace Role ==
/// A user's role inside one workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Member,
}

impl WorkspaceRole {
    /// Owners and admins may change integrations and drop workspace caches.
    pub fn can_manage_integrations(&self) -> bool {
        matches!(self, WorkspaceRole::Owner | WorkspaceRole::Admin)
    }
}

// == Auth Context ==
/// Who is calling, in which workspace, with what role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthContext {
    pub user_id: String,
    pub workspace_id: String,
    pub role: WorkspaceRole,
}
