//! Request DTOs for the HTTP API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::models::IntegrationStatus;

/// Request body for `PUT /workspaces/:workspace_id/integrations/:provider/status`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: IntegrationStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_status_deserialize() {
        let req: UpdateStatusRequest =
            serde_json::from_str(r#"{"status": "disconnected"}"#).unwrap();
        assert_eq!(req.status, IntegrationStatus::Disconnected);
    }

    #[test]
    fn test_update_status_rejects_unknown() {
        let result = serde_json::from_str::<UpdateStatusRequest>(r#"{"status": "paused"}"#);
        assert!(result.is_err());
    }
}
