//! Request extractors that authenticate the caller against a workspace.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::api::AppState;
use crate::error::ServiceError;
use crate::models::AuthContext;

/// Path parameter naming the workspace being acted on.
const WORKSPACE_PARAM: &str = "workspace_id";

/// Caller authenticated by bearer token and confirmed as a member of the
/// workspace named in the path.
#[derive(Debug, Clone)]
pub struct WorkspaceMember(pub AuthContext);

/// A `WorkspaceMember` whose role may manage integrations.
#[derive(Debug, Clone)]
pub struct WorkspaceManager(pub AuthContext);

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ServiceError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| ServiceError::Unauthorized("Missing Authorization header".into()))?
        .to_str()
        .map_err(|_| ServiceError::Unauthorized("Malformed Authorization header".into()))?;

    match value.split_once(' ') {
        Some((scheme, token))
            if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() =>
        {
            Ok(token.trim())
        }
        _ => Err(ServiceError::Unauthorized(
            "Authorization header must be a bearer token".into(),
        )),
    }
}

#[async_trait]
impl FromRequestParts<AppState> for WorkspaceMember {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.to_string();

        let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ServiceError::InvalidRequest(rejection.body_text()))?;
        let workspace_id = params
            .get(WORKSPACE_PARAM)
            .ok_or_else(|| ServiceError::Internal("Route has no workspace parameter".into()))?;

        let context = state.auth.authorize(&token, workspace_id).await?;
        Ok(WorkspaceMember(context))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for WorkspaceManager {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let WorkspaceMember(context) = WorkspaceMember::from_request_parts(parts, state).await?;
        if !context.role.can_manage_integrations() {
            return Err(ServiceError::Forbidden(
                "Only workspace owners and admins can manage integrations".into(),
            ));
        }
        Ok(WorkspaceManager(context))
    }
}
