//! Supabase REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{Credentials, IntegrationStatus, Provider, WorkspaceRole};
use crate::services::{CredentialSource, MembershipSource, TokenVerifier};

const INTEGRATIONS_TABLE: &str = "integrations";
const MEMBERS_TABLE: &str = "workspace_members";
const INTEGRATION_CONFLICT_KEY: &str = "workspace_id,provider";
const PREFER: &str = "Prefer";

/// User object returned by `GET /auth/v1/user`
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MemberRow {
    role: WorkspaceRole,
}

#[derive(Debug, Deserialize)]
struct IntegrationRow {
    credentials: Option<serde_json::Value>,
}

/// Client for one Supabase project, authenticated with the service-role key.
#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    service_key: String,
    http: reqwest::Client,
}

impl SupabaseClient {
    pub fn new(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            http,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.supabase_url.clone(),
            config.supabase_service_key.clone(),
            Duration::from_secs(config.upstream_timeout),
        )
    }

    fn auth_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Adds service-role credentials for PostgREST.
    fn rest(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let response = self
            .rest(self.http.get(self.table_url(table)))
            .query(query)
            .send()
            .await?;
        let response = ensure_success(table, response).await?;
        Ok(response.json().await?)
    }

    /// Patches the integration row and returns the rows PostgREST reports as
    /// changed.
    async fn patch_integration(
        &self,
        workspace_id: &str,
        provider: Provider,
        body: serde_json::Value,
    ) -> Result<Vec<serde_json::Value>> {
        let mut query = integration_filter(workspace_id, provider);
        query.push(("select", "workspace_id".to_string()));

        let response = self
            .rest(self.http.patch(self.table_url(INTEGRATIONS_TABLE)))
            .header(PREFER, "return=representation")
            .query(&query)
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(INTEGRATIONS_TABLE, response).await?;
        Ok(response.json().await?)
    }

    /// Inserts the integration row, or merges into the existing one.
    async fn upsert_integration(&self, body: serde_json::Value) -> Result<()> {
        let response = self
            .rest(self.http.post(self.table_url(INTEGRATIONS_TABLE)))
            .header(PREFER, "resolution=merge-duplicates,return=minimal")
            .query(&[("on_conflict", INTEGRATION_CONFLICT_KEY)])
            .json(&body)
            .send()
            .await?;
        ensure_success(INTEGRATIONS_TABLE, response).await?;
        Ok(())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

fn integration_filter(workspace_id: &str, provider: Provider) -> Vec<(&'static str, String)> {
    vec![
        ("workspace_id", eq(workspace_id)),
        ("provider", eq(provider.as_str())),
    ]
}

/// Passes 2xx responses through. Anything else is logged with its body and
/// reported as an upstream failure without it.
async fn ensure_success(what: &str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(%status, what, %body, "supabase request failed");
    Err(ServiceError::Upstream(format!(
        "Supabase {what} request failed with status {}",
        status.as_u16()
    )))
}

#[async_trait]
impl TokenVerifier for SupabaseClient {
    async fn verify_token(&self, token: &str) -> Result<String> {
        let response = self
            .http
            .get(self.auth_url())
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ServiceError::Unauthorized(
                "Invalid or expired token".into(),
            )),
            _ => {
                let response = ensure_success("auth", response).await?;
                let user: AuthUser = response.json().await?;
                Ok(user.id)
            }
        }
    }
}

#[async_trait]
impl MembershipSource for SupabaseClient {
    async fn fetch_role(&self, user_id: &str, workspace_id: &str) -> Result<Option<WorkspaceRole>> {
        let rows: Vec<MemberRow> = self
            .select(
                MEMBERS_TABLE,
                &[
                    ("user_id", eq(user_id)),
                    ("workspace_id", eq(workspace_id)),
                    ("select", "role".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.role))
    }
}

#[async_trait]
impl CredentialSource for SupabaseClient {
    async fn fetch_credentials(
        &self,
        workspace_id: &str,
        provider: Provider,
    ) -> Result<Option<Credentials>> {
        let mut query = integration_filter(workspace_id, provider);
        query.push(("status", eq(IntegrationStatus::Connected.as_str())));
        query.push(("select", "credentials".to_string()));

        let rows: Vec<IntegrationRow> = self.select(INTEGRATIONS_TABLE, &query).await?;
        let Some(value) = rows.into_iter().next().and_then(|row| row.credentials) else {
            return Ok(None);
        };

        Credentials::from_json(provider, value).map(Some).map_err(|e| {
            ServiceError::Upstream(format!("Malformed {provider} credentials: {e}"))
        })
    }

    async fn store_credentials(&self, workspace_id: &str, credentials: &Credentials) -> Result<()> {
        self.upsert_integration(json!({
            "workspace_id": workspace_id,
            "provider": credentials.provider(),
            "credentials": credentials,
            "status": IntegrationStatus::Connected,
        }))
        .await
    }

    async fn update_status(
        &self,
        workspace_id: &str,
        provider: Provider,
        status: IntegrationStatus,
    ) -> Result<()> {
        let updated = self
            .patch_integration(workspace_id, provider, json!({ "status": status }))
            .await?;
        if updated.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No {provider} integration for workspace {workspace_id}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Query, State};
    use axum::http::{header::AUTHORIZATION, HeaderMap};
    use axum::response::{IntoResponse, Response as StubResponse};
    use axum::routing::get;
    use axum::{Json, Router};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn client() -> SupabaseClient {
        SupabaseClient::new("https://project.supabase.co/", "service-key", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_urls_strip_trailing_slash() {
        let client = client();
        assert_eq!(client.auth_url(), "https://project.supabase.co/auth/v1/user");
        assert_eq!(
            client.table_url(INTEGRATIONS_TABLE),
            "https://project.supabase.co/rest/v1/integrations"
        );
    }

    #[test]
    fn test_integration_filter() {
        assert_eq!(
            integration_filter("ws-42", Provider::GoHighLevel),
            vec![
                ("workspace_id", "eq.ws-42".to_string()),
                ("provider", "eq.gohighlevel".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_config() {
        let config = Config::default();
        let client = SupabaseClient::from_config(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:54321");
    }

    #[test]
    fn test_rows_deserialize() {
        let rows: Vec<MemberRow> = serde_json::from_str(r#"[{"role":"owner"}]"#).unwrap();
        assert_eq!(rows[0].role, WorkspaceRole::Owner);

        let rows: Vec<IntegrationRow> = serde_json::from_str(r#"[{"credentials":null}]"#).unwrap();
        assert!(rows[0].credentials.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_supabase_is_upstream_error() {
        // Port 9 (discard) on localhost refuses connections
        let client =
            SupabaseClient::new("http://127.0.0.1:9", "key", Duration::from_millis(500)).unwrap();
        let err = client.verify_token("tok").await.unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(_)));
    }

    // == Stub Supabase ==

    #[derive(Debug, Clone)]
    struct RecordedWrite {
        method: &'static str,
        query: HashMap<String, String>,
        prefer: Option<String>,
        body: serde_json::Value,
    }

    type Writes = Arc<Mutex<Vec<RecordedWrite>>>;

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|value| value.to_str().ok())
    }

    fn has_service_key(headers: &HeaderMap) -> bool {
        header(headers, "apikey") == Some("service-key")
            && header(headers, AUTHORIZATION.as_str()) == Some("Bearer service-key")
    }

    fn record(
        writes: &Writes,
        method: &'static str,
        query: HashMap<String, String>,
        headers: &HeaderMap,
        body: serde_json::Value,
    ) {
        writes.lock().unwrap().push(RecordedWrite {
            method,
            query,
            prefer: header(headers, "prefer").map(str::to_string),
            body,
        });
    }

    async fn stub_user(headers: HeaderMap) -> StubResponse {
        match header(&headers, AUTHORIZATION.as_str()) {
            Some("Bearer good-token") => Json(json!({ "id": "user-1" })).into_response(),
            Some("Bearer forbidden-token") => StatusCode::FORBIDDEN.into_response(),
            Some("Bearer broken-token") => {
                (StatusCode::INTERNAL_SERVER_ERROR, "gotrue stack trace").into_response()
            }
            _ => StatusCode::UNAUTHORIZED.into_response(),
        }
    }

    async fn stub_members(
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> StubResponse {
        if !has_service_key(&headers) {
            return (StatusCode::UNAUTHORIZED, "invalid api key").into_response();
        }
        let user = query.get("user_id").map(String::as_str);
        let workspace = query.get("workspace_id").map(String::as_str);
        match (user, workspace) {
            (Some("eq.user-1"), Some("eq.ws-1")) => Json(json!([{ "role": "admin" }])).into_response(),
            _ => Json(json!([])).into_response(),
        }
    }

    async fn stub_integrations(Query(query): Query<HashMap<String, String>>) -> StubResponse {
        if query.get("status").map(String::as_str) != Some("eq.connected")
            || query.get("provider").map(String::as_str) != Some("eq.zoom")
        {
            return Json(json!([])).into_response();
        }
        match query.get("workspace_id").map(String::as_str) {
            Some("eq.ws-1") => Json(json!([{
                "credentials": { "accountId": "acct", "clientId": "cid", "clientSecret": "sec" }
            }]))
            .into_response(),
            Some("eq.ws-bad") => Json(json!([{ "credentials": { "apiKey": 1 } }])).into_response(),
            Some("eq.ws-down") => {
                (StatusCode::SERVICE_UNAVAILABLE, "connection to db-internal:5432 refused")
                    .into_response()
            }
            _ => Json(json!([])).into_response(),
        }
    }

    async fn stub_patch(
        State(writes): State<Writes>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<serde_json::Value>,
    ) -> StubResponse {
        let matched = query.get("workspace_id").map(String::as_str) == Some("eq.ws-1");
        record(&writes, "PATCH", query, &headers, body);
        if matched {
            Json(json!([{ "workspace_id": "ws-1" }])).into_response()
        } else {
            Json(json!([])).into_response()
        }
    }

    async fn stub_upsert(
        State(writes): State<Writes>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<serde_json::Value>,
    ) -> StubResponse {
        record(&writes, "POST", query, &headers, body);
        StatusCode::CREATED.into_response()
    }

    /// Serves a minimal GoTrue + PostgREST on an ephemeral local port.
    async fn stub_supabase(service_key: &str) -> (SupabaseClient, Writes) {
        let writes: Writes = Arc::default();
        let app = Router::new()
            .route("/auth/v1/user", get(stub_user))
            .route("/rest/v1/workspace_members", get(stub_members))
            .route(
                "/rest/v1/integrations",
                get(stub_integrations).patch(stub_patch).post(stub_upsert),
            )
            .with_state(writes.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client =
            SupabaseClient::new(format!("http://{addr}"), service_key, Duration::from_secs(5))
                .unwrap();
        (client, writes)
    }

    #[tokio::test]
    async fn test_verify_token_status_mapping() {
        let (client, _) = stub_supabase("service-key").await;

        assert_eq!(client.verify_token("good-token").await.unwrap(), "user-1");
        assert!(matches!(
            client.verify_token("expired-token").await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));
        assert!(matches!(
            client.verify_token("forbidden-token").await.unwrap_err(),
            ServiceError::Unauthorized(_)
        ));

        let err = client.verify_token("broken-token").await.unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(_)));
        assert!(err.to_string().contains("500"));
        assert!(!err.to_string().contains("stack trace"));
    }

    #[tokio::test]
    async fn test_fetch_role() {
        let (client, _) = stub_supabase("service-key").await;

        assert_eq!(
            client.fetch_role("user-1", "ws-1").await.unwrap(),
            Some(WorkspaceRole::Admin)
        );
        assert_eq!(client.fetch_role("user-2", "ws-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_rejected_service_key_is_upstream_error() {
        let (client, _) = stub_supabase("wrong-key").await;

        let err = client.fetch_role("user-1", "ws-1").await.unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(_)));
        assert!(!err.to_string().contains("invalid api key"));
    }

    #[tokio::test]
    async fn test_fetch_credentials() {
        let (client, _) = stub_supabase("service-key").await;

        let credentials = client
            .fetch_credentials("ws-1", Provider::Zoom)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(credentials.provider(), Provider::Zoom);

        // No connected row
        assert_eq!(client.fetch_credentials("ws-2", Provider::Zoom).await.unwrap(), None);
        assert_eq!(
            client.fetch_credentials("ws-1", Provider::GoHighLevel).await.unwrap(),
            None
        );

        let err = client
            .fetch_credentials("ws-bad", Provider::Zoom)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(_)));

        let err = client
            .fetch_credentials("ws-down", Provider::Zoom)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Upstream(_)));
        assert!(!err.to_string().contains("db-internal"));
    }

    #[tokio::test]
    async fn test_update_status_patches_matching_row() {
        let (client, writes) = stub_supabase("service-key").await;

        client
            .update_status("ws-1", Provider::Zoom, IntegrationStatus::Disconnected)
            .await
            .unwrap();

        let writes = writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1);
        let write = &writes[0];
        assert_eq!(write.method, "PATCH");
        assert_eq!(write.query["workspace_id"], "eq.ws-1");
        assert_eq!(write.query["provider"], "eq.zoom");
        assert_eq!(write.prefer.as_deref(), Some("return=representation"));
        assert_eq!(write.body, json!({ "status": "disconnected" }));
    }

    #[tokio::test]
    async fn test_update_status_without_row_is_not_found() {
        let (client, _) = stub_supabase("service-key").await;

        let err = client
            .update_status("ws-9", Provider::Zoom, IntegrationStatus::Error)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_store_credentials_upserts_row() {
        let (client, writes) = stub_supabase("service-key").await;
        let credentials = Credentials::from_json(
            Provider::Zoom,
            json!({ "accountId": "acct", "clientId": "cid", "clientSecret": "new-secret" }),
        )
        .unwrap();

        client.store_credentials("ws-new", &credentials).await.unwrap();

        let writes = writes.lock().unwrap().clone();
        assert_eq!(writes.len(), 1);
        let write = &writes[0];
        assert_eq!(write.method, "POST");
        assert_eq!(write.query["on_conflict"], "workspace_id,provider");
        assert!(write
            .prefer
            .as_deref()
            .is_some_and(|prefer| prefer.contains("resolution=merge-duplicates")));
        assert_eq!(write.body["workspace_id"], "ws-new");
        assert_eq!(write.body["provider"], "zoom");
        assert_eq!(write.body["status"], "connected");
        assert_eq!(write.body["credentials"]["clientSecret"], "new-secret");
    }
}
