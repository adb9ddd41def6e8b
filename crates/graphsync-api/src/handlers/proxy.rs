//! Multi-tenant Graph proxy.
//!
//! Relays an inbound request to the directory service once per selected
//! tenant configuration, each time with a freshly acquired bearer token, and
//! aggregates the per-tenant replies. Selection is header-scoped: the
//! optional `eliona-project-id` header narrows the fan-out to configurations
//! collecting for that project; without it every enabled configuration is
//! called.
//!
//! One tenant's failure aborts the entire proxied call; no partial
//! aggregation is returned.

use axum::body::Bytes;
use axum::extract::{Path, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_LENGTH, HOST};
use axum::Json;
use graphsync_db::Configuration;
use graphsync_msgraph::{Credentials, GraphClient};
use std::time::Duration;
use tracing::{info, instrument};

use crate::models::ProxyResponseEntry;
use crate::router::ApiState;
use crate::ApiError;

/// Upper bound on the relayed request body.
const MAX_PROXY_BODY_BYTES: usize = 4 * 1024 * 1024;

/// Tenant-scope header carrying a platform project id.
pub const PROJECT_SCOPE_HEADER: &str = "eliona-project-id";

/// Relay one request across the selected tenant configurations.
#[instrument(skip(state, request))]
pub async fn forward(
    State(state): State<ApiState>,
    Path(path): Path<String>,
    request: Request,
) -> Result<Json<Vec<ProxyResponseEntry>>, ApiError> {
    let (parts, body) = request.into_parts();
    let body_bytes: Bytes = axum::body::to_bytes(body, MAX_PROXY_BODY_BYTES)
        .await
        .map_err(|e| ApiError::BadRequest(format!("reading request body: {e}")))?;

    // The scope travels in a header because the directory service rejects
    // unknown query parameters but ignores extra headers.
    let project_id = parts
        .headers
        .get(PROJECT_SCOPE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let configs = match project_id.as_deref() {
        Some(project) => Configuration::get_enabled_for_project(&state.pool, project).await?,
        None => Configuration::get_enabled(&state.pool).await?,
    };
    if configs.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let mut responses = Vec::with_capacity(configs.len());
    for config in configs {
        let (Some(_secret), Some(username), Some(password)) = (
            config.client_secret.as_ref(),
            config.username.as_ref(),
            config.password.as_ref(),
        ) else {
            return Err(ApiError::Internal(format!(
                "configuration {} is missing credential material",
                config.id
            )));
        };

        let credentials = Credentials::UsernamePassword {
            client_id: config.client_id.clone(),
            tenant_id: config.tenant_id.clone(),
            username: username.clone(),
            password: password.clone().into(),
        };
        let client = GraphClient::new(
            credentials,
            state.env.clone(),
            Duration::from_secs(config.request_timeout.max(1) as u64),
        )
        .map_err(|e| ApiError::Internal(format!("initializing Graph client: {e}")))?;
        let token = client
            .bearer_token()
            .await
            .map_err(|e| ApiError::Internal(format!("getting bearer token: {e}")))?;

        let url = format!("{}/v1.0/{}", state.env.graph_base, path);
        info!(config_id = config.id, url = %url, "proxying request");

        let mut headers = parts.headers.clone();
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);
        headers.remove(AUTHORIZATION);

        let upstream = state
            .http
            .request(parts.method.clone(), &url)
            .headers(headers)
            .bearer_auth(&token)
            .body(body_bytes.clone())
            .send()
            .await
            .map_err(|e| {
                ApiError::Internal(format!("sending request to the directory service: {e}"))
            })?;

        let code = upstream.status().as_u16();
        let body: serde_json::Value = upstream
            .json()
            .await
            .map_err(|e| ApiError::Internal(format!("parsing upstream body: {e}")))?;

        responses.push(ProxyResponseEntry {
            config_id: config.id,
            username: username.clone(),
            code,
            body,
        });
    }

    Ok(Json(responses))
}
