//! Booking handlers, including the interactive device-code authorization.
//!
//! Authorization races three outcomes under a hard deadline: the provider
//! reporting the user-facing code, a polling error, or the deadline itself.
//! Exactly one determines the HTTP result; the losing branches are abandoned
//! (the underlying provider call cannot be interrupted mid-flight) and their
//! results discarded.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use graphsync_db::{AssetMapping, Configuration};
use graphsync_msgraph::{Booking, Credentials, GraphClient, GraphError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::models::{
    AuthorizeQuery, CreateBookingRequest, DeleteBookingQuery, ListBookingsQuery,
    RegisterGuestRequest,
};
use crate::router::ApiState;
use crate::sessions::AuthorizedSession;
use crate::ApiError;

/// How long the user has to complete the device-code sign-in.
const AUTHORIZE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Resolves the asset mapping and its owning configuration.
async fn booking_context(
    state: &ApiState,
    raw_asset_id: &str,
) -> Result<(AssetMapping, Configuration), ApiError> {
    let asset_id: i32 = raw_asset_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid asset id: {raw_asset_id}")))?;
    let asset = AssetMapping::get_by_asset_id(&state.pool, asset_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("asset {asset_id} not found")))?;
    let config = Configuration::get(&state.pool, asset.configuration_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("configuration {} not found", asset.configuration_id))
        })?;
    Ok((asset, config))
}

/// Service-account client for non-interactive booking reads.
fn ropc_client(state: &ApiState, config: &Configuration) -> Result<GraphClient, ApiError> {
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
    GraphClient::new(
        credentials,
        state.env.clone(),
        Duration::from_secs(config.request_timeout.max(1) as u64),
    )
    .map_err(|e| ApiError::Internal(format!("initializing Graph client: {e}")))
}

enum AuthOutcome {
    Code(Option<String>),
    Error(Option<GraphError>),
    Deadline,
}

/// Authorize a user for managing bookings of one asset.
///
/// Returns the user-facing device code; the caller completes sign-in
/// out-of-band while a background task polls for the token.
#[utoipa::path(
    get,
    path = "/v1/bookings/authorize",
    params(("assetId" = String, Query, description = "Platform asset id")),
    responses(
        (status = 200, description = "User code to complete sign-in with", body = String),
        (status = 400, description = "Authorization failed"),
        (status = 404, description = "Unknown asset"),
        (status = 408, description = "Sign-in not completed before the deadline"),
    ),
    tag = "Booking"
)]
pub async fn authorize(
    State(state): State<ApiState>,
    Query(query): Query<AuthorizeQuery>,
) -> Result<Json<String>, ApiError> {
    let (asset, config) = booking_context(&state, &query.asset_id).await?;

    let credentials = Credentials::DeviceCode {
        client_id: config.client_id.clone(),
        tenant_id: config.tenant_id.clone(),
    };
    let graph = Arc::new(
        GraphClient::new(
            credentials,
            state.env.clone(),
            Duration::from_secs(config.request_timeout.max(1) as u64),
        )
        .map_err(|e| ApiError::Internal(format!("initializing Graph client: {e}")))?,
    );

    let (code_tx, mut code_rx) = tokio::sync::oneshot::channel::<String>();
    let (err_tx, mut err_rx) = tokio::sync::oneshot::channel::<GraphError>();

    {
        let graph = Arc::clone(&graph);
        tokio::spawn(async move {
            match graph.begin_device_flow().await {
                Ok(grant) => {
                    // Hand the code to the waiting request, then keep polling
                    // until the user completes or declines sign-in. The send
                    // fails only when the request already gave up.
                    let _ = code_tx.send(grant.user_code.clone());
                    if let Err(e) = graph.poll_device_token(&grant).await {
                        debug!(error = %e, "device-code polling ended with error");
                        let _ = err_tx.send(e);
                    }
                }
                Err(e) => {
                    let _ = err_tx.send(e);
                }
            }
        });
    }

    let outcome = tokio::select! {
        res = &mut code_rx => AuthOutcome::Code(res.ok()),
        res = &mut err_rx => AuthOutcome::Error(res.ok()),
        () = tokio::time::sleep(AUTHORIZE_TIMEOUT) => AuthOutcome::Deadline,
    };

    match outcome {
        AuthOutcome::Code(Some(user_code)) => {
            state.sessions.insert(
                user_code.clone(),
                AuthorizedSession {
                    asset,
                    graph,
                    created_at: Utc::now(),
                },
            );
            let evicted = state.sessions.sweep_expired();
            if evicted > 0 {
                info!(evicted, "evicted expired device-auth sessions");
            }
            Ok(Json(user_code))
        }
        // The sender vanished without a code; the real cause sits on the
        // error channel if anywhere.
        AuthOutcome::Code(None) => match err_rx.try_recv() {
            Ok(e) => Err(ApiError::BadRequest(format!("authorization failed: {e}"))),
            Err(_) => Err(ApiError::Internal(
                "authorization finished without device code".to_string(),
            )),
        },
        AuthOutcome::Error(Some(e)) => {
            Err(ApiError::BadRequest(format!("authorization failed: {e}")))
        }
        AuthOutcome::Error(None) => Err(ApiError::Internal(
            "authorization finished without device code".to_string(),
        )),
        AuthOutcome::Deadline => Err(ApiError::AuthTimeout),
    }
}

/// List bookings on an asset's calendar within a window.
#[utoipa::path(
    get,
    path = "/v1/bookings",
    params(
        ("assetId" = String, Query, description = "Platform asset id"),
        ("start" = String, Query, description = "Window start (ISO 8601)"),
        ("end" = String, Query, description = "Window end (ISO 8601)"),
    ),
    responses(
        (status = 200, description = "Bookings in the window"),
        (status = 404, description = "Unknown asset"),
    ),
    tag = "Booking"
)]
pub async fn list(
    State(state): State<ApiState>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    let (asset, config) = booking_context(&state, &query.asset_id).await?;
    let graph = ropc_client(&state, &config)?;
    let bookings = graph
        .list_bookings(&asset.email, &query.start, &query.end)
        .await
        .map_err(|e| ApiError::Internal(format!("getting events from the directory: {e}")))?;
    Ok(Json(bookings))
}

/// Create a booking through a previously authorized session.
#[utoipa::path(
    post,
    path = "/v1/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Booking created"),
        (status = 400, description = "Unknown device code or upstream rejection"),
    ),
    tag = "Booking"
)]
pub async fn create(
    State(state): State<ApiState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<StatusCode, ApiError> {
    let session = state
        .sessions
        .get(&request.device_code)
        .ok_or(ApiError::InvalidSession)?;
    session
        .graph
        .create_booking(
            &request.start,
            &request.end,
            &session.asset.email,
            &request.event_name,
            &request.event_name,
        )
        .await
        .map_err(|e| ApiError::BadRequest(format!("server responded with error: {e}")))?;
    Ok(StatusCode::OK)
}

/// Cancel a booking through a previously authorized session.
#[utoipa::path(
    delete,
    path = "/v1/bookings/{bookingId}",
    params(
        ("bookingId" = String, Path, description = "Directory event id"),
        ("deviceCode" = String, Query, description = "Device code of the authorized session"),
    ),
    responses(
        (status = 200, description = "Booking cancelled"),
        (status = 400, description = "Unknown device code or upstream rejection"),
    ),
    tag = "Booking"
)]
pub async fn remove(
    State(state): State<ApiState>,
    Path(booking_id): Path<String>,
    Query(query): Query<DeleteBookingQuery>,
) -> Result<StatusCode, ApiError> {
    let session = state
        .sessions
        .get(&query.device_code)
        .ok_or(ApiError::InvalidSession)?;
    session
        .graph
        .delete_booking(&booking_id)
        .await
        .map_err(|e| ApiError::BadRequest(format!("server responded with error: {e}")))?;
    Ok(StatusCode::OK)
}

/// Notify the organizer that a guest arrived for the event.
#[utoipa::path(
    post,
    path = "/v1/bookings/{bookingId}/registerGuest",
    params(("bookingId" = String, Path, description = "Directory event id")),
    request_body = RegisterGuestRequest,
    responses((status = 501, description = "Not implemented")),
    tag = "Booking"
)]
pub async fn register_guest(
    State(_state): State<ApiState>,
    Path(booking_id): Path<String>,
    Json(_request): Json<RegisterGuestRequest>,
) -> StatusCode {
    warn!(booking_id = %booking_id, "guest registration requested but not implemented");
    StatusCode::NOT_IMPLEMENTED
}
