//! Router configuration for the graphsync API.

use axum::routing::{any, delete, get, post};
use axum::Router;
use graphsync_msgraph::GraphEnvironment;
use sqlx::PgPool;
use std::sync::Arc;

use crate::handlers::{bookings, configs, proxy};
use crate::sessions::SessionStore;

/// Shared state of the API handlers.
#[derive(Clone)]
pub struct ApiState {
    /// Configuration and asset-mapping store.
    pub pool: PgPool,
    /// Device-auth sessions keyed by user code.
    pub sessions: Arc<SessionStore>,
    /// Directory endpoints; overridable for tests.
    pub env: GraphEnvironment,
    /// Plain HTTP client used by the proxy passthrough.
    pub http: reqwest::Client,
}

impl ApiState {
    #[must_use]
    pub fn new(pool: PgPool, env: GraphEnvironment) -> Self {
        Self {
            pool,
            sessions: Arc::new(SessionStore::new()),
            env,
            http: reqwest::Client::new(),
        }
    }
}

/// Builds the full `/v1` router.
///
/// - `GET/POST /v1/configs`, `GET/PUT/DELETE /v1/configs/{id}`
/// - `GET /v1/bookings/authorize`, `GET/POST /v1/bookings`,
///   `DELETE /v1/bookings/{id}`, `POST /v1/bookings/{id}/registerGuest`
/// - `ANY /v1/msproxy/{path}`
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/v1/configs", get(configs::list).post(configs::create))
        .route(
            "/v1/configs/:id",
            get(configs::get_one)
                .put(configs::update)
                .delete(configs::remove),
        )
        .route("/v1/bookings/authorize", get(bookings::authorize))
        .route("/v1/bookings", get(bookings::list).post(bookings::create))
        .route("/v1/bookings/:booking_id", delete(bookings::remove))
        .route(
            "/v1/bookings/:booking_id/registerGuest",
            post(bookings::register_guest),
        )
        .route("/v1/msproxy/*path", any(proxy::forward))
        .with_state(state)
}
