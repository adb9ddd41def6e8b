//! Common test utilities for graphsync-api integration tests.

#![cfg(feature = "integration")]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use graphsync_api::{api_router, ApiState};
use graphsync_db::NewConfiguration;
use graphsync_msgraph::GraphEnvironment;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::util::ServiceExt;
use wiremock::MockServer;

/// Connects to the scratch database and resets the schema state.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a scratch Postgres");
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .expect("connecting to test database");
    graphsync_db::migrations::run(&pool)
        .await
        .expect("running migrations");
    sqlx::query("TRUNCATE configuration RESTART IDENTITY CASCADE")
        .execute(&pool)
        .await
        .expect("truncating tables");
    pool
}

/// Router with both login and Graph traffic pointed at the mock server.
pub fn test_router(pool: PgPool, server: &MockServer) -> Router {
    let env = GraphEnvironment {
        login_base: server.uri(),
        graph_base: server.uri(),
    };
    api_router(ApiState::new(pool, env))
}

/// Configuration factory for one mock tenant.
pub fn tenant_config(tenant_id: &str, projects: &[&str]) -> NewConfiguration {
    NewConfiguration {
        client_id: "client-a".to_string(),
        client_secret: Some("secret".to_string()),
        tenant_id: tenant_id.to_string(),
        username: Some(format!("svc@{tenant_id}.example")),
        password: Some("hunter2".to_string()),
        enable: true,
        refresh_interval: 60,
        request_timeout: 5,
        asset_filter: vec![],
        project_ids: projects.iter().map(|p| (*p).to_string()).collect(),
    }
}

/// Dispatches one request through the router.
pub async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

/// Reads and decodes a JSON response body.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
