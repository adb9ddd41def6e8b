//! Configuration CRUD tests.
//!
//! These need a scratch Postgres (`DATABASE_URL`); run with
//! `cargo test -p graphsync-api --features integration`.

#![cfg(feature = "integration")]

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::*;
use serde_json::json;
use wiremock::MockServer;

fn config_body(enable: bool) -> String {
    json!({
        "clientId": "client-a",
        "clientSecret": "s3cret",
        "tenantId": "tenant-a",
        "username": "svc@contoso.com",
        "password": "hunter2",
        "enable": enable,
        "refreshInterval": 60,
        "requestTimeout": 120,
        "assetFilter": [[{"parameter": "building", "regex": "^HQ$"}]],
        "projectIDs": ["proj-1"]
    })
    .to_string()
}

#[tokio::test]
async fn configuration_crud_roundtrip() {
    let pool = test_pool().await;
    let server = MockServer::start().await;
    let router = test_router(pool, &server);

    // Create
    let response = send(
        &router,
        Request::post("/v1/configs")
            .header("content-type", "application/json")
            .body(Body::from(config_body(true)))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["clientId"], json!("client-a"));
    assert_eq!(created["active"], json!(false));
    assert_eq!(created["assetFilter"][0][0]["parameter"], json!("building"));

    // Read
    let response = send(
        &router,
        Request::get(format!("/v1/configs/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched["projectIDs"], json!(["proj-1"]));

    // List
    let response = send(&router, Request::get("/v1/configs").body(Body::empty()).unwrap()).await;
    let listed = body_json(response).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    // Update
    let response = send(
        &router,
        Request::put(format!("/v1/configs/{id}"))
            .header("content-type", "application/json")
            .body(Body::from(config_body(false)))
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["enable"], json!(false));

    // Delete
    let response = send(
        &router,
        Request::delete(format!("/v1/configs/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Gone
    let response = send(
        &router,
        Request::get(format!("/v1/configs/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_configuration_is_a_404() {
    let pool = test_pool().await;
    let server = MockServer::start().await;
    let router = test_router(pool, &server);

    for request in [
        Request::get("/v1/configs/12345").body(Body::empty()).unwrap(),
        Request::delete("/v1/configs/12345").body(Body::empty()).unwrap(),
    ] {
        let response = send(&router, request).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
