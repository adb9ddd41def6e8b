//! Listing tests: pagination to exhaustion, per-item filtering,
//! deduplication by stable identifier, and equipment purpose checks.

mod common;

use common::*;
use graphsync_core::FilterRule;
use graphsync_msgraph::GraphError;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn building_filter(pattern: &str) -> Vec<Vec<FilterRule>> {
    vec![vec![FilterRule {
        parameter: "building".to_string(),
        regex: pattern.to_string(),
    }]]
}

#[tokio::test]
async fn rooms_are_paginated_to_exhaustion_and_deduplicated() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let rooms_url = format!("{}/v1.0/places/microsoft.graph.room", server.uri());
    let pages = vec![
        odata_page(
            vec![
                graph_room("HQ-101", "hq101@contoso.com", "HQ"),
                graph_room("HQ-102", "hq102@contoso.com", "HQ"),
            ],
            Some(rooms_url.clone()),
        ),
        odata_page(
            vec![
                // Same mailbox seen again on a later page: must overwrite.
                graph_room("HQ-101 renamed", "hq101@contoso.com", "HQ"),
                graph_room("HQ-201", "hq201@contoso.com", "HQ"),
            ],
            None,
        ),
    ];

    Mock::given(method("GET"))
        .and(path("/v1.0/places/microsoft.graph.room"))
        .respond_with(PaginatedResponder::new(pages))
        .mount(&server)
        .await;

    let client = ropc_client(&server);
    let rooms = client.list_rooms(&[]).await.unwrap();

    assert_eq!(rooms.len(), 3);
    let renamed = rooms
        .iter()
        .find(|r| r.email_address.as_deref() == Some("hq101@contoso.com"))
        .unwrap();
    assert_eq!(renamed.display_name.as_deref(), Some("HQ-101 renamed"));
}

#[tokio::test]
async fn rooms_are_filtered_per_item() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let pages = vec![odata_page(
        vec![
            graph_room("HQ-101", "hq101@contoso.com", "HQ"),
            graph_room("Annex-5", "annex5@contoso.com", "Annex"),
        ],
        None,
    )];
    Mock::given(method("GET"))
        .and(path("/v1.0/places/microsoft.graph.room"))
        .respond_with(PaginatedResponder::new(pages))
        .mount(&server)
        .await;

    let client = ropc_client(&server);
    let rooms = client.list_rooms(&building_filter("^HQ$")).await.unwrap();

    assert_eq!(rooms.len(), 1);
    assert_eq!(rooms[0].email_address.as_deref(), Some("hq101@contoso.com"));
}

#[tokio::test]
async fn empty_filtered_result_is_not_an_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let pages = vec![odata_page(
        vec![graph_room("Annex-5", "annex5@contoso.com", "Annex")],
        None,
    )];
    Mock::given(method("GET"))
        .and(path("/v1.0/places/microsoft.graph.room"))
        .respond_with(PaginatedResponder::new(pages))
        .mount(&server)
        .await;

    let client = ropc_client(&server);
    let rooms = client.list_rooms(&building_filter("^HQ$")).await.unwrap();
    assert!(rooms.is_empty());
}

#[tokio::test]
async fn malformed_filter_rule_aborts_the_listing() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let pages = vec![odata_page(
        vec![graph_room("HQ-101", "hq101@contoso.com", "HQ")],
        None,
    )];
    Mock::given(method("GET"))
        .and(path("/v1.0/places/microsoft.graph.room"))
        .respond_with(PaginatedResponder::new(pages))
        .mount(&server)
        .await;

    let client = ropc_client(&server);
    let err = client
        .list_rooms(&building_filter("([unclosed"))
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Filter(_)));
}

#[tokio::test]
async fn equipment_listing_keeps_equipment_mailboxes_only() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let users_page = odata_page(
        vec![
            json!({"userPrincipalName": "beamer@contoso.com", "displayName": "Beamer"}),
            json!({"userPrincipalName": "alice@contoso.com", "displayName": "Alice"}),
            json!({"userPrincipalName": "broken@contoso.com", "displayName": "Broken"}),
        ],
        None,
    );
    Mock::given(method("GET"))
        .and(path("/v1.0/users"))
        .respond_with(PaginatedResponder::new(vec![users_page]))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/users/beamer@contoso.com/mailboxSettings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userPurpose": "equipment"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1.0/users/alice@contoso.com/mailboxSettings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userPurpose": "user"})))
        .mount(&server)
        .await;
    // A mailbox whose settings cannot be read is skipped, not fatal.
    Mock::given(method("GET"))
        .and(path("/v1.0/users/broken@contoso.com/mailboxSettings"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"code": "InternalServerError", "message": "boom"}
        })))
        .mount(&server)
        .await;

    let client = ropc_client(&server);
    let equipment = client.list_equipment(&[]).await.unwrap();

    assert_eq!(equipment.len(), 1);
    assert_eq!(
        equipment[0].email_address.as_deref(),
        Some("beamer@contoso.com")
    );
}

#[tokio::test]
async fn remote_listing_failure_surfaces_the_odata_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1.0/places/microsoft.graph.room"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": "ErrorAccessDenied", "message": "Access is denied."}
        })))
        .mount(&server)
        .await;

    let client = ropc_client(&server);
    let err = client.list_rooms(&[]).await.unwrap_err();
    match err {
        GraphError::Api { code, .. } => assert_eq!(code, "ErrorAccessDenied"),
        other => panic!("unexpected error: {other:?}"),
    }
}
