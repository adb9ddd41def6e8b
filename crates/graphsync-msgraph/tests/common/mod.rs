//! Common test utilities for graphsync-msgraph integration tests.

use graphsync_msgraph::{Credentials, GraphClient, GraphEnvironment};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Respond, ResponseTemplate};

/// Environment with both login and Graph traffic pointed at the mock server.
pub fn test_environment(server: &MockServer) -> GraphEnvironment {
    GraphEnvironment {
        login_base: server.uri(),
        graph_base: server.uri(),
    }
}

/// Client using the resource-owner-password grant against the mock server.
pub fn ropc_client(server: &MockServer) -> GraphClient {
    let credentials = Credentials::UsernamePassword {
        client_id: "client-a".to_string(),
        tenant_id: "tenant-a".to_string(),
        username: "collector@contoso.com".to_string(),
        password: "secret".to_string().into(),
    };
    GraphClient::new(credentials, test_environment(server), Duration::from_secs(5)).unwrap()
}

/// Client using the device-code grant against the mock server.
pub fn device_client(server: &MockServer) -> GraphClient {
    let credentials = Credentials::DeviceCode {
        client_id: "client-a".to_string(),
        tenant_id: "tenant-a".to_string(),
    };
    GraphClient::new(credentials, test_environment(server), Duration::from_secs(5)).unwrap()
}

/// Mounts a token endpoint handing out one static app token.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/tenant-a/oauth2/v2.0/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "app-token",
            "expires_in": 3600,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}

/// Responder serving a fixed sequence of pages, one per request.
pub struct PaginatedResponder {
    pages: Vec<Value>,
    current: Arc<AtomicUsize>,
}

impl PaginatedResponder {
    pub fn new(pages: Vec<Value>) -> Self {
        Self {
            pages,
            current: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl Respond for PaginatedResponder {
    fn respond(&self, _request: &wiremock::Request) -> ResponseTemplate {
        let idx = self.current.fetch_add(1, Ordering::SeqCst);
        if idx < self.pages.len() {
            ResponseTemplate::new(200).set_body_json(self.pages[idx].clone())
        } else {
            ResponseTemplate::new(200).set_body_json(json!({"value": []}))
        }
    }
}

/// Builds an OData page, optionally chaining to `next_link`.
pub fn odata_page(items: Vec<Value>, next_link: Option<String>) -> Value {
    match next_link {
        Some(next) => json!({"value": items, "@odata.nextLink": next}),
        None => json!({"value": items}),
    }
}

/// Test data factory for a Graph room.
pub fn graph_room(name: &str, email: &str, building: &str) -> Value {
    json!({
        "displayName": name,
        "emailAddress": email,
        "building": building,
        "capacity": 8,
        "bookingType": "standard",
        "isWheelChairAccessible": false,
        "tags": ["video"],
        "address": {"city": "Zurich", "street": "Mainstrasse 1"},
        "geoCoordinates": {"latitude": 47.37, "longitude": 8.54}
    })
}
