//! Bearer-authenticated HTTP client with OData pagination and error decoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::auth::{Credentials, DeviceCodeGrant, GraphEnvironment, TokenProvider};
use crate::{GraphError, GraphResult};

/// OData error response body.
#[derive(Debug, Deserialize)]
struct ODataError {
    error: ODataErrorBody,
}

#[derive(Debug, Deserialize)]
struct ODataErrorBody {
    code: String,
    message: String,
}

/// Wrapper for paginated Graph responses.
#[derive(Debug, Deserialize)]
pub struct ODataResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
}

/// Microsoft Graph client bound to one credential set.
#[derive(Debug)]
pub struct GraphClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    env: GraphEnvironment,
}

impl GraphClient {
    /// Creates a client for the given credentials.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::AuthInit`] on empty client/tenant ids or when
    /// the HTTP client cannot be created.
    pub fn new(
        credentials: Credentials,
        env: GraphEnvironment,
        request_timeout: Duration,
    ) -> GraphResult<Self> {
        if credentials.client_id().is_empty() || credentials.tenant_id().is_empty() {
            return Err(GraphError::AuthInit(
                "client id and tenant id must not be empty".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| GraphError::AuthInit(format!("failed to create HTTP client: {e}")))?;
        let tokens = TokenProvider::new(credentials, env.clone(), http.clone());
        Ok(Self { http, tokens, env })
    }

    /// True when the client runs as an interactively authorized user.
    #[must_use]
    pub fn is_delegated(&self) -> bool {
        self.tokens.credentials().is_delegated()
    }

    /// Versioned Graph base URL.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}/v1.0", self.env.graph_base)
    }

    /// A fresh bearer token for out-of-band use (the tenant proxy).
    pub async fn bearer_token(&self) -> GraphResult<String> {
        self.tokens.get_token().await
    }

    /// Starts the interactive device-code flow.
    pub async fn begin_device_flow(&self) -> GraphResult<DeviceCodeGrant> {
        self.tokens.begin_device_flow().await
    }

    /// Polls until the device-code sign-in completes; see
    /// [`TokenProvider::poll_device_token`].
    pub async fn poll_device_token(&self, grant: &DeviceCodeGrant) -> GraphResult<()> {
        self.tokens.poll_device_token(grant).await
    }

    /// GET with token injection and OData error decoding.
    #[instrument(skip(self))]
    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let token = self.tokens.get_token().await?;
        let response = self.http.get(url).bearer_auth(&token).send().await?;
        Self::decode(response).await
    }

    /// POST with token injection; `headers` carries extras such as `Prefer`.
    #[instrument(skip(self, body, headers))]
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
        headers: &[(&str, String)],
    ) -> GraphResult<T> {
        let token = self.tokens.get_token().await?;
        let mut request = self.http.post(url).bearer_auth(&token).json(body);
        for (name, value) in headers {
            request = request.header(*name, value.clone());
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    /// DELETE with token injection; success carries no body.
    #[instrument(skip(self))]
    pub async fn delete(&self, url: &str) -> GraphResult<()> {
        let token = self.tokens.get_token().await?;
        let response = self.http.delete(url).bearer_auth(&token).send().await?;
        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::decode_error(response).await)
    }

    /// Fetches every page of a listing, handing each page to `callback`,
    /// until no `@odata.nextLink` remains.
    #[instrument(skip(self, callback))]
    pub async fn get_paginated<T, F>(&self, initial_url: &str, mut callback: F) -> GraphResult<()>
    where
        T: DeserializeOwned,
        F: FnMut(Vec<T>) -> GraphResult<()>,
    {
        let mut url = initial_url.to_string();
        loop {
            debug!("fetching page: {}", url);
            let response: ODataResponse<T> = self.get(&url).await?;
            callback(response.value)?;
            match response.next_link {
                Some(next) => url = next,
                None => return Ok(()),
            }
        }
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GraphResult<T> {
        if response.status().is_success() {
            return response.json().await.map_err(GraphError::from);
        }
        Err(Self::decode_error(response).await)
    }

    async fn decode_error(response: reqwest::Response) -> GraphError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if let Ok(odata) = serde_json::from_str::<ODataError>(&body) {
            return GraphError::Api {
                code: odata.error.code,
                message: odata.error.message,
            };
        }
        GraphError::Api {
            code: status.to_string(),
            message: body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odata_error_parsing() {
        let json = r#"{
            "error": {
                "code": "Request_ResourceNotFound",
                "message": "Resource not found"
            }
        }"#;
        let error: ODataError = serde_json::from_str(json).unwrap();
        assert_eq!(error.error.code, "Request_ResourceNotFound");
        assert_eq!(error.error.message, "Resource not found");
    }

    #[test]
    fn odata_response_parsing() {
        let json = r#"{
            "value": [{"id": "1"}, {"id": "2"}],
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/places?$skiptoken=xxx"
        }"#;

        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct TestItem {
            id: String,
        }

        let response: ODataResponse<TestItem> = serde_json::from_str(json).unwrap();
        assert_eq!(response.value.len(), 2);
        assert!(response.next_link.is_some());
    }

    #[test]
    fn empty_ids_are_rejected() {
        let credentials = Credentials::DeviceCode {
            client_id: String::new(),
            tenant_id: "t".into(),
        };
        let err = GraphClient::new(
            credentials,
            GraphEnvironment::default(),
            Duration::from_secs(10),
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::AuthInit(_)));
    }
}
