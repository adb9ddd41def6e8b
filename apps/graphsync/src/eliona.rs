//! Eliona platform backend.
//!
//! Implements the collector's asset boundary against the Eliona v2 API:
//! asset upserts keyed by project + global asset identifier, and attribute
//! data pushes for existing assets.

use async_trait::async_trait;
use graphsync_collector::{AssetBackend, AssetDescriptor, AssetError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiAsset<'a> {
    project_id: &'a str,
    global_asset_identifier: &'a str,
    name: &'a str,
    asset_type: &'a str,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent_locational_asset_id: Option<i32>,
    is_tracker: bool,
}

#[derive(Debug, Deserialize)]
struct CreatedAsset {
    id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiAssetData<'a> {
    asset_id: i32,
    data: &'a Value,
}

/// HTTP client for the Eliona asset API.
#[derive(Debug)]
pub struct ElionaBackend {
    http: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl ElionaBackend {
    pub fn new(base_url: String, api_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }

    async fn check(response: reqwest::Response, context: &str) -> Result<reqwest::Response, AssetError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(AssetError(format!("{context}: status {status}: {body}")))
    }
}

#[async_trait]
impl AssetBackend for ElionaBackend {
    async fn upsert_asset(&self, descriptor: AssetDescriptor) -> Result<i32, AssetError> {
        let asset = ApiAsset {
            project_id: &descriptor.project_id,
            global_asset_identifier: &descriptor.identifier,
            name: &descriptor.name,
            asset_type: &descriptor.asset_type,
            description: &descriptor.description,
            parent_locational_asset_id: descriptor.parent_asset_id,
            is_tracker: false,
        };
        let response = self
            .http
            .put(format!("{}/v2/assets", self.base_url))
            .header("X-API-Key", &self.api_token)
            .json(&asset)
            .send()
            .await
            .map_err(|e| AssetError(format!("upserting asset: {e}")))?;
        let response = Self::check(response, "upserting asset").await?;
        let created: CreatedAsset = response
            .json()
            .await
            .map_err(|e| AssetError(format!("decoding asset response: {e}")))?;
        debug!(
            identifier = %descriptor.identifier,
            asset_id = created.id,
            "asset upserted"
        );
        Ok(created.id)
    }

    async fn upsert_asset_data(&self, asset_id: i32, payload: Value) -> Result<(), AssetError> {
        let data = ApiAssetData {
            asset_id,
            data: &payload,
        };
        let response = self
            .http
            .put(format!("{}/v2/asset-data", self.base_url))
            .header("X-API-Key", &self.api_token)
            .json(&data)
            .send()
            .await
            .map_err(|e| AssetError(format!("upserting asset data: {e}")))?;
        Self::check(response, "upserting asset data").await?;
        Ok(())
    }
}
