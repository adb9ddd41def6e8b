//! Request and response models for the graphsync API.

use graphsync_core::FilterRule;
use graphsync_db::{Configuration, NewConfiguration};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default collection interval in seconds.
const DEFAULT_REFRESH_INTERVAL: i32 = 60;

/// Default per-request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT: i32 = 120;

/// One tenant configuration as exposed over the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfiguration {
    /// Internal identifier, assigned on creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Flag to enable or disable collection for this configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable: Option<bool>,
    /// Interval in seconds for collecting data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<i32>,
    /// Timeout in seconds per directory request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<i32>,
    /// Array of rule groups: groups combine with OR, rules within a group
    /// with AND.
    #[serde(default)]
    #[schema(value_type = Vec<Vec<Object>>)]
    pub asset_filter: Vec<Vec<FilterRule>>,
    /// Set by the collector while the configuration is being collected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    /// Platform project ids this configuration collects for.
    #[serde(default, rename = "projectIDs", skip_serializing_if = "Option::is_none")]
    pub project_ids: Option<Vec<String>>,
}

impl From<Configuration> for ApiConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            id: Some(config.id),
            client_id: config.client_id,
            client_secret: config.client_secret,
            tenant_id: config.tenant_id,
            username: config.username,
            password: config.password,
            enable: Some(config.enable),
            refresh_interval: Some(config.refresh_interval),
            request_timeout: Some(config.request_timeout),
            asset_filter: config.asset_filter.0,
            active: Some(config.active),
            project_ids: Some(config.project_ids),
        }
    }
}

impl From<ApiConfiguration> for NewConfiguration {
    fn from(api: ApiConfiguration) -> Self {
        Self {
            client_id: api.client_id,
            client_secret: api.client_secret,
            tenant_id: api.tenant_id,
            username: api.username,
            password: api.password,
            enable: api.enable.unwrap_or(false),
            refresh_interval: api.refresh_interval.unwrap_or(DEFAULT_REFRESH_INTERVAL),
            request_timeout: api.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            asset_filter: api.asset_filter,
            project_ids: api.project_ids.unwrap_or_default(),
        }
    }
}

/// Query for the booking-authorization entry point.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizeQuery {
    /// Platform asset id of the room or equipment to authorize for.
    pub asset_id: String,
}

/// Query for listing bookings of an asset.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    pub asset_id: String,
    pub start: String,
    pub end: String,
}

/// Request body for creating a booking.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Device code of a previously authorized session.
    pub device_code: String,
    pub start: String,
    pub end: String,
    pub event_name: String,
}

/// Query for cancelling a booking.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteBookingQuery {
    /// Device code of a previously authorized session.
    pub device_code: String,
}

/// Request body for notifying an organizer that a guest arrived.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterGuestRequest {
    #[serde(default)]
    pub notification_recipient: Option<String>,
    pub message_en: String,
    #[serde(default)]
    pub message_de: Option<String>,
    #[serde(default)]
    pub message_fr: Option<String>,
    #[serde(default)]
    pub message_it: Option<String>,
}

/// One tenant's reply within a proxied fan-out response.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProxyResponseEntry {
    /// Configuration the call was made for.
    pub config_id: i64,
    /// Service account the call was authenticated as.
    pub username: String,
    /// Upstream HTTP status code.
    pub code: u16,
    /// Decoded upstream JSON body.
    #[schema(value_type = Object)]
    pub body: serde_json::Value,
}
