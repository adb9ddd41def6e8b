//! Tenant configuration entity model.
//!
//! One row per directory tenant: credential material, collection settings and
//! the declarative asset filter. `active` mirrors whether the collector is
//! currently gathering for this configuration; it is flipped by the collector
//! only, never by the API.

use graphsync_core::FilterRule;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

/// A tenant configuration record.
#[derive(Debug, Clone, FromRow)]
pub struct Configuration {
    pub id: i64,
    /// OAuth2 application (client) id.
    pub client_id: String,
    /// Client secret for app-only access.
    pub client_secret: Option<String>,
    /// Directory (tenant) id.
    pub tenant_id: String,
    /// Service account for resource-owner-password collection.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Whether this configuration should be collected at all.
    pub enable: bool,
    /// Seconds between collection passes.
    pub refresh_interval: i32,
    /// Per-request timeout in seconds.
    pub request_timeout: i32,
    /// OR-of-AND-groups filter applied to discovered resources.
    pub asset_filter: Json<Vec<Vec<FilterRule>>>,
    /// Set while the collector is gathering for this configuration.
    pub active: bool,
    /// Platform projects the discovered assets are mirrored into.
    pub project_ids: Vec<String>,
}

/// Input for creating or replacing a configuration.
#[derive(Debug, Clone)]
pub struct NewConfiguration {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub tenant_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub enable: bool,
    pub refresh_interval: i32,
    pub request_timeout: i32,
    pub asset_filter: Vec<Vec<FilterRule>>,
    pub project_ids: Vec<String>,
}

impl Configuration {
    /// Insert a new configuration. `active` starts false; the collector flips
    /// it on its first enabled tick.
    pub async fn insert(pool: &PgPool, input: NewConfiguration) -> Result<Self, sqlx::Error> {
        sqlx::query_as(
            r"
            INSERT INTO configuration (
                client_id, client_secret, tenant_id, username, password,
                enable, refresh_interval, request_timeout, asset_filter, project_ids
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            ",
        )
        .bind(&input.client_id)
        .bind(&input.client_secret)
        .bind(&input.tenant_id)
        .bind(&input.username)
        .bind(&input.password)
        .bind(input.enable)
        .bind(input.refresh_interval)
        .bind(input.request_timeout)
        .bind(Json(&input.asset_filter))
        .bind(&input.project_ids)
        .fetch_one(pool)
        .await
    }

    /// Fetch a configuration by id.
    pub async fn get(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM configuration WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Replace a configuration. `active` is left untouched.
    pub async fn update(
        pool: &PgPool,
        id: i64,
        input: NewConfiguration,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as(
            r"
            UPDATE configuration SET
                client_id = $2, client_secret = $3, tenant_id = $4,
                username = $5, password = $6, enable = $7,
                refresh_interval = $8, request_timeout = $9,
                asset_filter = $10, project_ids = $11
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(&input.client_id)
        .bind(&input.client_secret)
        .bind(&input.tenant_id)
        .bind(&input.username)
        .bind(&input.password)
        .bind(input.enable)
        .bind(input.refresh_interval)
        .bind(input.request_timeout)
        .bind(Json(&input.asset_filter))
        .bind(&input.project_ids)
        .fetch_optional(pool)
        .await
    }

    /// Delete a configuration. Returns false when the id is unknown.
    pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM configuration WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All configurations, enabled or not.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM configuration ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Enabled configurations only.
    pub async fn get_enabled(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM configuration WHERE enable ORDER BY id")
            .fetch_all(pool)
            .await
    }

    /// Enabled configurations collecting for the given platform project.
    pub async fn get_enabled_for_project(
        pool: &PgPool,
        project_id: &str,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM configuration WHERE enable AND $1 = ANY(project_ids) ORDER BY id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Flip the collector-owned `active` flag.
    pub async fn set_active(pool: &PgPool, id: i64, active: bool) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE configuration SET active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Borrow the filter rule groups.
    #[must_use]
    pub fn filter_rules(&self) -> &[Vec<FilterRule>] {
        &self.asset_filter.0
    }
}
