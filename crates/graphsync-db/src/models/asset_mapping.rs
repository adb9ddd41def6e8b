//! Asset-identity mapping entity model.
//!
//! Remembers which platform asset mirrors a discovered resource, keyed by
//! `(configuration, project, stable identifier)`. A mapping is written once
//! on first upsert and never changes afterwards; every collection pass reads
//! it to decide create-vs-reuse.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

/// One resource-to-asset mapping record.
#[derive(Debug, Clone, FromRow)]
pub struct AssetMapping {
    pub id: i64,
    pub configuration_id: i64,
    pub project_id: String,
    /// Stable identifier of the resource, `"<asset_type>_<email>"`.
    pub identifier: String,
    /// Platform asset id assigned on first upsert.
    pub asset_id: i32,
    /// The resource's directory mail address, kept for booking lookups.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Input for recording a new mapping.
#[derive(Debug, Clone)]
pub struct NewAssetMapping {
    pub configuration_id: i64,
    pub project_id: String,
    pub identifier: String,
    pub asset_id: i32,
    pub email: String,
}

impl AssetMapping {
    /// Platform asset id for the key triple, if one was recorded.
    pub async fn find_asset_id(
        pool: &PgPool,
        configuration_id: i64,
        project_id: &str,
        identifier: &str,
    ) -> Result<Option<i32>, sqlx::Error> {
        let row: Option<(i32,)> = sqlx::query_as(
            r"
            SELECT asset_id FROM asset_mapping
            WHERE configuration_id = $1 AND project_id = $2 AND identifier = $3
            ",
        )
        .bind(configuration_id)
        .bind(project_id)
        .bind(identifier)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Record a mapping. The first write for a key triple wins; a concurrent
    /// duplicate is ignored so the asset id never changes once assigned.
    pub async fn record(pool: &PgPool, input: NewAssetMapping) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"
            INSERT INTO asset_mapping (configuration_id, project_id, identifier, asset_id, email)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (configuration_id, project_id, identifier) DO NOTHING
            ",
        )
        .bind(input.configuration_id)
        .bind(&input.project_id)
        .bind(&input.identifier)
        .bind(input.asset_id)
        .bind(&input.email)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Reverse lookup by platform asset id, used by the booking endpoints to
    /// resolve the room address and owning configuration.
    pub async fn get_by_asset_id(
        pool: &PgPool,
        asset_id: i32,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM asset_mapping WHERE asset_id = $1")
            .bind(asset_id)
            .fetch_optional(pool)
            .await
    }
}
