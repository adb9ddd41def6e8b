//! Platform asset mirroring.
//!
//! Discovered resources are mirrored into the platform once per configured
//! project: a shared root asset, one child asset per resource. The
//! asset-identity mapping is consulted before every create so an asset is
//! made exactly once per `(configuration, project, resource)` and reused
//! afterwards.

use async_trait::async_trait;
use graphsync_core::GraphResource;
use graphsync_db::{AssetMapping, Configuration, NewAssetMapping};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::CollectError;

/// Asset type of the per-project root asset.
pub const ROOT_ASSET_TYPE: &str = "microsoft_365_root";

/// Everything the platform needs to create or update an asset.
#[derive(Debug, Clone)]
pub struct AssetDescriptor {
    pub project_id: String,
    /// Stable identifier of the mirrored resource.
    pub identifier: String,
    pub asset_type: String,
    pub name: String,
    pub description: String,
    /// Locational parent, the per-project root for resources.
    pub parent_asset_id: Option<i32>,
}

/// Error reported by the platform asset API.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AssetError(pub String);

/// Boundary to the platform's asset API.
///
/// The binary implements this against the real platform; tests substitute a
/// recording mock.
#[async_trait]
pub trait AssetBackend: Send + Sync {
    /// Create or update an asset, returning its platform id.
    async fn upsert_asset(&self, descriptor: AssetDescriptor) -> Result<i32, AssetError>;

    /// Push the current attribute payload of an existing asset.
    async fn upsert_asset_data(
        &self,
        asset_id: i32,
        payload: serde_json::Value,
    ) -> Result<(), AssetError>;
}

fn root_descriptor(project_id: &str) -> AssetDescriptor {
    AssetDescriptor {
        project_id: project_id.to_string(),
        identifier: ROOT_ASSET_TYPE.to_string(),
        asset_type: ROOT_ASSET_TYPE.to_string(),
        name: "Microsoft 365".to_string(),
        description: "Root asset for Microsoft 365 places".to_string(),
        parent_asset_id: None,
    }
}

fn resource_descriptor(
    resource: &dyn GraphResource,
    project_id: &str,
    identifier: &str,
    root_id: i32,
) -> AssetDescriptor {
    let name = resource
        .display_name()
        .or_else(|| resource.email_address())
        .unwrap_or(identifier)
        .to_string();
    let email = resource.email_address().unwrap_or_default();
    AssetDescriptor {
        project_id: project_id.to_string(),
        identifier: identifier.to_string(),
        asset_type: resource.asset_type().to_string(),
        description: format!("{name} ({email})"),
        name,
        parent_asset_id: Some(root_id),
    }
}

/// Resolve-or-create one asset, recording a fresh mapping on create.
async fn ensure_one(
    pool: &PgPool,
    backend: &dyn AssetBackend,
    configuration_id: i64,
    descriptor: AssetDescriptor,
    email: &str,
) -> Result<i32, CollectError> {
    if let Some(existing) = AssetMapping::find_asset_id(
        pool,
        configuration_id,
        &descriptor.project_id,
        &descriptor.identifier,
    )
    .await?
    {
        return Ok(existing);
    }

    let project_id = descriptor.project_id.clone();
    let identifier = descriptor.identifier.clone();
    let asset_id = backend.upsert_asset(descriptor).await?;
    AssetMapping::record(
        pool,
        NewAssetMapping {
            configuration_id,
            project_id: project_id.clone(),
            identifier: identifier.clone(),
            asset_id,
            email: email.to_string(),
        },
    )
    .await?;
    debug!(project_id = %project_id, identifier = %identifier, "created new asset");
    Ok(asset_id)
}

/// Ensure platform assets exist for every project × resource.
///
/// A failing root aborts the pass; a failing resource aborts that resource
/// only, the rest of the pass continues.
pub async fn ensure_assets(
    pool: &PgPool,
    backend: &dyn AssetBackend,
    config: &Configuration,
    resources: &[&dyn GraphResource],
) -> Result<(), CollectError> {
    for project_id in &config.project_ids {
        let root_id = ensure_one(pool, backend, config.id, root_descriptor(project_id), "").await?;

        for resource in resources {
            let Some(identifier) = resource.stable_id() else {
                continue;
            };
            let email = resource.email_address().unwrap_or_default().to_string();
            let descriptor = resource_descriptor(*resource, project_id, &identifier, root_id);
            if let Err(e) = ensure_one(pool, backend, config.id, descriptor, &email).await {
                error!(
                    config_id = config.id,
                    identifier = %identifier,
                    error = %e,
                    "ensuring asset failed, resource skipped this pass"
                );
            }
        }
    }
    Ok(())
}

/// Push the attribute payload of every mirrored resource.
pub async fn upsert_data(
    pool: &PgPool,
    backend: &dyn AssetBackend,
    config: &Configuration,
    resources: &[&dyn GraphResource],
) -> Result<(), CollectError> {
    for project_id in &config.project_ids {
        for resource in resources {
            let Some(identifier) = resource.stable_id() else {
                continue;
            };
            let Some(asset_id) =
                AssetMapping::find_asset_id(pool, config.id, project_id, &identifier).await?
            else {
                warn!(
                    config_id = config.id,
                    identifier = %identifier,
                    "no asset id recorded, data skipped"
                );
                continue;
            };
            backend.upsert_asset_data(asset_id, resource.payload()).await?;
        }
    }
    Ok(())
}
