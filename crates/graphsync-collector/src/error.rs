//! Collector error type.

use thiserror::Error;

use crate::assets::AssetError;

/// Failures of a single configuration's collection pass.
///
/// These never cross the configuration boundary: the orchestrator logs them
/// and waits for the next scheduled tick.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The stored configuration is unusable (missing credential material).
    #[error("configuration error: {0}")]
    Config(String),

    /// Reading or writing the configuration/mapping store failed.
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    /// A directory call failed.
    #[error(transparent)]
    Graph(#[from] graphsync_msgraph::GraphError),

    /// The platform asset API rejected an upsert.
    #[error("asset upsert failed: {0}")]
    Asset(#[from] AssetError),
}
