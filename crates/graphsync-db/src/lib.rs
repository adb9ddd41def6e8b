//! graphsync database layer
//!
//! Postgres persistence for tenant configurations and the asset-identity
//! mapping. Models are plain `FromRow` structs owning their queries; schema
//! changes ship as embedded migrations.

pub mod migrations;
pub mod models;

pub use models::asset_mapping::{AssetMapping, NewAssetMapping};
pub use models::configuration::{Configuration, NewConfiguration};
