//! graphsync collector
//!
//! The periodic synchronization engine: one independent collection pass per
//! enabled tenant configuration, isolated failure per configuration, and
//! create-or-reuse mirroring of discovered resources into platform assets.

pub mod assets;
mod error;
mod orchestrator;

pub use assets::{AssetBackend, AssetDescriptor, AssetError};
pub use error::CollectError;
pub use orchestrator::Collector;
