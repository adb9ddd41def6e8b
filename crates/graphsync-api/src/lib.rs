//! graphsync HTTP API
//!
//! Axum routers and handlers for the connector's outward surface:
//!
//! - configuration CRUD (thin pass-through to the store)
//! - booking endpoints, including the interactive device-code authorization
//! - the multi-tenant Graph proxy with header-scoped tenant selection

pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod sessions;

pub use error::ApiError;
pub use router::{api_router, ApiState};
pub use sessions::{AuthorizedSession, SessionStore};
