//! Microsoft Graph client for graphsync
//!
//! Wraps credential acquisition and the Graph endpoints the connector needs:
//!
//! - OAuth2 token flows: client credentials, resource owner password, and the
//!   interactive device-code grant (RFC 8628)
//! - Paginated OData queries with error decoding
//! - Room and equipment discovery with declarative filtering
//! - Batch free/busy schedule lookup
//! - Calendar event (booking) operations for delegated sessions
//!
//! # Example
//!
//! ```no_run
//! use graphsync_msgraph::{Credentials, GraphClient, GraphEnvironment};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let credentials = Credentials::UsernamePassword {
//!     client_id: "client".into(),
//!     tenant_id: "tenant".into(),
//!     username: "collector@contoso.com".into(),
//!     password: "secret".to_string().into(),
//! };
//! let client = GraphClient::new(credentials, GraphEnvironment::default(), Duration::from_secs(120))?;
//! let rooms = client.list_rooms(&[]).await?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod bookings;
mod client;
mod error;
mod places;
mod schedule;

pub use auth::{Credentials, DeviceCodeGrant, GraphEnvironment, TokenProvider};
pub use bookings::Booking;
pub use client::{GraphClient, ODataResponse};
pub use error::{GraphError, GraphResult};
pub use schedule::DateTimeTimeZone;
