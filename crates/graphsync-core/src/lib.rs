//! graphsync core library
//!
//! Shared types for the graphsync connector:
//!
//! - [`filter`] - Declarative asset filter engine (OR of AND-groups of regex rules)
//! - [`model`] - Normalized room/equipment value types discovered from the directory

pub mod filter;
pub mod model;

pub use filter::{matches, FilterError, FilterRule};
pub use model::{BookingType, Equipment, GeoCoordinates, GraphResource, PhysicalAddress, Room};
