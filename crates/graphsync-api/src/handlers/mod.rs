//! HTTP request handlers.

pub mod bookings;
pub mod configs;
pub mod proxy;
