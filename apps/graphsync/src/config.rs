//! Application configuration loaded from environment variables.
//!
//! Required variables must be present and valid or the process exits with a
//! clear message before anything else starts.

use std::env;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string.
    pub database_url: String,
    /// Port the API server binds to.
    pub api_server_port: u16,
    /// Base URL of the Eliona API.
    pub api_endpoint: String,
    /// Token for the Eliona API.
    pub api_token: String,
    /// Default tracing filter.
    pub rust_log: String,
}

impl Config {
    /// Load from the environment, fail-fast on missing required values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;
        let api_endpoint =
            env::var("API_ENDPOINT").map_err(|_| ConfigError::Missing("API_ENDPOINT"))?;
        let api_token = env::var("API_TOKEN").map_err(|_| ConfigError::Missing("API_TOKEN"))?;

        let port_raw = env::var("API_SERVER_PORT").unwrap_or_else(|_| "3000".to_string());
        let api_server_port = port_raw.parse().map_err(|_| ConfigError::Invalid {
            name: "API_SERVER_PORT",
            value: port_raw,
        })?;

        Ok(Self {
            database_url,
            api_server_port,
            api_endpoint,
            api_token,
            rust_log: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}
