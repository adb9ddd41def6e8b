//! Error types for the Graph client.

use thiserror::Error;

/// Result type alias using [`GraphError`].
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur when talking to Microsoft Graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Malformed credential material or provider rejection during setup.
    #[error("authentication initialization failed: {0}")]
    AuthInit(String),

    /// Token endpoint rejected the request.
    #[error("token request failed: {0}")]
    Token(String),

    /// Graph returned an OData error body.
    #[error("Graph API error: {code} - {message}")]
    Api { code: String, message: String },

    /// Transport-level HTTP failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A filter rule could not be evaluated against a discovered resource.
    #[error(transparent)]
    Filter(#[from] graphsync_core::FilterError),

    /// The user denied the device-code authorization request.
    #[error("user declined the authorization request")]
    AuthorizationDeclined,

    /// The device code expired before the user completed authorization.
    #[error("device code expired before authorization completed")]
    CodeExpired,

    /// A delegated call was made before the device-code flow finished.
    #[error("delegated authorization has not completed yet")]
    NotAuthorized,
}
