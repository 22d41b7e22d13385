// Error handling module
// Defines the error taxonomy surfaced by the client

use thiserror::Error;

/// Errors that can occur while authenticating or dispatching a request
///
/// Non-2xx statuses from resource endpoints are NOT errors: they come back
/// inside [`RequestResult`](crate::rest_client::RequestResult) untouched.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid credentials or configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Token exchange rejected by the provider
    #[error("Authentication failed: {status} - {message}")]
    AuthError { status: u16, message: String },

    /// Network failure raised by the HTTP transport
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be parsed as JSON
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// True for failures raised by the transport itself
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_) | ApiError::Decode(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::AuthError { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ApiError>;
