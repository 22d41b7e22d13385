// Authentication types

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Credential set a client is built with
///
/// Exactly one variant is held per client and it never changes afterwards.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Pre-issued token used as-is
    AccessToken(String),

    /// Application credentials exchanged for a token on first use
    AppCredentials {
        client_id: String,
        client_secret: String,
    },
}

impl Credentials {
    pub fn access_token(token: impl Into<String>) -> Self {
        Credentials::AccessToken(token.into())
    }

    pub fn app(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Credentials::AppCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn is_long_lived(&self) -> bool {
        matches!(self, Credentials::AccessToken(_))
    }
}

// Secrets never reach logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::AccessToken(_) => f.debug_tuple("AccessToken").field(&"<redacted>").finish(),
            Credentials::AppCredentials { client_id, .. } => f
                .debug_struct("AppCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

/// Token obtained from the OAuth endpoint
#[derive(Debug, Clone)]
pub struct AccessData {
    pub access_token: String,

    /// Full token endpoint response
    pub raw_response: Value,

    pub obtained_at: DateTime<Utc>,
}

/// Fields read from a successful token exchange
#[derive(Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
}

/// Error body returned by the token endpoint
#[derive(Deserialize)]
pub(super) struct TokenErrorResponse {
    pub message: Option<String>,
    pub error: Option<String>,
}
