use tokio::sync::Mutex;

use super::exchange;
use super::types::{AccessData, Credentials};
use crate::error::Result;
use crate::rest_client::RestClient;

/// Authentication manager
/// Holds the credential variant and the lazily fetched access token
pub struct AuthManager {
    /// Fixed at construction
    credentials: Credentials,

    /// Token obtained by exchange; held locked across the exchange so racing
    /// callers wait for the first fetch instead of starting their own
    access_data: Mutex<Option<AccessData>>,
}

impl AuthManager {
    pub fn new(credentials: Credentials) -> Self {
        tracing::debug!(long_lived = credentials.is_long_lived(), "Auth manager created");
        Self {
            credentials,
            access_data: Mutex::new(None),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Get the active access token, exchanging credentials on first use
    ///
    /// A long-lived token is returned as-is. An exchanged token is cached for
    /// the lifetime of the manager and never refreshed.
    pub async fn get_access_token(&self, rest: &RestClient) -> Result<String> {
        let (client_id, client_secret) = match &self.credentials {
            Credentials::AccessToken(token) => return Ok(token.clone()),
            Credentials::AppCredentials {
                client_id,
                client_secret,
            } => (client_id, client_secret),
        };

        let mut cached = self.access_data.lock().await;
        if let Some(ref data) = *cached {
            return Ok(data.access_token.clone());
        }

        let data = exchange::exchange_client_credentials(rest, client_id, client_secret).await?;
        let token = data.access_token.clone();
        tracing::debug!(
            "Caching access token ({}...)",
            token.chars().take(8).collect::<String>()
        );
        *cached = Some(data);

        Ok(token)
    }

    /// Non-empty long-lived token, if that is what the credentials hold
    pub fn long_lived_token(&self) -> Option<&str> {
        match &self.credentials {
            Credentials::AccessToken(token) if !token.is_empty() => Some(token),
            _ => None,
        }
    }

    /// Full token endpoint response, once a token has been exchanged
    pub async fn access_data(&self) -> Option<AccessData> {
        self.access_data.lock().await.clone()
    }
}
