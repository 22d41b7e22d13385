// Credential resolution from loosely typed sources

use crate::error::{ApiError, Result};

use super::types::Credentials;

impl Credentials {
    /// Resolve credentials from a list of initialization values
    ///
    /// One value is a long-lived access token, two values are
    /// `client_id` and `client_secret`. Any other count is rejected.
    pub fn from_args<S: AsRef<str>>(values: &[S]) -> Result<Self> {
        match values {
            [token] => {
                tracing::debug!("Using long-lived access token");
                Ok(Credentials::access_token(token.as_ref()))
            }
            [client_id, client_secret] => {
                tracing::debug!(client_id = client_id.as_ref(), "Using application credentials");
                Ok(Credentials::app(client_id.as_ref(), client_secret.as_ref()))
            }
            _ => Err(ApiError::ConfigError(format!(
                "Invalid arguments ({} given). Use CLIENT_ID and CLIENT_SECRET, or ACCESS_TOKEN",
                values.len()
            ))),
        }
    }
}
