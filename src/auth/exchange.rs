// OAuth client-credentials exchange

use chrono::Utc;
use reqwest::Method;

use super::types::{AccessData, TokenErrorResponse, TokenResponse};
use crate::error::{ApiError, Result};
use crate::rest_client::{Payload, RawResponse, RestClient};

/// Token endpoint path, resolved against the transport root
pub const TOKEN_PATH: &str = "/oauth/token";

/// Exchange application credentials for an access token
///
/// Anything but HTTP 200 is an authentication failure carrying the
/// provider's message and status.
pub async fn exchange_client_credentials(
    rest: &RestClient,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessData> {
    tracing::info!("Requesting access token via client credentials...");

    // Token endpoint takes form-urlencoded data
    let form = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("grant_type", "client_credentials"),
    ];

    // Raw path: a non-200 must become an auth failure even when the body
    // is not JSON (gateway error pages)
    let raw = rest
        .execute_raw(Method::POST, TOKEN_PATH, Some(Payload::Form(&form)), &[])
        .await?;

    if raw.status != 200 {
        let message = provider_message(&raw);
        tracing::error!(
            status = raw.status,
            message = %message,
            "Token exchange failed"
        );
        return Err(ApiError::AuthError {
            status: raw.status,
            message,
        });
    }

    let missing_token = || ApiError::AuthError {
        status: raw.status,
        message: "Token response does not contain access_token".to_string(),
    };

    let response = raw.json().map_err(|_| missing_token())?;
    let token: TokenResponse =
        serde_json::from_value(response.clone()).map_err(|_| missing_token())?;

    if token.access_token.is_empty() {
        return Err(ApiError::AuthError {
            status: raw.status,
            message: "Token response contains an empty access_token".to_string(),
        });
    }

    tracing::info!("Access token obtained");

    Ok(AccessData {
        access_token: token.access_token,
        raw_response: response,
        obtained_at: Utc::now(),
    })
}

/// Best human-readable message from an error response
///
/// JSON `message` (or `error`) when present, otherwise the body text.
fn provider_message(raw: &RawResponse) -> String {
    match raw.json() {
        Ok(body) => serde_json::from_value::<TokenErrorResponse>(body.clone())
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or_else(|| body.to_string()),
        Err(_) => raw.text().trim().to_string(),
    }
}
