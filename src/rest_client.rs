use reqwest::{Client, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::Result;

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://api.mercadopago.com";

/// Sandbox API root
pub const DEFAULT_SANDBOX_BASE_URL: &str = "https://api.mercadopago.com/sandbox";

/// Uniform envelope returned by every operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestResult {
    /// HTTP status code as returned by the provider
    pub status: u16,

    /// Parsed JSON body (`null` when the body was empty)
    pub response: Value,
}

impl RequestResult {
    pub fn new(status: u16, response: Value) -> Self {
        Self { status, response }
    }

    /// True when the body carries nothing (null, empty string, object or array)
    pub fn is_empty(&self) -> bool {
        match &self.response {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
            _ => false,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Status and body of a response before JSON decoding
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Parse the body as JSON; an empty body is `null`
    pub fn json(&self) -> Result<Value> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Body as lossy UTF-8 text
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Request body encodings understood by the transport
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Json(&'a Value),
    Form(&'a [(&'a str, &'a str)]),
}

/// HTTP transport for the Mercado Pago API
///
/// Resolves paths against the production or sandbox root, sends the request
/// once and hands back `{status, response}`. Non-2xx statuses are data here,
/// never errors; only network and decode failures are.
pub struct RestClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    base_url: String,

    sandbox_base_url: String,

    /// Target the sandbox root instead of production
    sandbox: bool,
}

impl RestClient {
    /// Create a new transport
    pub fn new(
        base_url: impl Into<String>,
        sandbox_base_url: impl Into<String>,
        connect_timeout: u64,
        request_timeout: u64,
    ) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout))
            .timeout(Duration::from_secs(request_timeout))
            .user_agent(concat!("mercadopago-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            sandbox_base_url: sandbox_base_url.into(),
            sandbox: false,
        })
    }

    /// Transport pointed at the public API with default timeouts
    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_BASE_URL, DEFAULT_SANDBOX_BASE_URL, 30, 60)
    }

    pub fn set_sandbox(&mut self, enable: bool) {
        self.sandbox = enable;
    }

    pub fn is_sandbox(&self) -> bool {
        self.sandbox
    }

    /// Absolute URL for an API path under the active root
    pub fn url_for(&self, path: &str) -> String {
        let root = if self.sandbox {
            &self.sandbox_base_url
        } else {
            &self.base_url
        };
        let root = root.trim_end_matches('/');

        if path.starts_with('/') {
            format!("{}{}", root, path)
        } else {
            format!("{}/{}", root, path)
        }
    }

    pub async fn get(&self, path: &str, headers: &[(&str, String)]) -> Result<RequestResult> {
        self.execute(Method::GET, path, None, headers).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: Payload<'_>,
        headers: &[(&str, String)],
    ) -> Result<RequestResult> {
        self.execute(Method::POST, path, Some(body), headers).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: Payload<'_>,
        headers: &[(&str, String)],
    ) -> Result<RequestResult> {
        self.execute(Method::PUT, path, Some(body), headers).await
    }

    pub async fn delete(&self, path: &str, headers: &[(&str, String)]) -> Result<RequestResult> {
        self.execute(Method::DELETE, path, None, headers).await
    }

    /// Send a single request and normalize the response
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Payload<'_>>,
        headers: &[(&str, String)],
    ) -> Result<RequestResult> {
        let raw = self.execute_raw(method.clone(), path, body, headers).await?;
        let status = raw.status;

        let parsed = raw.json().map_err(|e| {
            tracing::warn!(
                status = status,
                path = path,
                error = %e,
                "Response body is not valid JSON"
            );
            e
        })?;

        if (200..300).contains(&status) {
            tracing::debug!(status = status, "Received HTTP response");
        } else {
            tracing::warn!(
                status = status,
                method = %method,
                path = path,
                "Received error response"
            );
        }

        Ok(RequestResult::new(status, parsed))
    }

    /// Send a single request and return the status with the undecoded body
    pub async fn execute_raw(
        &self,
        method: Method,
        path: &str,
        body: Option<Payload<'_>>,
        headers: &[(&str, String)],
    ) -> Result<RawResponse> {
        let url = self.url_for(path);

        tracing::debug!(
            method = %method,
            url = %url,
            sandbox = self.sandbox,
            "Sending HTTP request"
        );

        let mut builder = self
            .client
            .request(method.clone(), &url)
            .header("Accept", "application/json");

        for (name, value) in headers {
            builder = builder.header(*name, value.as_str());
        }

        builder = match body {
            Some(Payload::Json(value)) => builder.json(value),
            Some(Payload::Form(fields)) => builder.form(fields),
            None => builder,
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                // Categorize the error for better debugging
                let error_kind = if e.is_timeout() {
                    "timeout"
                } else if e.is_connect() {
                    "connection_failed"
                } else if e.is_builder() {
                    "builder_error"
                } else if e.is_request() {
                    "request_error"
                } else {
                    "unknown"
                };

                tracing::warn!(
                    error_kind = error_kind,
                    error = %e,
                    method = %method,
                    url = %url,
                    "HTTP request error"
                );
                return Err(e.into());
            }
        };

        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse { status, body })
    }
}
