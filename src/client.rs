use reqwest::Method;
use serde_json::Value;

use crate::auth::{AccessData, AuthManager, Credentials};
use crate::config::Config;
use crate::error::Result;
use crate::query::append_query;
use crate::rest_client::{Payload, RequestResult, RestClient};

/// Endpoint used to check token validity
pub(crate) const PAYMENT_METHODS_PATH: &str = "/v1/payment_methods";

/// Integration metadata sent along create-style requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMetadata {
    pub platform: Option<String>,
    /// Stored only; the `so` header is always sent as an empty marker
    pub source_os: Option<String>,
    pub integration_type: Option<String>,
}

impl ClientMetadata {
    /// `platform`, `so` and `type` headers; unset values go out empty
    ///
    /// `so` is a bare marker and never carries a value.
    fn headers(&self) -> [(&'static str, String); 3] {
        [
            ("platform", self.platform.clone().unwrap_or_default()),
            ("so", String::new()),
            ("type", self.integration_type.clone().unwrap_or_default()),
        ]
    }
}

/// How a dispatched request is authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Anonymous,
    Bearer,
    /// Bearer plus integration metadata headers
    BearerWithMetadata,
}

/// Mercado Pago API client
///
/// Every operation returns the transport's [`RequestResult`] as-is; callers
/// inspect `status` themselves. Only transport failures and token exchange
/// failures surface as errors.
pub struct MpClient {
    auth: AuthManager,
    rest: RestClient,
    metadata: ClientMetadata,
}

impl MpClient {
    /// Create a client over an existing transport
    pub fn new(credentials: Credentials, rest: RestClient) -> Self {
        Self {
            auth: AuthManager::new(credentials),
            rest,
            metadata: ClientMetadata::default(),
        }
    }

    /// Client using a pre-issued access token
    pub fn from_access_token(token: impl Into<String>) -> Result<Self> {
        Ok(Self::new(
            Credentials::access_token(token),
            RestClient::with_defaults()?,
        ))
    }

    /// Client exchanging application credentials on first use
    pub fn from_app_credentials(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self::new(
            Credentials::app(client_id, client_secret),
            RestClient::with_defaults()?,
        ))
    }

    /// Build a client from loaded configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut rest = RestClient::new(
            config.api_base_url.clone(),
            config.sandbox_base_url.clone(),
            config.http_connect_timeout,
            config.http_request_timeout,
        )?;
        rest.set_sandbox(config.sandbox);

        Ok(Self::new(config.credentials()?, rest).with_metadata(config.metadata()))
    }

    pub fn with_metadata(mut self, metadata: ClientMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn metadata(&self) -> &ClientMetadata {
        &self.metadata
    }

    pub fn set_platform(&mut self, platform: impl Into<String>) {
        self.metadata.platform = Some(platform.into());
    }

    /// Record the source OS; it is not sent on the wire
    pub fn set_source_os(&mut self, source_os: impl Into<String>) {
        self.metadata.source_os = Some(source_os.into());
    }

    pub fn set_integration_type(&mut self, integration_type: impl Into<String>) {
        self.metadata.integration_type = Some(integration_type.into());
    }

    pub fn set_sandbox_mode(&mut self, enable: bool) {
        tracing::info!(sandbox = enable, "Switching API environment");
        self.rest.set_sandbox(enable);
    }

    pub fn sandbox_mode(&self) -> bool {
        self.rest.is_sandbox()
    }

    pub fn credentials(&self) -> &Credentials {
        self.auth.credentials()
    }

    /// Get the active access token, exchanging credentials on first use
    pub async fn get_access_token(&self) -> Result<String> {
        self.auth.get_access_token(&self.rest).await
    }

    /// Token endpoint response, once a token has been exchanged
    pub async fn access_data(&self) -> Option<AccessData> {
        self.auth.access_data().await
    }

    /// Check whether the current token is accepted by the API
    ///
    /// Only a long-lived token is ever checked; app credentials yield `false`
    /// without a network call, even after an exchange. Never fails: an empty
    /// body, HTTP 400/401 or any error all yield `false`.
    pub async fn is_valid_token(&self) -> bool {
        if self.auth.long_lived_token().is_none() {
            tracing::debug!("No long-lived access token to validate");
            return false;
        }

        match self.get(PAYMENT_METHODS_PATH, &[], true).await {
            Ok(result) if result.is_empty() => false,
            Ok(result) => !matches!(result.status, 400 | 401),
            Err(e) => {
                tracing::warn!(error = %e, "Token validation request failed");
                false
            }
        }
    }

    /// Generic GET
    ///
    /// With `authenticate` false no token is fetched or sent.
    pub async fn get(
        &self,
        uri: &str,
        params: &[(&str, &str)],
        authenticate: bool,
    ) -> Result<RequestResult> {
        let auth = if authenticate {
            Auth::Bearer
        } else {
            Auth::Anonymous
        };
        self.dispatch(Method::GET, uri, params, None, auth).await
    }

    /// Generic POST with a JSON body and integration metadata headers
    pub async fn post(
        &self,
        uri: &str,
        data: &Value,
        params: &[(&str, &str)],
    ) -> Result<RequestResult> {
        self.dispatch(Method::POST, uri, params, Some(data), Auth::BearerWithMetadata)
            .await
    }

    /// Generic PUT with a JSON body
    pub async fn put(
        &self,
        uri: &str,
        data: &Value,
        params: &[(&str, &str)],
    ) -> Result<RequestResult> {
        self.dispatch(Method::PUT, uri, params, Some(data), Auth::Bearer)
            .await
    }

    /// Generic DELETE
    pub async fn delete(&self, uri: &str, params: &[(&str, &str)]) -> Result<RequestResult> {
        self.dispatch(Method::DELETE, uri, params, None, Auth::Bearer)
            .await
    }

    /// Assemble headers and uri, then hand the request to the transport
    pub(crate) async fn dispatch(
        &self,
        method: Method,
        uri: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
        auth: Auth,
    ) -> Result<RequestResult> {
        let mut headers: Vec<(&str, String)> = Vec::with_capacity(4);

        if auth == Auth::BearerWithMetadata {
            headers.extend(self.metadata.headers());
        }

        if auth != Auth::Anonymous {
            let token = self.get_access_token().await?;
            headers.push(("Authorization", format!("Bearer {}", token)));
        }

        let uri = append_query(uri, params);
        self.rest
            .execute(method, &uri, body.map(Payload::Json), &headers)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard, credentials: Credentials) -> MpClient {
        let rest = RestClient::new(server.url(), format!("{}/sandbox", server.url()), 5, 10)
            .unwrap();
        MpClient::new(credentials, rest)
    }

    fn token_client(server: &mockito::ServerGuard) -> MpClient {
        client_for(server, Credentials::access_token("APP_USR-test"))
    }

    #[tokio::test]
    async fn test_get_attaches_bearer_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/payments/search")
            .match_header("authorization", "Bearer APP_USR-test")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("status".into(), "approved".into()),
                Matcher::UrlEncoded("payer.email".into(), "a@b.com".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"results":[]}"#)
            .create_async()
            .await;

        let client = token_client(&server);
        let result = client
            .get(
                "/v1/payments/search",
                &[("status", "approved"), ("payer.email", "a@b.com")],
                true,
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result.status, 200);
    }

    #[tokio::test]
    async fn test_get_without_authentication_sends_no_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/merchant_orders/55")
            .match_header("authorization", Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"id":55}"#)
            .create_async()
            .await;

        // App credentials with no token endpoint mocked: a fetch would fail
        let client = client_for(&server, Credentials::app("id", "secret"));
        let result = client.get("/merchant_orders/55", &[], false).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.response["id"], 55);
        assert!(client.access_data().await.is_none());
    }

    #[tokio::test]
    async fn test_post_sends_metadata_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/payments")
            .match_header("authorization", "Bearer APP_USR-test")
            .match_header("platform", "magento")
            .match_header("so", "")
            .match_header("type", "checkout_pro")
            .match_body(Matcher::Json(json!({"transaction_amount": 10.5})))
            .with_status(201)
            .with_body(r#"{"id":1,"status":"approved"}"#)
            .create_async()
            .await;

        let mut client = token_client(&server);
        client.set_platform("magento");
        client.set_integration_type("checkout_pro");

        let result = client
            .post("/v1/payments", &json!({"transaction_amount": 10.5}), &[])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, RequestResult::new(201, json!({"id":1,"status":"approved"})));
    }

    #[tokio::test]
    async fn test_put_has_no_metadata_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/v1/payments/1")
            .match_header("authorization", "Bearer APP_USR-test")
            .match_header("platform", Matcher::Missing)
            .match_header("type", Matcher::Missing)
            .match_query(Matcher::UrlEncoded("mode".into(), "strict".into()))
            .with_status(200)
            .with_body(r#"{"id":1}"#)
            .create_async()
            .await;

        let mut client = token_client(&server);
        client.set_platform("magento");
        client
            .put("/v1/payments/1", &json!({"status": "cancelled"}), &[("mode", "strict")])
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_appends_to_existing_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("DELETE", "/v1/customers/1/cards/2")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("a".into(), "1".into()),
                Matcher::UrlEncoded("b".into(), "2".into()),
            ]))
            .match_header("authorization", "Bearer APP_USR-test")
            .with_status(200)
            .with_body(r#"{"deleted":true}"#)
            .create_async()
            .await;

        let client = token_client(&server);
        client
            .delete("/v1/customers/1/cards/2?a=1", &[("b", "2")])
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_statuses_pass_through() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/payments/404")
            .with_status(404)
            .with_body(r#"{"message":"Payment not found","status":404}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/v1/payments")
            .with_status(500)
            .with_body(r#"{"message":"internal_error"}"#)
            .create_async()
            .await;

        let client = token_client(&server);
        let result = client.get("/v1/payments/404", &[], true).await.unwrap();
        assert_eq!(
            result,
            RequestResult::new(404, json!({"message":"Payment not found","status":404}))
        );

        let result = client.post("/v1/payments", &json!({}), &[]).await.unwrap();
        assert_eq!(result.status, 500);
    }

    #[tokio::test]
    async fn test_token_exchanged_once_across_calls() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"APP_USR-exchanged"}"#)
            .expect(1)
            .create_async()
            .await;
        let resource_mock = server
            .mock("GET", "/v1/payments/1")
            .match_header("authorization", "Bearer APP_USR-exchanged")
            .with_status(200)
            .with_body(r#"{"id":1}"#)
            .expect(3)
            .create_async()
            .await;

        let client = client_for(&server, Credentials::app("id", "secret"));
        for _ in 0..3 {
            client.get("/v1/payments/1", &[], true).await.unwrap();
        }

        token_mock.assert_async().await;
        resource_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_auth_failure_stops_dispatch() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .with_status(400)
            .with_body(r#"{"message":"invalid_client","status":400}"#)
            .create_async()
            .await;
        let resource_mock = server
            .mock("GET", "/v1/payments/1")
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server, Credentials::app("id", "bad"));
        let err = client.get("/v1/payments/1", &[], true).await.unwrap_err();

        assert!(matches!(err, ApiError::AuthError { status: 400, ref message } if message == "invalid_client"));
        resource_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_sandbox_toggle() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/sandbox/v1/payments/1")
            .with_status(200)
            .with_body(r#"{"id":1}"#)
            .create_async()
            .await;

        let mut client = token_client(&server);
        assert!(!client.sandbox_mode());
        client.set_sandbox_mode(true);
        assert!(client.sandbox_mode());

        client.get("/v1/payments/1", &[], true).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_is_valid_token_without_token() {
        let server = mockito::Server::new_async().await;
        let client = client_for(&server, Credentials::app("id", "secret"));
        assert!(!client.is_valid_token().await);

        let client = client_for(&server, Credentials::access_token(""));
        assert!(!client.is_valid_token().await);
    }

    #[tokio::test]
    async fn test_is_valid_token_statuses() {
        for (status, body, expected) in [
            (200, r#"[{"id":"visa"}]"#, true),
            (403, r#"{"message":"forbidden"}"#, true),
            (400, r#"{"message":"bad request"}"#, false),
            (401, r#"{"message":"invalid token"}"#, false),
            (200, "", false),
            (200, "[]", false),
            (200, "not json", false),
        ] {
            let mut server = mockito::Server::new_async().await;
            server
                .mock("GET", PAYMENT_METHODS_PATH)
                .match_header("authorization", "Bearer APP_USR-test")
                .with_status(status)
                .with_body(body)
                .create_async()
                .await;

            let client = token_client(&server);
            assert_eq!(
                client.is_valid_token().await,
                expected,
                "status={status} body={body}"
            );
        }
    }

    #[tokio::test]
    async fn test_is_valid_token_after_exchange() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/oauth/token")
            .with_status(200)
            .with_body(r#"{"access_token":"APP_USR-exchanged"}"#)
            .create_async()
            .await;
        let payment_methods = server
            .mock("GET", PAYMENT_METHODS_PATH)
            .with_status(200)
            .with_body(r#"[{"id":"master"}]"#)
            .expect(0)
            .create_async()
            .await;

        let client = client_for(&server, Credentials::app("id", "secret"));
        client.get_access_token().await.unwrap();
        assert!(!client.is_valid_token().await);
        payment_methods.assert_async().await;
    }

    #[tokio::test]
    async fn test_is_valid_token_absorbs_transport_failure() {
        let rest = RestClient::new("http://127.0.0.1:9", "http://127.0.0.1:9", 1, 1).unwrap();
        let client = MpClient::new(Credentials::access_token("APP_USR-test"), rest);
        assert!(!client.is_valid_token().await);
    }

    #[test]
    fn test_so_header_ignores_source_os() {
        let metadata = ClientMetadata {
            platform: Some("magento2".to_string()),
            source_os: Some("linux".to_string()),
            integration_type: None,
        };
        assert_eq!(
            metadata.headers(),
            [
                ("platform", "magento2".to_string()),
                ("so", String::new()),
                ("type", String::new()),
            ]
        );
    }

    #[test]
    fn test_metadata_headers_default_empty() {
        let headers = ClientMetadata::default().headers();
        assert_eq!(
            headers,
            [
                ("platform", String::new()),
                ("so", String::new()),
                ("type", String::new()),
            ]
        );
    }
}
