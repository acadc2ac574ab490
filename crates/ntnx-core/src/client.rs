//! HTTP client settings and the shared Prism transport.
//!
//! [`ServiceClient`] performs exactly one HTTP exchange per call and hands the
//! status code and raw body back to the resource client, which decides what
//! counts as success. Transport failures are returned as errors; there is no
//! retry layer.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, ClientBuilder, Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::NtnxClientConfig;
use crate::error::{Error, Result};
use crate::types::ApiEndpoint;

/// Default timeout for Prism requests (seconds)
pub const PRISM_DEFAULT_TIMEOUT: u64 = 30;

/// Default connect timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Default idle timeout for connection pools
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Default maximum idle connections per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// HTTP client configuration.
///
/// Configures timeouts, connection pooling and compression of the underlying
/// `reqwest` client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Request timeout
    pub timeout: Duration,

    /// Connection pool idle timeout
    pub pool_idle_timeout: Duration,

    /// Maximum idle connections per host
    pub pool_max_idle_per_host: usize,

    /// Enable response compression
    pub enable_compression: bool,
}

impl ClientConfig {
    /// Create a new client configuration with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(PRISM_DEFAULT_TIMEOUT),
            pool_idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            pool_max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            enable_compression: true,
        }
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set connection pool idle timeout.
    #[must_use]
    pub const fn with_pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.pool_idle_timeout = timeout;
        self
    }

    /// Set maximum idle connections per host.
    #[must_use]
    pub const fn with_pool_max_idle(mut self, max: usize) -> Self {
        self.pool_max_idle_per_host = max;
        self
    }

    /// Enable or disable compression.
    #[must_use]
    pub const fn with_compression(mut self, enabled: bool) -> Self {
        self.enable_compression = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Status and raw body of a single Prism exchange.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: Bytes,
    path: String,
}

impl ApiResponse {
    /// Create a response from its parts.
    #[must_use]
    pub fn new(status: StatusCode, body: Bytes, path: impl Into<String>) -> Self {
        Self {
            status,
            body,
            path: path.into(),
        }
    }

    /// HTTP status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// True only for `200 OK`; other 2xx codes are not treated as success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Raw response body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as (lossy) UTF-8 text, for diagnostics.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Request path this response answers.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|err| {
            Error::ParseError(format!(
                "Failed to parse Prism response for `{}`: {err}",
                self.path
            ))
        })
    }
}

/// Builder for [`ServiceClient`].
#[derive(Clone)]
pub struct ServiceClientBuilder {
    base_url: Url,
    http_config: ClientConfig,
    user_agent: Option<String>,
    basic_auth: Option<(String, String)>,
    tls_verify: bool,
}

impl ServiceClientBuilder {
    /// Create a builder for the given Prism root URL.
    ///
    /// The URL should include the protocol, host and port
    /// (e.g. `https://prism.example.com:9440`).
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let url = Url::parse(base_url.as_ref()).map_err(|err| {
            Error::ConfigError(format!(
                "Invalid Prism base URL `{}`: {err}",
                base_url.as_ref()
            ))
        })?;

        Ok(Self {
            base_url: url,
            http_config: ClientConfig::new().with_timeout(timeout),
            user_agent: None,
            basic_auth: None,
            tls_verify: true,
        })
    }

    /// Create a builder from an [`NtnxClientConfig`], checking its bounds first.
    pub fn from_config(config: &NtnxClientConfig) -> Result<Self> {
        config.ensure_valid()?;
        let builder = Self::new(&config.endpoint_url, config.timeout())?
            .with_tls_verify(config.tls_verify)
            .with_basic_auth(config.username.clone(), config.password.clone());
        Ok(builder)
    }

    /// Override the HTTP client configuration.
    ///
    /// Replaces every HTTP setting, the request timeout included.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.http_config = config;
        self
    }

    /// Set the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Configure HTTP basic authentication credentials.
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.basic_auth = Some((username.into(), password.into()));
        self
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<ServiceClient> {
        let mut builder = ClientBuilder::new()
            .timeout(self.http_config.timeout)
            .pool_idle_timeout(self.http_config.pool_idle_timeout)
            .pool_max_idle_per_host(self.http_config.pool_max_idle_per_host)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT));

        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        if !self.http_config.enable_compression {
            builder = builder.no_gzip();
        }

        if !self.tls_verify {
            warn!("TLS verification disabled for Prism client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder.build().map_err(|err| {
            Error::ConfigError(format!("Failed to build Prism HTTP client: {err}"))
        })?;

        let basic_auth = self
            .basic_auth
            .map(|(user, pass)| (user, Arc::new(SecretString::from(pass))));

        Ok(ServiceClient {
            http,
            base_url: self.base_url,
            basic_auth,
        })
    }
}

/// Asynchronous transport shared by the Acropolis resource clients.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    base_url: Url,
    basic_auth: Option<(String, Arc<SecretString>)>,
}

impl ServiceClient {
    /// Prism root URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL of an API family.
    pub fn endpoint_url(&self, endpoint: ApiEndpoint) -> Result<Url> {
        endpoint.resolve(&self.base_url)
    }

    /// Issue a GET request.
    pub async fn get(&self, endpoint: ApiEndpoint, path: &str) -> Result<ApiResponse> {
        self.execute::<()>(Method::GET, endpoint, path, None).await
    }

    /// Issue a POST request with a JSON body.
    pub async fn post<B>(&self, endpoint: ApiEndpoint, path: &str, body: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.execute(Method::POST, endpoint, path, Some(body)).await
    }

    /// Issue a DELETE request.
    pub async fn delete(&self, endpoint: ApiEndpoint, path: &str) -> Result<ApiResponse> {
        self.execute::<()>(Method::DELETE, endpoint, path, None).await
    }

    fn build_url(&self, endpoint: ApiEndpoint, path: &str) -> Result<Url> {
        let normalized = path.strip_prefix('/').unwrap_or(path);

        self.endpoint_url(endpoint)?.join(normalized).map_err(|err| {
            Error::InvalidEndpoint(format!("Invalid {endpoint} path `{path}`: {err}"))
        })
    }

    async fn execute<B>(
        &self,
        method: Method,
        endpoint: ApiEndpoint,
        path: &str,
        body: Option<&B>,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let url = self.build_url(endpoint, path)?;
        let mut request = self
            .http
            .request(method.clone(), url)
            .header("Accept", "application/json");

        if let Some((user, pass)) = &self.basic_auth {
            request = request.basic_auth(user, Some(pass.expose_secret()));
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }

        info!(%method, %endpoint, path, "Prism request");

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        debug!(%method, path, status = status.as_u16(), "Prism response");

        Ok(ApiResponse::new(status, bytes, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{basic_auth, body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ServiceClient {
        ServiceClientBuilder::new(server.uri(), Duration::from_secs(5))
            .unwrap()
            .with_basic_auth("admin", "secret")
            .build()
            .unwrap()
    }

    #[test]
    fn test_client_config_builder() {
        let config = ClientConfig::new()
            .with_timeout(Duration::from_secs(60))
            .with_pool_idle_timeout(Duration::from_secs(120))
            .with_pool_max_idle(20)
            .with_compression(false);

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(120));
        assert_eq!(config.pool_max_idle_per_host, 20);
        assert!(!config.enable_compression);
    }

    #[test]
    fn test_builder_rejects_invalid_url() {
        let result = ServiceClientBuilder::new("not a url", Duration::from_secs(5));
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }

    #[test]
    fn test_from_config_rejects_out_of_range_settings() {
        let mut config =
            NtnxClientConfig::new("https://prism.example.com:9440", "admin", "secret").unwrap();
        config.request_timeout_secs = 0;
        assert!(matches!(
            ServiceClientBuilder::from_config(&config),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_api_response_is_ok_only_for_200() {
        let ok = ApiResponse::new(StatusCode::OK, Bytes::new(), "images");
        let created = ApiResponse::new(StatusCode::CREATED, Bytes::new(), "images");
        assert!(ok.is_ok());
        assert!(!created.is_ok());
    }

    #[test]
    fn test_api_response_json_error_names_path() {
        let response =
            ApiResponse::new(StatusCode::OK, Bytes::from_static(b"{oops"), "images/u1");
        let err = response.json::<serde_json::Value>().unwrap_err();
        match err {
            Error::ParseError(message) => assert!(message.contains("images/u1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_sends_basic_auth_to_ahv_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/nutanix/v0.8/images"))
            .and(basic_auth("admin", "secret"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entities": []})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = client.get(ApiEndpoint::Ahv, "images").await.unwrap();
        assert!(response.is_ok());
        assert_eq!(response.path(), "images");
    }

    #[tokio::test]
    async fn non_200_status_is_returned_not_raised() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/nutanix/v0.8/images/u1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = client.delete(ApiEndpoint::Ahv, "images/u1").await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.text(), "boom");
    }

    #[tokio::test]
    async fn post_serializes_body_to_rest_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/PrismGateway/services/rest/v1/containers/"))
            .and(body_json(json!({"name": "default"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": true})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let response = client
            .post(ApiEndpoint::Rest, "/containers/", &json!({"name": "default"}))
            .await
            .unwrap();
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["value"], true);
    }

    #[tokio::test]
    async fn connection_failure_is_propagated() {
        let client = ServiceClientBuilder::new("http://127.0.0.1:1", Duration::from_secs(2))
            .unwrap()
            .build()
            .unwrap();

        let err = client.get(ApiEndpoint::Ahv, "images").await.unwrap_err();
        assert!(matches!(
            err,
            Error::ServiceUnavailable(_) | Error::HttpError(_) | Error::Timeout(_)
        ));
    }
}
