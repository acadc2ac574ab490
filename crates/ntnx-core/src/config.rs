//! Configuration structures for Acropolis clients.
//!
//! This module provides the connection settings for a Prism endpoint and the
//! tuning knobs of the image readiness wait, including validation.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;
use validator::Validate;

/// Connection configuration for a Prism endpoint.
///
/// This is the main configuration structure shared by the resource clients.
/// The password is redacted from its `Debug` output.
#[derive(Clone, Serialize, Deserialize, Validate)]
pub struct NtnxClientConfig {
    /// Prism root URL (e.g. `https://prism.example.com:9440`)
    #[validate(url)]
    pub endpoint_url: String,

    /// Prism user name
    #[validate(length(min = 1))]
    pub username: String,

    /// Prism password
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Whether to verify TLS certificates
    #[serde(default = "default_tls_verify")]
    pub tls_verify: bool,

    /// Request timeout in seconds
    #[validate(range(min = 1, max = 300))]
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Image readiness wait configuration
    #[validate(nested)]
    #[serde(default)]
    pub readiness: ReadinessConfig,
}

const fn default_tls_verify() -> bool {
    true
}

const fn default_request_timeout_secs() -> u64 {
    30
}

impl NtnxClientConfig {
    /// Create a new configuration with the required connection parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(
        endpoint_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, Error> {
        let config = Self {
            endpoint_url: endpoint_url.into(),
            username: username.into(),
            password: password.into(),
            tls_verify: default_tls_verify(),
            request_timeout_secs: default_request_timeout_secs(),
            readiness: ReadinessConfig::default(),
        };

        config.ensure_valid()?;
        Ok(config)
    }

    /// Check every field against its bounds, including the readiness settings.
    ///
    /// Setters and hand-built values are not checked on assignment, so clients
    /// call this before using a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] describing the violated bounds.
    pub fn ensure_valid(&self) -> Result<(), Error> {
        self.validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))
    }

    /// Set whether to verify TLS certificates.
    #[must_use]
    pub const fn with_tls_verify(mut self, verify: bool) -> Self {
        self.tls_verify = verify;
        self
    }

    /// Set request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.request_timeout_secs = seconds;
        self
    }

    /// Set the readiness wait configuration.
    #[must_use]
    pub const fn with_readiness(mut self, readiness: ReadinessConfig) -> Self {
        self.readiness = readiness;
        self
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Parse the Prism root URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed.
    pub fn parse_endpoint_url(&self) -> Result<Url, Error> {
        Url::parse(&self.endpoint_url)
            .map_err(|e| Error::ConfigError(format!("Invalid Prism URL: {e}")))
    }

    /// Bare host name of the Prism endpoint, as used in NFS export URIs.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be parsed or carries no host.
    pub fn host(&self) -> Result<String, Error> {
        let url = self.parse_endpoint_url()?;
        url.host_str().map(str::to_string).ok_or_else(|| {
            Error::ConfigError(format!("Prism URL `{}` has no host", self.endpoint_url))
        })
    }
}

impl fmt::Debug for NtnxClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NtnxClientConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("tls_verify", &self.tls_verify)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("readiness", &self.readiness)
            .finish()
    }
}

/// Tuning for the image readiness wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ReadinessConfig {
    /// Overall deadline in seconds
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_readiness_timeout_secs")]
    pub timeout_secs: u64,

    /// Delay between two state polls in milliseconds
    #[validate(range(min = 100, max = 60000))]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

const fn default_readiness_timeout_secs() -> u64 {
    30
}

const fn default_poll_interval_ms() -> u64 {
    1000
}

impl ReadinessConfig {
    /// Create a readiness configuration with defaults (30 s deadline, 1 s polls).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout_secs: default_readiness_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }

    /// Set the deadline in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Set the poll interval in milliseconds.
    #[must_use]
    pub const fn with_poll_interval(mut self, millis: u64) -> Self {
        self.poll_interval_ms = millis;
        self
    }

    /// Deadline as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Poll interval as a Duration.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self::new()
    }
}
