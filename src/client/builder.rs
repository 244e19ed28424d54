//! Client builder for configuring connections.

use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};

use crate::cache::PermissionCache;
use crate::error::Error;

use super::{Client, ClientConfig, Endpoints, TENANT_HEADER};

/// A builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```rust,no_run
/// use std::time::Duration;
/// use tupelo::Client;
///
/// # fn example() -> Result<(), tupelo::Error> {
/// let client = Client::builder("https://authz.prod.internal", "acme")
///     .token("my-token")
///     .cache_capacity(5_000)
///     .cache_ttl(Duration::from_secs(60))
///     .request_timeout(Duration::from_secs(3))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    config: ClientConfig,
}

impl ClientBuilder {
    pub(crate) fn new(base_url: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            config: ClientConfig::new(base_url, tenant_id),
        }
    }

    pub(crate) fn from_config(config: ClientConfig) -> Self {
        Self { config }
    }

    /// Sends `Authorization: Bearer <token>` on every request.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.config.token = Some(token.into());
        self
    }

    /// Sets the maximum number of cached check results. Zero disables caching.
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.config.cache_capacity = capacity;
        self
    }

    /// Sets how long a cached check result stays valid.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Sets the timeout applied to every request.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Allow insecure (plaintext) connections to non-loopback addresses.
    ///
    /// By default, `http://` to a non-loopback address returns an error.
    /// Set this to `true` to allow it.
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.config.insecure = insecure;
        self
    }

    /// Validates the configuration and builds the client.
    ///
    /// No request is made; the service is first contacted by the first
    /// operation.
    pub fn build(self) -> Result<Client, Error> {
        let config = self.config;

        if config.tenant_id.is_empty() {
            return Err(Error::InvalidArgument("tenant_id must not be empty".into()));
        }

        let base: reqwest::Url = config
            .base_url
            .parse()
            .map_err(|e| Error::InvalidArgument(format!("invalid base URL: {}", e)))?;

        if base.query().is_some() || base.fragment().is_some() {
            return Err(Error::InvalidArgument(format!(
                "base URL '{}' must not carry a query or fragment",
                config.base_url
            )));
        }

        match base.scheme() {
            "https" => {}
            "http" if !config.insecure => {
                // Compare the parsed host, not a substring of the URL, so that
                // hosts like "localhost.evil.com" are not mistaken for loopback.
                let host = base.host_str().unwrap_or("");
                let is_loopback = host == "localhost"
                    || host == "127.0.0.1"
                    || host == "::1"
                    || host == "[::1]";

                if !is_loopback {
                    return Err(Error::InvalidArgument(format!(
                        "insecure connection to non-loopback address '{}' requires \
                         .insecure(true) on the builder. Use https:// for production.",
                        config.base_url
                    )));
                }
            }
            "http" => {}
            other => {
                return Err(Error::InvalidArgument(format!(
                    "unsupported URL scheme '{}'",
                    other
                )));
            }
        }

        let tenant_header = HeaderValue::from_str(&config.tenant_id)
            .map_err(|_| Error::InvalidArgument("tenant_id is not a valid header value".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(TENANT_HEADER, tenant_header.clone());
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::InvalidArgument("invalid bearer token".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let mut http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout);
        if let Some(timeout) = config.connect_timeout {
            http = http.connect_timeout(timeout);
        }
        let http = http.build().map_err(http_client_error)?;

        Ok(Client {
            http,
            endpoints: Arc::new(Endpoints::new(base.as_str())),
            tenant: Arc::from(config.tenant_id.as_str()),
            tenant_header,
            cache: PermissionCache::new(config.cache_capacity, config.cache_ttl),
        })
    }
}

/// Failing to assemble the HTTP client is a configuration problem, not a
/// transport one: nothing has been sent yet.
fn http_client_error(e: reqwest::Error) -> Error {
    Error::InvalidArgument(format!("failed to build HTTP client: {}", e))
}
