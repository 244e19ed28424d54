//! Client configuration.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer};

/// Default number of cached check results.
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Default lifetime of a cached check result.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Everything needed to construct a [`Client`](crate::Client).
///
/// Usually assembled through [`Client::builder`](crate::Client::builder),
/// but it also deserializes from a host application's own configuration.
/// Durations are given in seconds there:
///
/// ```
/// use std::time::Duration;
/// use tupelo::ClientConfig;
///
/// let config: ClientConfig = serde_json::from_str(r#"{
///     "base_url": "https://authz.internal",
///     "tenant_id": "acme",
///     "cache_ttl_secs": 30
/// }"#).unwrap();
///
/// assert_eq!(config.cache_ttl, Duration::from_secs(30));
/// assert_eq!(config.cache_capacity, tupelo::DEFAULT_CACHE_CAPACITY);
/// ```
///
/// The token is redacted in `Debug` output.
#[derive(Clone, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the authorization service, e.g. `https://authz.internal`.
    pub base_url: String,
    /// Tenant sent as `X-Tenant-ID` and used to partition the cache.
    pub tenant_id: String,
    /// Optional bearer token.
    #[serde(default)]
    pub token: Option<String>,
    /// Maximum number of cached check results. Zero disables the cache.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    /// Lifetime of a cached check result.
    #[serde(
        rename = "cache_ttl_secs",
        default = "default_cache_ttl",
        deserialize_with = "secs"
    )]
    pub cache_ttl: Duration,
    /// Timeout applied to every request.
    #[serde(
        rename = "request_timeout_secs",
        default = "default_request_timeout",
        deserialize_with = "secs"
    )]
    pub request_timeout: Duration,
    /// Optional connection timeout.
    #[serde(
        rename = "connect_timeout_secs",
        default,
        deserialize_with = "optional_secs"
    )]
    pub connect_timeout: Option<Duration>,
    /// Allow plaintext `http://` to hosts other than loopback.
    #[serde(default)]
    pub insecure: bool,
}

impl ClientConfig {
    /// Creates a configuration with default cache and timeout settings.
    pub fn new(base_url: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_id: tenant_id.into(),
            token: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: DEFAULT_CACHE_TTL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            connect_timeout: None,
            insecure: false,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("tenant_id", &self.tenant_id)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("cache_capacity", &self.cache_capacity)
            .field("cache_ttl", &self.cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("insecure", &self.insecure)
            .finish()
    }
}

fn default_cache_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_cache_ttl() -> Duration {
    DEFAULT_CACHE_TTL
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

fn secs<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
    let value = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(value).map_err(serde::de::Error::custom)
}

fn optional_secs<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Duration>, D::Error> {
    Option::<f64>::deserialize(deserializer)?
        .map(|value| Duration::try_from_secs_f64(value).map_err(serde::de::Error::custom))
        .transpose()
}
