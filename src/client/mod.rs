//! Authorization service client implementation.

mod builder;
mod config;
mod permissions;

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub use builder::ClientBuilder;
pub use config::{
    ClientConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL, DEFAULT_REQUEST_TIMEOUT,
};
pub use permissions::CheckRequest;

use crate::cache::PermissionCache;
use crate::error::Error;
use crate::types::{relation_for, CacheKey};

/// Header carrying the tenant on every request.
pub const TENANT_HEADER: HeaderName = HeaderName::from_static("x-tenant-id");

/// Full URLs of the service operations, resolved once at construction.
#[derive(Debug)]
pub(crate) struct Endpoints {
    check: String,
    grant: String,
    revoke: String,
}

impl Endpoints {
    fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            check: format!("{}/api/auth/check", base),
            grant: format!("{}/api/auth/grant", base),
            revoke: format!("{}/api/auth/revoke", base),
        }
    }
}

/// A caching client for a relationship-based authorization service.
///
/// `Client` is cheap to clone: clones share the HTTP connection pool and
/// the check cache. Clone it freely to share across tasks.
///
/// # Examples
///
/// ```rust,no_run
/// use tupelo::Client;
///
/// # async fn example() -> Result<(), tupelo::Error> {
/// let client = Client::builder("https://authz.internal", "acme")
///     .token("my-token")
///     .build()?;
///
/// if client.check("alice", "read", "doc1").await {
///     println!("access granted");
/// }
///
/// // Clone is cheap — share across tasks
/// let client2 = client.clone();
/// tokio::spawn(async move {
///     client2.grant("bob", "write", "doc1").await;
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoints: Arc<Endpoints>,
    tenant: Arc<str>,
    tenant_header: HeaderValue,
    cache: PermissionCache,
}

/// The bearer token is never printed.
impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("tenant", &self.tenant)
            .field("endpoints", &self.endpoints)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a client with default cache and timeout settings and no token.
    ///
    /// For `http://` base URLs, only loopback addresses are allowed unless
    /// you use [`Client::builder`] with `.insecure(true)`.
    pub fn new(
        base_url: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> Result<Self, Error> {
        ClientBuilder::new(base_url, tenant_id).build()
    }

    /// Creates a builder for configuring a client.
    pub fn builder(
        base_url: impl Into<String>,
        tenant_id: impl Into<String>,
    ) -> ClientBuilder {
        ClientBuilder::new(base_url, tenant_id)
    }

    /// Creates a client from a complete configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self, Error> {
        ClientBuilder::from_config(config).build()
    }

    /// Returns the tenant this client acts for.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Returns the headers other outbound calls need to address the same
    /// tenant.
    ///
    /// Only the tenant header is included; the bearer token is never handed
    /// out.
    pub fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_HEADER, self.tenant_header.clone());
        headers
    }

    /// Returns the check cache.
    pub fn cache(&self) -> &PermissionCache {
        &self.cache
    }

    /// Returns the number of cached check results.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Drops the cached result for one `(user, permission, resource)`.
    ///
    /// Returns whether an entry was present.
    pub fn invalidate(
        &self,
        user: impl AsRef<str>,
        permission: impl AsRef<str>,
        resource: impl AsRef<str>,
    ) -> bool {
        let key = self.cache_key(
            user.as_ref(),
            relation_for(permission.as_ref()),
            resource.as_ref(),
        );
        self.cache.remove(&key)
    }

    /// Drops every cached result.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub(crate) fn cache_key(&self, user: &str, relation: &str, resource: &str) -> CacheKey {
        CacheKey::new(&*self.tenant, user, relation, resource)
    }

    /// Sends a JSON body and decodes a JSON reply.
    ///
    /// Anything but `200 OK` is an error, whatever the body says.
    async fn post<B, R>(&self, url: &str, body: &B) -> Result<R, Error>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.http.post(url).json(body).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status { status, body });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Error::from_body)
    }
}
