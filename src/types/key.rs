//! Cache keys for permission check results.

use std::fmt;

/// Identifies one cached check result: `(tenant, user, relation, resource)`.
///
/// The key is structured rather than a joined string, so tuples whose fields
/// contain the display delimiter can never collide.
///
/// # Examples
///
/// ```
/// use tupelo::CacheKey;
///
/// let a = CacheKey::new("acme", "alice:x", "reader", "doc");
/// let b = CacheKey::new("acme", "alice", "x:reader", "doc");
/// assert_ne!(a, b);
/// assert_eq!(a.to_string(), "acme:alice:x:reader:doc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    tenant: String,
    user: String,
    relation: String,
    resource: String,
}

impl CacheKey {
    /// Creates a key from its four parts. Field order matters.
    pub fn new(
        tenant: impl Into<String>,
        user: impl Into<String>,
        relation: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            user: user.into(),
            relation: relation.into(),
            resource: resource.into(),
        }
    }

    /// Returns the tenant.
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Returns the user.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the relation.
    pub fn relation(&self) -> &str {
        &self.relation
    }

    /// Returns the resource.
    pub fn resource(&self) -> &str {
        &self.resource
    }
}

/// Renders `tenant:user:relation:resource`. Intended for logs only.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.tenant, self.user, self.relation, self.resource
        )
    }
}
