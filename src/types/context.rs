//! Contextual tuples sent alongside a permission check.

use std::collections::BTreeMap;

use serde::Serialize;

/// An ad-hoc relationship fact that informs a single check without being
/// persisted by the service.
///
/// The tuple is a flat string map and is serialized verbatim, so callers can
/// add whatever keys the service understands beyond the usual
/// `user` / `relation` / `object`.
///
/// # Examples
///
/// ```
/// use tupelo::ContextualTuple;
///
/// let t = ContextualTuple::new("alice", "member", "group:eng")
///     .with("condition", "in_office_hours");
/// assert_eq!(t.get("relation"), Some("member"));
/// assert_eq!(t.get("condition"), Some("in_office_hours"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ContextualTuple {
    fields: BTreeMap<String, String>,
}

impl ContextualTuple {
    /// Creates a tuple with the standard `user`, `relation` and `object` keys.
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self::default()
            .with("user", user)
            .with("relation", relation)
            .with("object", object)
    }

    /// Sets a key, replacing any previous value.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

impl<K, V> FromIterator<(K, V)> for ContextualTuple
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
