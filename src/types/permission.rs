//! Permission names and their mapping onto service relations.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Human-facing permission names and the relation each one is stored under.
const PERMISSION_RELATIONS: [(&str, &str); 4] = [
    ("read", "reader"),
    ("write", "writer"),
    ("admin", "admin"),
    ("owner", "owner"),
];

/// Maps a permission name to the relation the authorization service uses.
///
/// Known permissions map through a fixed table; anything else is treated as
/// a relation name already and returned unchanged.
///
/// # Examples
///
/// ```
/// use tupelo::relation_for;
///
/// assert_eq!(relation_for("read"), "reader");
/// assert_eq!(relation_for("write"), "writer");
/// assert_eq!(relation_for("viewer"), "viewer");
/// ```
pub fn relation_for(permission: &str) -> &str {
    PERMISSION_RELATIONS
        .iter()
        .find(|(name, _)| *name == permission)
        .map_or(permission, |(_, relation)| relation)
}

/// The well-known permissions.
///
/// Client operations take `impl AsRef<str>`, so a `Permission` and a plain
/// permission name can be used interchangeably.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    /// Read access, stored as `reader`.
    Read,
    /// Write access, stored as `writer`.
    Write,
    /// Administrative access, stored as `admin`.
    Admin,
    /// Ownership, stored as `owner`.
    Owner,
}

impl Permission {
    /// Returns the permission name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    /// Returns the relation this permission maps to.
    #[must_use]
    pub fn relation(&self) -> &'static str {
        relation_for(self.as_str())
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "read" => Ok(Self::Read),
            "write" => Ok(Self::Write),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            other => Err(Error::InvalidArgument(format!(
                "unknown permission: {}",
                other
            ))),
        }
    }
}
