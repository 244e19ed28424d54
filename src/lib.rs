//! # Tupelo
//!
//! A caching Rust client for relationship-based authorization services.
//!
//! Tupelo checks, grants and revokes `(user, relation, resource)` tuples
//! against a remote service over HTTP+JSON. Check results are kept in a
//! bounded, time-expiring local cache, and a successful grant or revoke drops
//! the cached result for exactly the tuple it changed.
//!
//! The boolean operations fail closed: a check that cannot be answered is
//! denied, a grant or revoke that cannot be confirmed reports `false`, and the
//! failure is logged through [`tracing`]. Callers that need the reason use
//! [`CheckRequest::send`](client::CheckRequest::send),
//! [`Client::try_grant`] or [`Client::try_revoke`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tupelo::{Client, Permission};
//!
//! # async fn example() -> Result<(), tupelo::Error> {
//! let client = Client::builder("https://authz.internal", "acme")
//!     .token("my-token")
//!     .build()?;
//!
//! if client.grant("alice", Permission::Write, "doc-123").await {
//!     assert!(client.check("alice", "write", "doc-123").await);
//! }
//!
//! match client.check("bob", "read", "doc-123").send().await {
//!     Ok(true) => println!("access granted"),
//!     Ok(false) => println!("access denied"),
//!     Err(e) => println!("service unavailable: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Permissions
//!
//! | Permission | Relation |
//! |------------|----------|
//! | `read` | `reader` |
//! | `write` | `writer` |
//! | `admin` | `admin` |
//! | `owner` | `owner` |
//!
//! Any other name is sent to the service unchanged.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `tls-rustls` | Yes | Use rustls for TLS |
//! | `tls-native` | No | Use native TLS |

pub mod cache;
pub mod client;
pub mod error;
pub mod types;

pub use cache::PermissionCache;
pub use client::{
    Client, ClientBuilder, ClientConfig, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL,
    DEFAULT_REQUEST_TIMEOUT, TENANT_HEADER,
};
pub use error::Error;
pub use types::*;
