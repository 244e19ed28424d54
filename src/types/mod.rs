//! Domain types for the Tupelo client.
//!
//! The JSON wire bodies live in a private module and are never exposed.

mod context;
mod key;
mod permission;
pub(crate) mod wire;

pub use context::ContextualTuple;
pub use key::CacheKey;
pub use permission::{relation_for, Permission};
