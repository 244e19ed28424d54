//! JSON bodies exchanged with the authorization service.
//!
//! These are internal; the public API speaks in plain strings and booleans.

use serde::{Deserialize, Serialize};

use crate::types::ContextualTuple;

/// The only mutation status the service uses to report success.
pub(crate) const STATUS_SUCCESS: &str = "success";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckBody<'a> {
    pub user: &'a str,
    pub relation: &'a str,
    pub object: &'a str,
    pub contextual_tuples: &'a [ContextualTuple],
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CheckReply {
    #[serde(default)]
    pub allowed: bool,
}

/// Body of both grant and revoke requests.
#[derive(Debug, Serialize)]
pub(crate) struct TupleBody<'a> {
    pub user: &'a str,
    pub relation: &'a str,
    pub object: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MutationReply {
    #[serde(default)]
    pub status: Option<String>,
}

impl MutationReply {
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCESS)
    }
}
