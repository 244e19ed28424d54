//! Error types for the Tupelo authorization client.
//!
//! The [`Error`] enum is returned by the fallible half of the API
//! ([`ClientBuilder::build`](crate::ClientBuilder::build),
//! [`CheckRequest::send`](crate::client::CheckRequest::send),
//! [`Client::try_grant`](crate::Client::try_grant) and
//! [`Client::try_revoke`](crate::Client::try_revoke)). The boolean
//! operations log these errors and fail closed instead of returning them.
//!
//! ## Failure Classes
//!
//! | Variant | Meaning | Retryable? |
//! |---------|---------|------------|
//! | `Transport` (timeout / connect) | Request never got an answer | Yes |
//! | `Transport` (other) | Request could not be built or sent | No |
//! | `Status` (5xx) | Service failed to handle the request | Yes |
//! | `Status` (other) | Service refused the request | No |
//! | `Serialization` | Response body was not the expected JSON | No |
//! | `Rejected` | Mutation answered 200 without `status: "success"` | No |
//! | `InvalidArgument` | Local validation failed | No |

use http::StatusCode;

/// Errors returned by the Tupelo client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection-level failures: connection refused, DNS resolution failure,
    /// TLS handshake errors, request timeout.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a status other than `200 OK`.
    #[error("authorization service returned {status}: {body}")]
    Status {
        /// The HTTP status code.
        status: StatusCode,
        /// The response body as text, possibly empty.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A grant or revoke was answered with `200 OK` but the body did not
    /// report `"success"`.
    #[error("mutation rejected with status {status:?}")]
    Rejected {
        /// The `status` field of the response, if any.
        status: Option<String>,
    },

    /// Local validation failures before a request is sent.
    ///
    /// Examples: empty tenant, unparsable base URL, a tenant or token that
    /// cannot be carried in an HTTP header.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Returns `true` if this error is likely transient and the request may
    /// succeed if retried.
    ///
    /// Timeouts, connection failures and `5xx` responses count as transient.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_timeout() || e.is_connect(),
            Error::Status { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Returns the HTTP status code if this is a `Status` error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Transport(e) => e.status(),
            _ => None,
        }
    }

    pub(crate) fn from_body(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
