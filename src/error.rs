//! Error types and result handling.
//!
//! Every failure a subscriber or awaiter can observe is an [`Error`]. The
//! taxonomy follows the two cases callers care about:
//!
//! | Kind | Surfaced as |
//! |------|-------------|
//! | Transport failure ([`Error::Http`], [`Error::Timeout`], [`Error::Status`], ...) | `error` callback / `Err` from `await` |
//! | Cancellation ([`Error::Cancelled`]) | silent completion for subscribers |
//!
//! Use [`Error::is_cancel`] to classify a failure as a cancellation, and
//! [`Error::is_retryable`] to decide whether resubscribing is worthwhile.

use crate::client::is_retryable_status;
use crate::types::Response;
use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while issuing a request.
#[derive(Debug, Error)]
pub enum Error {
    /// The request was cancelled before it settled.
    #[error("request cancelled")]
    Cancelled,

    /// The transport failed to produce a response.
    #[error("HTTP transport error: {0}")]
    Http(String),

    /// The transport gave up waiting for a response.
    #[error("request timed out")]
    Timeout,

    /// A response arrived but its status failed validation.
    #[error("request failed with status code {status}")]
    Status {
        /// Status code of the rejected response
        status: u16,
        /// The full response, including the originating request config
        response: Box<Response>,
    },

    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// An interceptor rejected the request or response.
    #[error("interceptor error: {0}")]
    Interceptor(String),

    /// The response body could not be decoded into the requested type.
    #[error("decode error: {0}")]
    Decode(String),
}

impl Error {
    /// Returns true if this failure means the request was cancelled.
    pub fn is_cancel(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns true if resubscribing to the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout => true,
            Error::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// The response attached to a status failure, if any.
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::Status { response, .. } => Some(response.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Decode(err.to_string())
    }
}
