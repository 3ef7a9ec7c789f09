//! Utility functions for the HTTP client.
//!
//! This module provides helper functions for:
//! - Building request URLs from base URL, path and query parameters
//! - Retry logic with exponential backoff
//! - Status code classification

use crate::error::{Error, Result};
use crate::types::RequestConfig;
use std::time::Duration;
use url::Url;

/// Join a base URL and a relative path with exactly one slash between them.
///
/// # Examples
///
/// ```
/// use rxhttp::client::combine_urls;
///
/// assert_eq!(combine_urls("http://api/", "/users"), "http://api/users");
/// assert_eq!(combine_urls("http://api", ""), "http://api");
/// ```
pub fn combine_urls(base: &str, relative: &str) -> String {
    if relative.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        relative.trim_start_matches('/')
    )
}

/// Build the full request URL for `config`.
///
/// An absolute `url` is used as is; a relative one is joined onto
/// `base_url`. Every entry of `params` is appended as a query pair.
///
/// # Errors
///
/// Returns [`Error::InvalidUrl`] when the URL is relative and no base is set,
/// or when the result does not parse.
pub fn build_url(config: &RequestConfig) -> Result<Url> {
    let raw = config.url.as_deref().unwrap_or_default();

    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => match config.base_url.as_deref() {
            Some(base) => Url::parse(&combine_urls(base, raw))?,
            None => {
                return Err(Error::InvalidUrl(format!("relative URL without base: {raw:?}")));
            }
        },
        Err(e) => return Err(e.into()),
    };

    if !config.params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in &config.params {
            pairs.append_pair(k, v);
        }
    }

    Ok(url)
}

/// Check if status code indicates retryable error
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 408 | 425 | 429 | 502 | 503 | 504)
}

/// Exponential backoff delay calculation
///
/// `base` doubled once per attempt, with the exponent capped at 10.
pub fn exponential_backoff(attempt: u32, base: Duration) -> Duration {
    base.saturating_mul(2_u32.pow(attempt.min(10)))
}
