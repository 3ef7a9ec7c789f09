//! Configuration for the default reqwest transport.

use serde::{Deserialize, Serialize};

/// Connection-level settings for [`ReqwestAdapter`](crate::client::ReqwestAdapter).
///
/// Per-request settings (headers, timeout, base URL) live in
/// [`RequestConfig`](crate::RequestConfig) instead; this struct only shapes the
/// underlying connection pool.
///
/// # Examples
///
/// ```
/// use rxhttp::client::TransportConfig;
///
/// let config = TransportConfig {
///     request_timeout_ms: 5_000,
///     ..Default::default()
/// };
/// assert_eq!(config.max_idle_per_host, 16);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Upper bound for a whole request, in milliseconds. `0` disables it.
    pub request_timeout_ms: u64,
    /// How long idle pooled connections are kept, in seconds
    pub pool_idle_timeout_secs: u64,
    /// Maximum idle connections kept per host
    pub max_idle_per_host: usize,
    /// Proxy for all traffic; empty means none
    pub proxy_url: String,
    /// Emit a log line per dispatched request
    pub enable_logging: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            request_timeout_ms: 0,
            pool_idle_timeout_secs: 90,
            max_idle_per_host: 16,
            proxy_url: String::new(),
            enable_logging: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_deserializes() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"request_timeout_ms": 2500, "enable_logging": true}"#).unwrap();
        assert_eq!(config.request_timeout_ms, 2500);
        assert!(config.enable_logging);
        assert_eq!(config.pool_idle_timeout_secs, 90);
        assert!(config.proxy_url.is_empty());
    }
}
