//! Pluggable transports.
//!
//! An [`Adapter`] performs exactly one HTTP round trip for a fully merged
//! [`RequestConfig`]. Defaults, interceptors, status validation and
//! cancellation are all handled before and after the adapter runs, so an
//! adapter only has to move bytes.
//!
//! Any `Fn(RequestConfig) -> impl Future<Output = Result<Response>>` is an
//! adapter, which keeps test doubles short:
//!
//! ```
//! use rxhttp::{RequestConfig, Response};
//! use rxhttp::client::Adapter;
//! use std::sync::Arc;
//!
//! let adapter: Arc<dyn Adapter> = Arc::new(|config: RequestConfig| async move {
//!     Ok::<_, rxhttp::Error>(Response::new(bytes::Bytes::from_static(b"pong"), 200).with_config(config))
//! });
//! ```

use crate::client::config::TransportConfig;
use crate::client::utils::build_url;
use crate::error::Result;
use crate::types::{RequestConfig, Response};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// A one-shot HTTP transport.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Execute the request described by `config` and return its response.
    ///
    /// Implementations should echo `config` back in [`Response::config`].
    async fn send(&self, config: RequestConfig) -> Result<Response>;
}

#[async_trait]
impl<F, Fut> Adapter for F
where
    F: Fn(RequestConfig) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    async fn send(&self, config: RequestConfig) -> Result<Response> {
        (self)(config).await
    }
}

static DEFAULT_ADAPTER: LazyLock<Arc<ReqwestAdapter>> =
    LazyLock::new(|| Arc::new(ReqwestAdapter::new()));

/// The adapter used when a config carries no override.
pub(crate) fn default_adapter() -> Arc<dyn Adapter> {
    DEFAULT_ADAPTER.clone()
}

/// Transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestAdapter {
    client: reqwest::Client,
    config: Arc<TransportConfig>,
}

impl ReqwestAdapter {
    /// Create an adapter with the default transport configuration.
    pub fn new() -> Self {
        Self::with_config(TransportConfig::default())
    }

    /// Create an adapter with a custom transport configuration.
    pub fn with_config(config: TransportConfig) -> Self {
        let mut builder = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host);

        if config.request_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.request_timeout_ms));
        }

        if !config.proxy_url.is_empty() {
            match reqwest::Proxy::all(&config.proxy_url) {
                Ok(proxy) => builder = builder.proxy(proxy),
                Err(e) => tracing::warn!("Ignoring invalid proxy {}: {}", config.proxy_url, e),
            }
        }

        let client = builder.build().unwrap_or_default();

        ReqwestAdapter {
            client,
            config: Arc::new(config),
        }
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_client(client: reqwest::Client) -> Self {
        ReqwestAdapter {
            client,
            config: Arc::new(TransportConfig::default()),
        }
    }

    /// Get the transport configuration
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

impl Default for ReqwestAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Adapter for ReqwestAdapter {
    async fn send(&self, config: RequestConfig) -> Result<Response> {
        let url = build_url(&config)?;
        let method = config.method_or_default();

        if self.config.enable_logging {
            tracing::info!("{} {}", method, url);
        }

        let mut req_builder = self.client.request(method, url);

        for (k, v) in &config.headers {
            req_builder = req_builder.header(k, v);
        }
        if let Some(timeout) = config.timeout {
            req_builder = req_builder.timeout(timeout);
        }
        if let Some(data) = &config.data {
            req_builder = req_builder.body(data.clone());
        }

        let response = req_builder.send().await?;
        let status = response.status();

        let mut headers = BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                headers.insert(k.as_str().to_string(), val.to_string());
            }
        }

        let body = response.bytes().await?;

        Ok(Response {
            data: body,
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use http::Method;

    #[tokio::test]
    async fn test_closure_adapter() {
        let adapter: Arc<dyn Adapter> = Arc::new(|config: RequestConfig| async move {
            Ok::<_, Error>(Response::new(bytes::Bytes::from_static(b"pong"), 200).with_config(config))
        });

        let response = adapter.send(RequestConfig::from("http://x/ping")).await.unwrap();
        assert_eq!(response.data, "pong");
        assert_eq!(response.config.url.as_deref(), Some("http://x/ping"));
    }

    #[tokio::test]
    async fn test_reqwest_get_with_params() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/todos")
            .match_query(mockito::Matcher::UrlEncoded("page".into(), "2".into()))
            .match_header("x-client", "rxhttp")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id":1}]"#)
            .create_async()
            .await;

        let config = RequestConfig::from("/todos")
            .with_base_url(server.url())
            .with_param("page", "2")
            .with_header("x-client", "rxhttp");

        let response = ReqwestAdapter::new().send(config).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.status_text, "OK");
        assert_eq!(response.headers["content-type"], "application/json");
        let typed: Response<serde_json::Value> = response.json().unwrap();
        assert_eq!(typed.data[0]["id"], 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reqwest_post_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/todos")
            .match_body(r#"{"title":"milk"}"#)
            .with_status(201)
            .create_async()
            .await;

        let config = RequestConfig::new()
            .with_method(Method::POST)
            .with_url(format!("{}/todos", server.url()))
            .with_data(r#"{"title":"milk"}"#);

        let response = ReqwestAdapter::new().send(config).await.unwrap();
        assert_eq!(response.status, 201);
        assert_eq!(response.config.method, Some(Method::POST));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_reqwest_returns_error_statuses_as_responses() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;

        let response = ReqwestAdapter::new()
            .send(RequestConfig::from(format!("{}/missing", server.url())))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(response.status_text, "Not Found");
    }

    #[tokio::test]
    async fn test_reqwest_relative_url_without_base() {
        let result = ReqwestAdapter::new().send(RequestConfig::from("/nowhere")).await;
        assert!(matches!(result, Err(Error::InvalidUrl(_))));
    }
}
