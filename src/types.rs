//! Request descriptors and response envelopes.
//!
//! [`RequestConfig`] plays two roles, as it does in the client this crate
//! adapts: it describes a single request, and it holds the per-instance
//! defaults a facade merges every request into. [`Response`] is the envelope
//! produced once per successful attempt.

use crate::client::Adapter;
use crate::error::{Error, Result};
use bytes::Bytes;
use http::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Predicate deciding whether a status code counts as success.
pub type StatusValidator = Arc<dyn Fn(u16) -> bool + Send + Sync>;

/// Configuration of a single request, or the defaults of a facade instance.
///
/// Every field is optional so that a per-call config can be overlaid on the
/// instance defaults with [`RequestConfig::merge`].
///
/// # Examples
///
/// ```
/// use rxhttp::RequestConfig;
/// use http::Method;
///
/// let config = RequestConfig::new()
///     .with_method(Method::POST)
///     .with_url("/users")
///     .with_base_url("https://api.example.com")
///     .with_header("x-trace", "abc")
///     .with_param("page", "2")
///     .with_data("{}");
///
/// assert_eq!(config.url.as_deref(), Some("/users"));
/// assert_eq!(config.headers["x-trace"], "abc");
/// ```
#[derive(Clone, Default)]
pub struct RequestConfig {
    /// HTTP method; dispatch falls back to GET when unset
    pub method: Option<Method>,
    /// Absolute URL, or a path relative to `base_url`
    pub url: Option<String>,
    /// Prefix for relative URLs
    pub base_url: Option<String>,
    /// Request headers, merged key by key with the defaults
    pub headers: BTreeMap<String, String>,
    /// Query parameters, merged key by key with the defaults
    pub params: BTreeMap<String, String>,
    /// Request body
    pub data: Option<Bytes>,
    /// Per-request timeout handed to the transport
    pub timeout: Option<Duration>,
    /// External cancellation signal
    pub cancel_token: Option<CancellationToken>,
    /// Transport override
    pub adapter: Option<Arc<dyn Adapter>>,
    /// Status validation override; defaults to 2xx
    pub validate_status: Option<StatusValidator>,
}

impl RequestConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults a fresh facade starts from.
    pub fn library_defaults() -> Self {
        Self::new().with_header("accept", "application/json, text/plain, */*")
    }

    /// Set the HTTP method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Set the URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the base URL relative URLs are resolved against.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add a query parameter.
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set the raw request body.
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Serialize `value` as the JSON request body and set the content type.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if `value` cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self> {
        let body = serde_json::to_vec(value)?;
        Ok(self
            .with_header("content-type", "application/json")
            .with_data(body))
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Attach an external cancellation signal.
    pub fn with_cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Override the transport.
    pub fn with_adapter(mut self, adapter: Arc<dyn Adapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    /// Override status validation.
    pub fn with_validate_status<F>(mut self, validate: F) -> Self
    where
        F: Fn(u16) -> bool + Send + Sync + 'static,
    {
        self.validate_status = Some(Arc::new(validate));
        self
    }

    /// Overlay `overrides` on top of `self`.
    ///
    /// Fields set in `overrides` win. `headers` and `params` are merged key by
    /// key, the override winning per key; everything else is replaced whole.
    pub fn merge(&self, overrides: &RequestConfig) -> RequestConfig {
        let mut merged = self.clone();
        if overrides.method.is_some() {
            merged.method.clone_from(&overrides.method);
        }
        if overrides.url.is_some() {
            merged.url.clone_from(&overrides.url);
        }
        if overrides.base_url.is_some() {
            merged.base_url.clone_from(&overrides.base_url);
        }
        for (k, v) in &overrides.headers {
            merged.headers.insert(k.clone(), v.clone());
        }
        for (k, v) in &overrides.params {
            merged.params.insert(k.clone(), v.clone());
        }
        if overrides.data.is_some() {
            merged.data.clone_from(&overrides.data);
        }
        if overrides.timeout.is_some() {
            merged.timeout = overrides.timeout;
        }
        if overrides.cancel_token.is_some() {
            merged.cancel_token.clone_from(&overrides.cancel_token);
        }
        if overrides.adapter.is_some() {
            merged.adapter.clone_from(&overrides.adapter);
        }
        if overrides.validate_status.is_some() {
            merged.validate_status.clone_from(&overrides.validate_status);
        }
        merged
    }

    /// The effective method.
    pub fn method_or_default(&self) -> Method {
        self.method.clone().unwrap_or(Method::GET)
    }

    /// Run the status validator, defaulting to 2xx.
    pub fn is_valid_status(&self, status: u16) -> bool {
        match &self.validate_status {
            Some(validate) => validate(status),
            None => (200..300).contains(&status),
        }
    }
}

impl From<&str> for RequestConfig {
    fn from(url: &str) -> Self {
        RequestConfig::new().with_url(url)
    }
}

impl From<String> for RequestConfig {
    fn from(url: String) -> Self {
        RequestConfig::new().with_url(url)
    }
}

impl fmt::Debug for RequestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestConfig")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("params", &self.params)
            .field("data", &self.data.as_ref().map(Bytes::len))
            .field("timeout", &self.timeout)
            .field("cancel_token", &self.cancel_token.is_some())
            .field("adapter", &self.adapter.is_some())
            .field("validate_status", &self.validate_status.is_some())
            .finish()
    }
}

/// A response produced by one request attempt.
///
/// `data` is the raw body by default; [`Response::json`] converts it into a
/// typed payload while keeping the rest of the envelope.
#[derive(Debug, Clone)]
pub struct Response<T = Bytes> {
    /// Response payload
    pub data: T,
    /// HTTP status code
    pub status: u16,
    /// Reason phrase for the status code
    pub status_text: String,
    /// Response headers (lowercase names)
    pub headers: BTreeMap<String, String>,
    /// The config the request was dispatched with
    pub config: RequestConfig,
}

impl<T> Response<T> {
    /// Build a response with the canonical reason phrase for `status`.
    pub fn new(data: T, status: u16) -> Self {
        let status_text = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Response {
            data,
            status,
            status_text,
            headers: BTreeMap::new(),
            config: RequestConfig::default(),
        }
    }

    /// Replace the status text.
    pub fn with_status_text(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = status_text.into();
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach the originating config.
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = config;
        self
    }

    /// Transform the payload, keeping the envelope.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            data: f(self.data),
            status: self.status,
            status_text: self.status_text,
            headers: self.headers,
            config: self.config,
        }
    }
}

impl Response<Bytes> {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is not valid JSON for `U`.
    pub fn json<U: DeserializeOwned>(self) -> Result<Response<U>> {
        let data: U = serde_json::from_slice(&self.data)?;
        Ok(self.map(|_| data))
    }

    /// Decode the body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.data.to_vec()).map_err(|e| Error::Decode(e.to_string()))
    }
}
