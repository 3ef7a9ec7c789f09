//! The client facade.
//!
//! [`Client`] mirrors the instance surface of a conventional promise-based
//! HTTP client (`request`, `get`, `post`, ..., `defaults`, `interceptors`,
//! `create`) but every request method returns a lazy
//! [`RequestObservable`] instead of a running future.
//!
//! # Instances and Defaults
//!
//! - A `Client` is a handle; clones share one set of defaults and interceptors
//! - [`Client::create`] makes an independent instance from a snapshot of this
//!   instance's defaults
//! - Defaults are read when a request is dispatched, not when it is built, so
//!   a mutation is visible to every request subscribed after it
//!
//! The process-wide instance behind [`global`] backs the free functions
//! ([`request`], [`get`], [`post`], ...), and [`create`] snapshots it.
//!
//! # Examples
//!
//! ```ignore
//! use rxhttp::{Client, RequestConfig};
//!
//! let api = rxhttp::create(RequestConfig::new().with_base_url("https://api.example.com"));
//! api.defaults_mut().headers.insert("authorization".into(), "Bearer t".into());
//!
//! let user = api.get("/users/1").json::<serde_json::Value>().await?;
//! println!("{}", user.data["name"]);
//! ```

use crate::client::dispatch::dispatch;
use crate::client::interceptors::Interceptors;
use crate::client::verbs::{build_request, Verb};
use crate::observable::{CancelSource, RequestFn, RequestObservable};
use crate::types::RequestConfig;
use bytes::Bytes;
use parking_lot::{RwLock, RwLockWriteGuard};
use std::fmt;
use std::sync::{Arc, LazyLock};

struct ClientInner {
    defaults: RwLock<RequestConfig>,
    interceptors: Interceptors,
}

/// Facade issuing lazy, cancellable requests.
///
/// Defaults are shared mutable state guarded by a lock; concurrent requests
/// see whichever value was current when each of them was dispatched.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Create a client with the library defaults.
    pub fn new() -> Self {
        Self::from_defaults(RequestConfig::library_defaults())
    }

    /// Create a client with the library defaults overlaid by `config`.
    pub fn with_config(config: RequestConfig) -> Self {
        Self::from_defaults(RequestConfig::library_defaults().merge(&config))
    }

    fn from_defaults(defaults: RequestConfig) -> Self {
        Client {
            inner: Arc::new(ClientInner {
                defaults: RwLock::new(defaults),
                interceptors: Interceptors::default(),
            }),
        }
    }

    /// Create an independent instance whose defaults are a snapshot of this
    /// instance's defaults overlaid by `config`.
    ///
    /// The new instance starts with empty interceptor registries.
    pub fn create(&self, config: RequestConfig) -> Client {
        Self::from_defaults(self.defaults().merge(&config))
    }

    /// A snapshot of the current defaults.
    pub fn defaults(&self) -> RequestConfig {
        self.inner.defaults.read().clone()
    }

    /// Mutable access to the defaults.
    ///
    /// Requests block on dispatch while the guard is held, so keep it short.
    pub fn defaults_mut(&self) -> RwLockWriteGuard<'_, RequestConfig> {
        self.inner.defaults.write()
    }

    /// The interceptor registries of this instance.
    pub fn interceptors(&self) -> &Interceptors {
        &self.inner.interceptors
    }

    /// Build a request from a full config, or from a bare URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use rxhttp::{Client, RequestConfig};
    /// use http::Method;
    ///
    /// let client = Client::new();
    /// let by_url = client.request("http://awesome.me");
    /// let by_config = client.request(RequestConfig::from("http://awesome.me").with_method(Method::DELETE));
    ///
    /// assert_eq!(by_url.config().url, by_config.config().url);
    /// ```
    pub fn request(&self, config: impl Into<RequestConfig>) -> RequestObservable {
        RequestObservable::create(config.into(), self.request_fn())
            .with_cancel_source(self.cancel_source())
    }

    /// Build a request for `url` with the rest taken from `config`.
    pub fn request_url(&self, url: &str, config: RequestConfig) -> RequestObservable {
        self.request(config.with_url(url))
    }

    fn verb(
        &self,
        verb: Verb,
        url: &str,
        data: Option<Bytes>,
        config: Option<RequestConfig>,
    ) -> RequestObservable {
        self.request(build_request(verb, url, data, config))
    }

    // ========== Verbs Without Body ==========

    /// `GET url`
    pub fn get(&self, url: &str) -> RequestObservable {
        self.verb(Verb::Get, url, None, None)
    }

    /// `GET url` with extra config.
    pub fn get_with(&self, url: &str, config: RequestConfig) -> RequestObservable {
        self.verb(Verb::Get, url, None, Some(config))
    }

    /// `DELETE url`
    pub fn delete(&self, url: &str) -> RequestObservable {
        self.verb(Verb::Delete, url, None, None)
    }

    /// `DELETE url` with extra config.
    pub fn delete_with(&self, url: &str, config: RequestConfig) -> RequestObservable {
        self.verb(Verb::Delete, url, None, Some(config))
    }

    /// `HEAD url`
    pub fn head(&self, url: &str) -> RequestObservable {
        self.verb(Verb::Head, url, None, None)
    }

    /// `HEAD url` with extra config.
    pub fn head_with(&self, url: &str, config: RequestConfig) -> RequestObservable {
        self.verb(Verb::Head, url, None, Some(config))
    }

    /// `OPTIONS url`
    pub fn options(&self, url: &str) -> RequestObservable {
        self.verb(Verb::Options, url, None, None)
    }

    /// `OPTIONS url` with extra config.
    pub fn options_with(&self, url: &str, config: RequestConfig) -> RequestObservable {
        self.verb(Verb::Options, url, None, Some(config))
    }

    // ========== Verbs With Body ==========

    /// `POST url` with `data` as the body.
    pub fn post(&self, url: &str, data: impl Into<Bytes>) -> RequestObservable {
        self.verb(Verb::Post, url, Some(data.into()), None)
    }

    /// `POST url` with extra config and an optional body.
    ///
    /// `None` leaves the body to `config` and the defaults.
    pub fn post_with(
        &self,
        url: &str,
        data: Option<Bytes>,
        config: RequestConfig,
    ) -> RequestObservable {
        self.verb(Verb::Post, url, data, Some(config))
    }

    /// `PUT url` with `data` as the body.
    pub fn put(&self, url: &str, data: impl Into<Bytes>) -> RequestObservable {
        self.verb(Verb::Put, url, Some(data.into()), None)
    }

    /// `PUT url` with extra config and an optional body.
    ///
    /// `None` leaves the body to `config` and the defaults.
    pub fn put_with(
        &self,
        url: &str,
        data: Option<Bytes>,
        config: RequestConfig,
    ) -> RequestObservable {
        self.verb(Verb::Put, url, data, Some(config))
    }

    /// `PATCH url` with `data` as the body.
    pub fn patch(&self, url: &str, data: impl Into<Bytes>) -> RequestObservable {
        self.verb(Verb::Patch, url, Some(data.into()), None)
    }

    /// `PATCH url` with extra config and an optional body.
    ///
    /// `None` leaves the body to `config` and the defaults.
    pub fn patch_with(
        &self,
        url: &str,
        data: Option<Bytes>,
        config: RequestConfig,
    ) -> RequestObservable {
        self.verb(Verb::Patch, url, data, Some(config))
    }

    /// The cancellation token held by the defaults when an attempt starts.
    fn cancel_source(&self) -> CancelSource {
        let inner = self.inner.clone();
        Arc::new(move || inner.defaults.read().cancel_token.clone())
    }

    /// The one-shot call bound to this instance's defaults and interceptors.
    fn request_fn(&self) -> RequestFn {
        let inner = self.inner.clone();
        Arc::new(move |config: RequestConfig| {
            let defaults = inner.defaults.read();
            dispatch(&defaults, &inner.interceptors, config)
        })
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("defaults", &*self.inner.defaults.read())
            .field("request_interceptors", &self.inner.interceptors.request.len())
            .field("response_interceptors", &self.inner.interceptors.response.len())
            .finish()
    }
}

// ========== Process-wide Instance ==========

static GLOBAL: LazyLock<Client> = LazyLock::new(Client::new);

/// The process-wide default instance.
pub fn global() -> &'static Client {
    &GLOBAL
}

/// Create an independent instance from a snapshot of the global defaults
/// overlaid by `config`.
pub fn create(config: RequestConfig) -> Client {
    global().create(config)
}

/// Build a request on the global instance.
pub fn request(config: impl Into<RequestConfig>) -> RequestObservable {
    global().request(config)
}

/// Build a request for `url` on the global instance.
pub fn request_url(url: &str, config: RequestConfig) -> RequestObservable {
    global().request_url(url, config)
}

/// `GET url` on the global instance.
pub fn get(url: &str) -> RequestObservable {
    global().get(url)
}

/// `GET url` with extra config on the global instance.
pub fn get_with(url: &str, config: RequestConfig) -> RequestObservable {
    global().get_with(url, config)
}

/// `DELETE url` on the global instance.
pub fn delete(url: &str) -> RequestObservable {
    global().delete(url)
}

/// `DELETE url` with extra config on the global instance.
pub fn delete_with(url: &str, config: RequestConfig) -> RequestObservable {
    global().delete_with(url, config)
}

/// `HEAD url` on the global instance.
pub fn head(url: &str) -> RequestObservable {
    global().head(url)
}

/// `HEAD url` with extra config on the global instance.
pub fn head_with(url: &str, config: RequestConfig) -> RequestObservable {
    global().head_with(url, config)
}

/// `OPTIONS url` on the global instance.
pub fn options(url: &str) -> RequestObservable {
    global().options(url)
}

/// `OPTIONS url` with extra config on the global instance.
pub fn options_with(url: &str, config: RequestConfig) -> RequestObservable {
    global().options_with(url, config)
}

/// `POST url` on the global instance.
pub fn post(url: &str, data: impl Into<Bytes>) -> RequestObservable {
    global().post(url, data)
}

/// `POST url` with extra config and an optional body on the global instance.
pub fn post_with(url: &str, data: Option<Bytes>, config: RequestConfig) -> RequestObservable {
    global().post_with(url, data, config)
}

/// `PUT url` on the global instance.
pub fn put(url: &str, data: impl Into<Bytes>) -> RequestObservable {
    global().put(url, data)
}

/// `PUT url` with extra config and an optional body on the global instance.
pub fn put_with(url: &str, data: Option<Bytes>, config: RequestConfig) -> RequestObservable {
    global().put_with(url, data, config)
}

/// `PATCH url` on the global instance.
pub fn patch(url: &str, data: impl Into<Bytes>) -> RequestObservable {
    global().patch(url, data)
}

/// `PATCH url` with extra config and an optional body on the global instance.
pub fn patch_with(url: &str, data: Option<Bytes>, config: RequestConfig) -> RequestObservable {
    global().patch_with(url, data, config)
}
