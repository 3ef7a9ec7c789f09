//! HTTP client facade and the one-shot request machinery behind it.
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── facade       - Client, the global instance and its free functions
//! ├── verbs        - Verb table and argument normalization
//! ├── dispatch     - One-shot request pipeline (defaults, interceptors, adapter)
//! ├── interceptors - Request/response interceptor registries
//! ├── transport    - Adapter trait and the reqwest transport
//! ├── config       - Transport configuration
//! └── utils        - URL building, backoff, status classification
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Client`] | Facade returning lazy requests |
//! | [`Adapter`] | Pluggable one-shot transport |
//! | [`ReqwestAdapter`] | Default transport |
//! | [`InterceptorManager`] | Ordered interceptor registry |
//! | [`TransportConfig`] | Connection pool settings |
//!
//! # Examples
//!
//! ## Creating a Client
//!
//! ```
//! use rxhttp::{Client, RequestConfig};
//! use std::time::Duration;
//!
//! // Library defaults
//! let client = Client::new();
//!
//! // Custom defaults
//! let api = Client::with_config(
//!     RequestConfig::new()
//!         .with_base_url("https://api.example.com")
//!         .with_timeout(Duration::from_secs(10)),
//! );
//! assert_eq!(api.defaults().timeout, Some(Duration::from_secs(10)));
//! ```
//!
//! ## Swapping the Transport
//!
//! ```
//! use rxhttp::client::{ReqwestAdapter, TransportConfig};
//! use rxhttp::{Client, RequestConfig};
//! use std::sync::Arc;
//!
//! let transport = ReqwestAdapter::with_config(TransportConfig {
//!     max_idle_per_host: 4,
//!     ..Default::default()
//! });
//! let client = Client::with_config(RequestConfig::new().with_adapter(Arc::new(transport)));
//! assert!(client.defaults().adapter.is_some());
//! ```
//!
//! ## Utility Functions
//!
//! ```
//! use rxhttp::client::{exponential_backoff, is_retryable_status};
//! use std::time::Duration;
//!
//! assert!(is_retryable_status(503));
//! assert!(!is_retryable_status(404));
//!
//! let delay = exponential_backoff(2, Duration::from_millis(100));
//! assert_eq!(delay, Duration::from_millis(400));
//! ```

mod config;
mod dispatch;
mod facade;
mod interceptors;
mod transport;
mod utils;
mod verbs;

pub use config::TransportConfig;
pub use facade::{
    create, delete, delete_with, get, get_with, global, head, head_with, options, options_with,
    patch, patch_with, post, post_with, put, put_with, request, request_url, Client,
};
pub use interceptors::{Fulfilled, Handler, InterceptorManager, Interceptors, Rejected};
pub use transport::{Adapter, ReqwestAdapter};
pub use utils::*;
pub use verbs::{build_request, Verb};
