#![warn(missing_docs)]

//! # rxhttp: Observable HTTP Requests
//!
//! This crate turns one-shot HTTP requests into cold, cancellable values that
//! can be subscribed to like an observable, consumed as a `Stream`, or simply
//! awaited. The facade keeps the familiar shape of a promise-based HTTP client
//! (`request`, `get`, `post`, `defaults`, `interceptors`, `create`), so only
//! the way results are consumed changes.
//!
//! ## Semantics
//!
//! 1. **Lazy** - building a request performs no I/O
//! 2. **Cold** - every subscription, stream or `await` issues its own request
//! 3. **Single-shot** - one value then completion, or one error
//! 4. **Cancellable** - unsubscribing or dropping aborts the in-flight call;
//!    cancellation completes silently instead of surfacing as an error
//!
//! ## Usage
//!
//! ```ignore
//! use rxhttp::observable::FnObserver;
//! use rxhttp::RequestConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), rxhttp::Error> {
//!     // Await it
//!     let response = rxhttp::get("https://example.com/todos/1").await?;
//!     println!("{} {}", response.status, response.status_text);
//!
//!     // Subscribe to it
//!     let subscription = rxhttp::get("https://example.com/todos/2").subscribe(
//!         FnObserver::new()
//!             .on_next(|r| println!("got {}", r.status))
//!             .on_error(|e| eprintln!("failed: {e}")),
//!     );
//!
//!     // Unsubscribing before it settles cancels the request
//!     subscription.unsubscribe();
//!
//!     // Independent instances with their own defaults
//!     let api = rxhttp::create(RequestConfig::new().with_base_url("https://example.com"));
//!     let todo = api.get("/todos/3").json::<serde_json::Value>().await?;
//!     println!("{}", todo.data["title"]);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Request descriptors and response envelopes
//! - **[error]** - Error types and result handling
//! - **[observable]** - The lazy observable primitive and [`RequestObservable`]
//! - **[client]** - The [`Client`] facade, interceptors and transports

pub mod client;
pub mod error;
pub mod observable;
pub mod types;

pub use client::{
    create, delete, delete_with, get, get_with, global, head, head_with, options, options_with,
    patch, patch_with, post, post_with, put, put_with, request, request_url, Client,
};
pub use error::{Error, Result};
pub use observable::{RequestObservable, Subscription};
pub use types::{RequestConfig, Response};
