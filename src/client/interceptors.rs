//! Request and response interceptor registries.
//!
//! A registry is an ordered list of handler pairs. Registering returns an id
//! that can later be ejected; ejected slots stay in place so ids of other
//! handlers remain valid.
//!
//! Dispatch runs request interceptors in reverse registration order (the most
//! recently added sees the config first) and response interceptors in
//! registration order.
//!
//! # Examples
//!
//! ```
//! use rxhttp::Client;
//!
//! let client = Client::new();
//! let id = client.interceptors().request.add(|config| {
//!     Ok(config.with_header("authorization", "Bearer token"))
//! });
//! assert_eq!(client.interceptors().request.len(), 1);
//!
//! client.interceptors().request.eject(id);
//! assert!(client.interceptors().request.is_empty());
//! ```

use crate::error::{Error, Result};
use crate::types::{RequestConfig, Response};
use parking_lot::RwLock;
use std::sync::Arc;

/// Handler invoked with the value flowing through the chain.
pub type Fulfilled<T> = Arc<dyn Fn(T) -> Result<T> + Send + Sync>;

/// Handler invoked with an error flowing through the chain; may recover.
pub type Rejected<T> = Arc<dyn Fn(Error) -> Result<T> + Send + Sync>;

/// One registered handler pair.
pub struct Handler<T> {
    /// Called when the previous step succeeded
    pub fulfilled: Fulfilled<T>,
    /// Called when the previous step failed
    pub rejected: Option<Rejected<T>>,
}

impl<T> Clone for Handler<T> {
    fn clone(&self) -> Self {
        Handler {
            fulfilled: self.fulfilled.clone(),
            rejected: self.rejected.clone(),
        }
    }
}

/// Ordered registry of interceptor handlers.
pub struct InterceptorManager<T> {
    slots: RwLock<Vec<Option<Handler<T>>>>,
}

impl<T> InterceptorManager<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        InterceptorManager {
            slots: RwLock::new(Vec::new()),
        }
    }

    /// Register a handler and return its id.
    pub fn add<F>(&self, fulfilled: F) -> usize
    where
        F: Fn(T) -> Result<T> + Send + Sync + 'static,
    {
        self.push(Handler {
            fulfilled: Arc::new(fulfilled),
            rejected: None,
        })
    }

    /// Register a handler together with an error handler and return its id.
    pub fn add_with_rejected<F, R>(&self, fulfilled: F, rejected: R) -> usize
    where
        F: Fn(T) -> Result<T> + Send + Sync + 'static,
        R: Fn(Error) -> Result<T> + Send + Sync + 'static,
    {
        self.push(Handler {
            fulfilled: Arc::new(fulfilled),
            rejected: Some(Arc::new(rejected)),
        })
    }

    fn push(&self, handler: Handler<T>) -> usize {
        let mut slots = self.slots.write();
        slots.push(Some(handler));
        slots.len() - 1
    }

    /// Remove the handler registered under `id`.
    ///
    /// Returns false if there was no such handler.
    pub fn eject(&self, id: usize) -> bool {
        self.slots
            .write()
            .get_mut(id)
            .and_then(Option::take)
            .is_some()
    }

    /// Remove every handler.
    pub fn clear(&self) {
        self.slots.write().clear();
    }

    /// Number of active handlers.
    pub fn len(&self) -> usize {
        self.slots.read().iter().flatten().count()
    }

    /// True if no handler is active.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Active handlers in registration order.
    pub fn handlers(&self) -> Vec<Handler<T>> {
        self.slots.read().iter().flatten().cloned().collect()
    }
}

impl<T> Default for InterceptorManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The request/response registry pair owned by a facade instance.
#[derive(Default)]
pub struct Interceptors {
    /// Applied to the merged config before the transport runs
    pub request: InterceptorManager<RequestConfig>,
    /// Applied to the transport result
    pub response: InterceptorManager<Response>,
}

/// Thread `start` through `handlers`, in the order given.
pub(crate) fn run_chain<T>(
    handlers: impl IntoIterator<Item = Handler<T>>,
    start: Result<T>,
) -> Result<T> {
    handlers
        .into_iter()
        .fold(start, |acc, handler| match acc {
            Ok(value) => (handler.fulfilled)(value),
            Err(err) => match &handler.rejected {
                Some(rejected) => rejected(err),
                None => Err(err),
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_eject_keep_ids_stable() {
        let manager: InterceptorManager<u32> = InterceptorManager::new();
        let first = manager.add(|v| Ok(v + 1));
        let second = manager.add(|v| Ok(v * 10));
        assert_eq!((first, second), (0, 1));

        assert!(manager.eject(first));
        assert!(!manager.eject(first));
        assert!(!manager.eject(42));
        assert_eq!(manager.len(), 1);

        let third = manager.add(|v| Ok(v));
        assert_eq!(third, 2);
    }

    #[test]
    fn test_chain_runs_in_given_order() {
        let manager: InterceptorManager<u32> = InterceptorManager::new();
        manager.add(|v| Ok(v + 1));
        manager.add(|v| Ok(v * 10));

        assert_eq!(run_chain(manager.handlers(), Ok(1)).unwrap(), 20);
        assert_eq!(
            run_chain(manager.handlers().into_iter().rev(), Ok(1)).unwrap(),
            11
        );
    }

    #[test]
    fn test_rejected_handler_recovers() {
        let manager: InterceptorManager<u32> = InterceptorManager::new();
        manager.add(|_| Err(Error::Interceptor("boom".to_string())));
        manager.add_with_rejected(Ok, |_| Ok(7));
        manager.add(|v| Ok(v + 1));

        assert_eq!(run_chain(manager.handlers(), Ok(0)).unwrap(), 8);
    }

    #[test]
    fn test_error_passes_through_without_rejected() {
        let manager: InterceptorManager<u32> = InterceptorManager::new();
        manager.add(|v| Ok(v + 1));

        let result = run_chain(manager.handlers(), Err(Error::Timeout));
        assert!(matches!(result, Err(Error::Timeout)));
    }

    #[test]
    fn test_clear() {
        let interceptors = Interceptors::default();
        interceptors.request.add(Ok);
        interceptors.response.add(Ok);
        interceptors.request.clear();
        assert!(interceptors.request.is_empty());
        assert_eq!(interceptors.response.len(), 1);
    }
}
