//! A minimal cold observable.
//!
//! Only the pieces [`RequestObservable`] needs are here: an [`Observable`] is
//! a subscribe function that receives a [`Subscriber`] and returns a
//! [`Teardown`]. Nothing runs until [`Observable::subscribe`] is called, and
//! every call runs the subscribe function again.
//!
//! # Delivery Rules
//!
//! - A [`Subscriber`] forwards `next` until the first `error` or `complete`
//! - After a terminal event, or after [`Subscription::unsubscribe`], the
//!   observer is dropped and every further event is discarded
//! - [`Subscription::unsubscribe`] runs the teardown at most once
//!
//! # Examples
//!
//! ```
//! use rxhttp::observable::{FnObserver, Observable, Subscriber};
//! use std::sync::{Arc, Mutex};
//!
//! let source = Observable::new(|subscriber: Subscriber<u32>| {
//!     subscriber.next(1);
//!     subscriber.next(2);
//!     subscriber.complete();
//!     Box::new(|| {})
//! });
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let subscription = source.subscribe(FnObserver::new().on_next(move |v| sink.lock().unwrap().push(v)));
//!
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
//! assert!(subscription.is_closed());
//! ```

mod request;

pub use request::{CancelSource, RequestFn, RequestObservable, ResponseFuture};

use crate::error::Error;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cleanup returned by a subscribe function.
pub type Teardown = Box<dyn FnOnce() + Send>;

/// Receiver of a stream's events.
pub trait Observer<T>: Send + 'static {
    /// A value was produced.
    fn next(&mut self, value: T);

    /// The stream failed. No further events follow.
    fn error(&mut self, err: Error) {
        tracing::debug!("unhandled error in subscription: {}", err);
    }

    /// The stream finished. No further events follow.
    fn complete(&mut self) {}
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(Error) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// An [`Observer`] assembled from closures.
///
/// Unset callbacks ignore their event, so `FnObserver::new()` is a valid
/// do-nothing observer.
pub struct FnObserver<T> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> FnObserver<T> {
    /// An observer that ignores every event.
    pub fn new() -> Self {
        FnObserver {
            next: None,
            error: None,
            complete: None,
        }
    }

    /// Handle values.
    pub fn on_next(mut self, f: impl FnMut(T) + Send + 'static) -> Self {
        self.next = Some(Box::new(f));
        self
    }

    /// Handle the error event.
    pub fn on_error(mut self, f: impl FnMut(Error) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }

    /// Handle the complete event.
    pub fn on_complete(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }
}

impl<T> Default for FnObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Observer<T> for FnObserver<T> {
    fn next(&mut self, value: T) {
        if let Some(f) = &mut self.next {
            f(value);
        }
    }

    fn error(&mut self, err: Error) {
        match &mut self.error {
            Some(f) => f(err),
            None => tracing::debug!("unhandled error in subscription: {}", err),
        }
    }

    fn complete(&mut self) {
        if let Some(f) = &mut self.complete {
            f();
        }
    }
}

struct Shared<T> {
    observer: Mutex<Option<Box<dyn Observer<T>>>>,
    closed: AtomicBool,
}

/// The producer-side handle of one subscription.
///
/// Cheap to clone; all clones feed the same observer.
pub struct Subscriber<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Subscriber<T> {
    fn clone(&self) -> Self {
        Subscriber {
            shared: self.shared.clone(),
        }
    }
}

impl<T: 'static> Subscriber<T> {
    fn new(observer: Box<dyn Observer<T>>) -> Self {
        Subscriber {
            shared: Arc::new(Shared {
                observer: Mutex::new(Some(observer)),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// True once a terminal event was delivered or the consumer unsubscribed.
    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Deliver a value.
    pub fn next(&self, value: T) {
        // The observer is taken out of the slot for the call so it can
        // unsubscribe from inside its own callback.
        let Some(mut observer) = self.shared.observer.lock().take() else {
            return;
        };
        observer.next(value);

        let mut slot = self.shared.observer.lock();
        if !self.is_closed() && slot.is_none() {
            *slot = Some(observer);
        }
    }

    /// Deliver the error event and close.
    pub fn error(&self, err: Error) {
        if let Some(mut observer) = self.take_for_terminal() {
            observer.error(err);
        }
    }

    /// Deliver the complete event and close.
    pub fn complete(&self) {
        if let Some(mut observer) = self.take_for_terminal() {
            observer.complete();
        }
    }

    fn take_for_terminal(&self) -> Option<Box<dyn Observer<T>>> {
        let mut slot = self.shared.observer.lock();
        if self.shared.closed.swap(true, Ordering::AcqRel) {
            return None;
        }
        slot.take()
    }

    fn close(&self) {
        let observer = {
            let mut slot = self.shared.observer.lock();
            self.shared.closed.store(true, Ordering::Release);
            slot.take()
        };
        drop(observer);
    }
}

/// The consumer-side handle of one subscription.
pub struct Subscription {
    closed: Arc<dyn Fn() -> bool + Send + Sync>,
    teardown: Mutex<Option<Teardown>>,
}

impl Subscription {
    /// Stop receiving events and run the teardown.
    ///
    /// Idempotent: only the first call has an effect. No observer callback
    /// starts after this returns.
    pub fn unsubscribe(&self) {
        let teardown = self.teardown.lock().take();
        if let Some(teardown) = teardown {
            teardown();
        }
    }

    /// True once the stream terminated or [`Subscription::unsubscribe`] ran.
    pub fn is_closed(&self) -> bool {
        (self.closed)()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

type SubscribeFn<T> = Arc<dyn Fn(Subscriber<T>) -> Teardown + Send + Sync>;

/// A cold stream defined by its subscribe function.
pub struct Observable<T> {
    subscribe_fn: SubscribeFn<T>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Observable {
            subscribe_fn: self.subscribe_fn.clone(),
        }
    }
}

impl<T: 'static> Observable<T> {
    /// Wrap a subscribe function. Nothing runs until subscription.
    pub fn new<F>(subscribe_fn: F) -> Self
    where
        F: Fn(Subscriber<T>) -> Teardown + Send + Sync + 'static,
    {
        Observable {
            subscribe_fn: Arc::new(subscribe_fn),
        }
    }

    /// Run the subscribe function for `observer`.
    pub fn subscribe<O: Observer<T>>(&self, observer: O) -> Subscription {
        let subscriber = Subscriber::new(Box::new(observer));
        let teardown = (self.subscribe_fn)(subscriber.clone());

        let status = subscriber.clone();
        Subscription {
            closed: Arc::new(move || status.is_closed()),
            teardown: Mutex::new(Some(Box::new(move || {
                subscriber.close();
                teardown();
            }))),
        }
    }
}
