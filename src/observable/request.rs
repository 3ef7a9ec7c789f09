//! Cold, cancellable, awaitable HTTP requests.
//!
//! A [`RequestObservable`] pairs a request descriptor with the one-shot
//! function that issues it. Creating one does nothing; each consumption runs
//! one independent attempt with its own cancellation handle:
//!
//! | Consumption | Value | Cancellation |
//! |-------------|-------|--------------|
//! | [`subscribe`](RequestObservable::subscribe) | `next` + `complete`, or `error` | silent `complete` |
//! | `.await` | `Ok(response)` or `Err(error)` | `Err(Error::Cancelled)` |
//! | [`stream`](RequestObservable::stream) | one `Ok` item, or one `Err` item | empty stream |
//!
//! Nothing is cached between attempts, so resubscribing is how a request is
//! retried.
//!
//! # Examples
//!
//! ```ignore
//! use rxhttp::Client;
//! use futures::StreamExt;
//!
//! let client = Client::new();
//! let todos = client.get("https://example.com/todos");
//!
//! // Await it like a future...
//! let response = todos.clone().await?;
//!
//! // ...or run it again as a stream
//! let mut stream = todos.stream();
//! while let Some(result) = stream.next().await {
//!     println!("{}", result?.status);
//! }
//! ```

use crate::client::exponential_backoff;
use crate::error::{Error, Result};
use crate::observable::{Observable, Observer, Subscriber, Subscription, Teardown};
use crate::types::{RequestConfig, Response};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use serde::de::DeserializeOwned;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// The eager one-shot request call a [`RequestObservable`] defers.
pub type RequestFn = Arc<dyn Fn(RequestConfig) -> BoxFuture<'static, Result<Response>> + Send + Sync>;

type Decode<T> = Arc<dyn Fn(Response) -> Result<Response<T>> + Send + Sync>;

/// Supplies the fallback external cancellation signal, read once per attempt.
pub type CancelSource = Arc<dyn Fn() -> Option<CancellationToken> + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

/// A lazy HTTP request that can be subscribed to, streamed, or awaited.
///
/// Cloning is cheap and yields the same recipe; every subscription, stream
/// or `await` issues its own request.
pub struct RequestObservable<T = Bytes> {
    config: RequestConfig,
    request_fn: RequestFn,
    decode: Decode<T>,
    retry: Option<RetryPolicy>,
    cancel_source: Option<CancelSource>,
}

impl<T> Clone for RequestObservable<T> {
    fn clone(&self) -> Self {
        RequestObservable {
            config: self.config.clone(),
            request_fn: self.request_fn.clone(),
            decode: self.decode.clone(),
            retry: self.retry,
            cancel_source: self.cancel_source.clone(),
        }
    }
}

impl RequestObservable<Bytes> {
    /// Defer `request_fn(config)` until consumption.
    ///
    /// Never fails and performs no I/O.
    pub fn create(config: RequestConfig, request_fn: RequestFn) -> Self {
        RequestObservable {
            config,
            request_fn,
            decode: Arc::new(|response: Response| -> Result<Response> { Ok(response) }),
            retry: None,
            cancel_source: None,
        }
    }

    /// Fall back to the token returned by `source` when the descriptor
    /// carries none of its own.
    ///
    /// `source` runs at the start of every attempt, so a facade can hand in
    /// whatever token its defaults hold at that moment.
    pub fn with_cancel_source(mut self, source: CancelSource) -> Self {
        self.cancel_source = Some(source);
        self
    }

    /// Decode each response body as JSON into `U`.
    ///
    /// A body that does not decode fails the attempt with [`Error::Decode`].
    pub fn json<U>(self) -> RequestObservable<U>
    where
        U: DeserializeOwned + Send + 'static,
    {
        RequestObservable {
            config: self.config,
            request_fn: self.request_fn,
            decode: Arc::new(|response: Response| response.json::<U>()),
            retry: self.retry,
            cancel_source: self.cancel_source,
        }
    }
}

impl<T: Send + 'static> RequestObservable<T> {
    /// The request descriptor each attempt starts from.
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// Retry retryable failures up to `max_retries` times within one
    /// subscription, without delay.
    pub fn retry(self, max_retries: u32) -> Self {
        self.retry_with_backoff(max_retries, Duration::ZERO)
    }

    /// Retry retryable failures up to `max_retries` times within one
    /// subscription, waiting `base_delay * 2^n` before retry `n`.
    ///
    /// Cancellation during the wait ends the subscription like any other
    /// cancellation.
    pub fn retry_with_backoff(mut self, max_retries: u32, base_delay: Duration) -> Self {
        self.retry = Some(RetryPolicy {
            max_retries,
            base_delay,
        });
        self
    }

    /// Subscribe with `observer`, spawning the attempt on the current tokio
    /// runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn subscribe<O: Observer<Response<T>>>(&self, observer: O) -> Subscription {
        self.to_observable().subscribe(observer)
    }

    /// Subscribe with only a value callback.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn subscribe_fn(&self, next: impl FnMut(Response<T>) + Send + 'static) -> Subscription {
        self.subscribe(crate::observable::FnObserver::new().on_next(next))
    }

    /// View this request as a plain [`Observable`].
    pub fn to_observable(&self) -> Observable<Response<T>> {
        let this = self.clone();
        Observable::new(move |subscriber: Subscriber<Response<T>>| -> Teardown {
            let (handle, attempt) = this.start();
            tokio::spawn(async move {
                match attempt.await {
                    Ok(Some(response)) => {
                        subscriber.next(response);
                        subscriber.complete();
                    }
                    Ok(None) => subscriber.complete(),
                    Err(e) => subscriber.error(e),
                }
            });
            Box::new(move || handle.cancel())
        })
    }

    /// Run one attempt as a stream of at most one item.
    ///
    /// Dropping the stream before it finishes cancels the attempt.
    pub fn stream(&self) -> BoxStream<'static, Result<Response<T>>> {
        let (handle, attempt) = self.start();
        let guard = handle.drop_guard();
        futures::stream::once(async move {
            let _guard = guard;
            attempt.await.transpose()
        })
        .filter_map(futures::future::ready)
        .boxed()
    }

    /// Promise-style continuation: run one attempt and hand its outcome to
    /// `on_fulfilled` or `on_rejected`.
    pub async fn then<U>(
        &self,
        on_fulfilled: impl FnOnce(Response<T>) -> U,
        on_rejected: impl FnOnce(Error) -> U,
    ) -> U {
        match self.await {
            Ok(response) => on_fulfilled(response),
            Err(e) => on_rejected(e),
        }
    }

    /// Create the per-attempt cancellation handle and the unpolled attempt.
    ///
    /// A caller-supplied token is the parent of the handle: cancelling it
    /// aborts the attempt, cancelling the handle never touches it. The
    /// descriptor's own token takes precedence over the cancel source.
    fn start(&self) -> (CancellationToken, BoxFuture<'static, Result<Option<Response<T>>>>) {
        let external = self
            .config
            .cancel_token
            .clone()
            .or_else(|| self.cancel_source.as_ref().and_then(|source| source()));
        let handle = match external {
            Some(external) => external.child_token(),
            None => CancellationToken::new(),
        };
        let attempt = self.run(handle.clone());
        (handle, attempt)
    }

    fn run(&self, handle: CancellationToken) -> BoxFuture<'static, Result<Option<Response<T>>>> {
        let config = self.config.clone();
        let request_fn = self.request_fn.clone();
        let decode = self.decode.clone();
        let retry = self.retry;

        let span = tracing::debug_span!("request", attempt_id = %Uuid::new_v4());

        async move {
            tracing::trace!("subscribed");
            let mut retries = 0;
            loop {
                let mut descriptor = config.clone();
                descriptor.cancel_token = Some(handle.clone());

                let result = tokio::select! {
                    biased;
                    _ = handle.cancelled() => Err(Error::Cancelled),
                    result = request_fn(descriptor) => result,
                };

                match result.and_then(|response| decode(response)) {
                    Ok(response) => {
                        tracing::debug!(status = response.status, "request settled");
                        return Ok(Some(response));
                    }
                    Err(e) if e.is_cancel() => {
                        tracing::debug!("request cancelled");
                        return Ok(None);
                    }
                    Err(e) => match retry {
                        Some(policy) if retries < policy.max_retries && e.is_retryable() => {
                            let delay = exponential_backoff(retries, policy.base_delay);
                            tracing::warn!(
                                "Request failed (attempt {}), retrying after {:?}: {}",
                                retries + 1,
                                delay,
                                e
                            );
                            tokio::select! {
                                biased;
                                _ = handle.cancelled() => return Ok(None),
                                _ = tokio::time::sleep(delay) => {}
                            }
                            retries += 1;
                        }
                        _ => {
                            tracing::debug!("request failed: {}", e);
                            return Err(e);
                        }
                    },
                }
            }
        }
        .instrument(span)
        .boxed()
    }
}

/// Future returned by awaiting a [`RequestObservable`].
///
/// Dropping it before completion cancels the attempt.
pub struct ResponseFuture<T> {
    inner: BoxFuture<'static, Result<Response<T>>>,
}

impl<T> Future for ResponseFuture<T> {
    type Output = Result<Response<T>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T: Send + 'static> IntoFuture for &RequestObservable<T> {
    type Output = Result<Response<T>>;
    type IntoFuture = ResponseFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        let (handle, attempt) = self.start();
        let guard = handle.drop_guard();
        ResponseFuture {
            inner: async move {
                let _guard = guard;
                attempt.await?.ok_or(Error::Cancelled)
            }
            .boxed(),
        }
    }
}

impl<T: Send + 'static> IntoFuture for RequestObservable<T> {
    type Output = Result<Response<T>>;
    type IntoFuture = ResponseFuture<T>;

    fn into_future(self) -> Self::IntoFuture {
        (&self).into_future()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observable::FnObserver;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready, task};

    #[derive(Debug)]
    enum Event {
        Next(u16),
        Error(String),
        Complete,
    }

    fn counting(status: u16) -> (RequestFn, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let request_fn: RequestFn = Arc::new(move |config: RequestConfig| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move {
                let response = Response::new(Bytes::from_static(br#"{"ok":true}"#), status)
                    .with_config(config);
                if (200..300).contains(&status) {
                    Ok(response)
                } else {
                    Err(Error::Status {
                        status,
                        response: Box::new(response),
                    })
                }
            }
            .boxed()
        });
        (request_fn, calls)
    }

    fn pending() -> (RequestFn, Arc<parking_lot::Mutex<Vec<CancellationToken>>>) {
        let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let tokens = seen.clone();
        let request_fn: RequestFn = Arc::new(move |config: RequestConfig| {
            if let Some(token) = &config.cancel_token {
                tokens.lock().push(token.clone());
            }
            futures::future::pending::<Result<Response>>().boxed()
        });
        (request_fn, seen)
    }

    fn recording(events: Arc<parking_lot::Mutex<Vec<Event>>>) -> (FnObserver<Response>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let tx = Arc::new(parking_lot::Mutex::new(Some(tx)));
        let (n, e, c) = (events.clone(), events.clone(), events);
        let (done_e, done_c) = (tx.clone(), tx);
        let observer = FnObserver::new()
            .on_next(move |r: Response| n.lock().push(Event::Next(r.status)))
            .on_error(move |err| {
                e.lock().push(Event::Error(err.to_string()));
                if let Some(tx) = done_e.lock().take() {
                    let _ = tx.send(());
                }
            })
            .on_complete(move || {
                c.lock().push(Event::Complete);
                if let Some(tx) = done_c.lock().take() {
                    let _ = tx.send(());
                }
            });
        (observer, rx)
    }

    #[tokio::test]
    async fn test_create_is_lazy() {
        let (request_fn, calls) = counting(200);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn);
        let _stream = observable.stream();
        let _future = observable.clone().into_future();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_subscribe_emits_then_completes() {
        let (request_fn, calls) = counting(200);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn);

        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (observer, done) = recording(events.clone());
        let subscription = observable.subscribe(observer);
        done.await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let events = events.lock();
        assert!(matches!(events.as_slice(), [Event::Next(200), Event::Complete]));
        assert!(subscription.is_closed());
        // teardown after settlement is a no-op
        subscription.unsubscribe();
    }

    #[tokio::test]
    async fn test_subscribe_surfaces_errors() {
        let (request_fn, _) = counting(500);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn);

        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (observer, done) = recording(events.clone());
        let _subscription = observable.subscribe(observer);
        done.await.unwrap();

        let events = events.lock();
        assert!(matches!(events.as_slice(), [Event::Error(msg)] if msg.contains("500")));
    }

    #[tokio::test]
    async fn test_unsubscribe_cancels_silently() {
        let (request_fn, tokens) = pending();
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn);

        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (observer, _done) = recording(events.clone());
        let subscription = observable.subscribe(observer);
        tokio::time::sleep(Duration::from_millis(10)).await;

        subscription.unsubscribe();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(events.lock().is_empty());
        let tokens = tokens.lock();
        assert_eq!(tokens.len(), 1);
        assert!(tokens[0].is_cancelled());
    }

    #[tokio::test]
    async fn test_external_cancel_completes_without_value() {
        let (request_fn, _) = pending();
        let external = CancellationToken::new();
        let observable = RequestObservable::create(
            RequestConfig::from("http://awesome.me").with_cancel_token(external.clone()),
            request_fn,
        );

        let events = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let (observer, done) = recording(events.clone());
        let _subscription = observable.subscribe(observer);
        external.cancel();
        done.await.unwrap();

        assert!(matches!(events.lock().as_slice(), [Event::Complete]));
    }

    #[tokio::test]
    async fn test_cancellation_is_one_way() {
        let (request_fn, tokens) = pending();
        let external = CancellationToken::new();
        let observable = RequestObservable::create(
            RequestConfig::from("http://awesome.me").with_cancel_token(external.clone()),
            request_fn,
        );

        let subscription = observable.subscribe(FnObserver::new());
        tokio::time::sleep(Duration::from_millis(10)).await;
        subscription.unsubscribe();

        assert!(tokens.lock()[0].is_cancelled());
        assert!(!external.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_source_is_the_fallback_parent() {
        let (request_fn, tokens) = pending();
        let fallback = CancellationToken::new();
        let source_token = fallback.clone();
        let source: CancelSource = Arc::new(move || Some(source_token.clone()));

        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn.clone())
            .with_cancel_source(source.clone());
        let mut future = task::spawn(observable.into_future());
        assert_pending!(future.poll());
        fallback.cancel();
        assert!(assert_ready!(future.poll()).unwrap_err().is_cancel());
        assert!(tokens.lock()[0].is_cancelled());

        // the descriptor's own token wins over the source
        let own = CancellationToken::new();
        let observable = RequestObservable::create(
            RequestConfig::from("http://awesome.me").with_cancel_token(own.clone()),
            request_fn,
        )
        .with_cancel_source(source);
        let mut future = task::spawn(observable.into_future());
        assert_pending!(future.poll());
        own.cancel();
        assert!(assert_ready!(future.poll()).unwrap_err().is_cancel());
    }

    #[tokio::test]
    async fn test_each_await_is_a_new_attempt() {
        let (request_fn, calls) = counting(200);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn);

        let first = (&observable).await.unwrap();
        let second = observable.clone().await.unwrap();
        assert_eq!(first.status, 200);
        assert_eq!(second.config.url.as_deref(), Some("http://awesome.me"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dropping_future_cancels() {
        let (request_fn, tokens) = pending();
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn);

        let mut future = task::spawn(observable.into_future());
        assert_pending!(future.poll());
        drop(future);

        assert!(tokens.lock()[0].is_cancelled());
    }

    #[tokio::test]
    async fn test_awaiting_cancelled_request() {
        let (request_fn, _) = pending();
        let external = CancellationToken::new();
        let observable = RequestObservable::create(
            RequestConfig::from("http://awesome.me").with_cancel_token(external.clone()),
            request_fn,
        );

        let mut future = task::spawn(observable.into_future());
        assert_pending!(future.poll());
        external.cancel();
        let outcome = assert_ready!(future.poll());
        assert!(outcome.unwrap_err().is_cancel());
    }

    #[tokio::test]
    async fn test_stream_yields_one_item() {
        let (request_fn, calls) = counting(200);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn);

        let items: Vec<_> = observable.stream().collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stream_is_empty_when_cancelled() {
        let (request_fn, _) = pending();
        let external = CancellationToken::new();
        external.cancel();
        let observable = RequestObservable::create(
            RequestConfig::from("http://awesome.me").with_cancel_token(external),
            request_fn,
        );

        let items: Vec<_> = observable.stream().collect().await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_json_decoding() {
        let (request_fn, _) = counting(200);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn)
            .json::<serde_json::Value>();

        let response = observable.await.unwrap();
        assert_eq!(response.data["ok"], true);
    }

    #[tokio::test]
    async fn test_then() {
        let (request_fn, _) = counting(404);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn);

        let status = observable
            .then(|r| r.status, |e| e.response().map_or(0, |r| r.status))
            .await;
        assert_eq!(status, 404);
    }

    #[tokio::test]
    async fn test_retry_resubscribes_on_retryable_failure() {
        let (request_fn, calls) = counting(503);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn)
            .retry(2);

        let err = observable.await.unwrap_err();
        assert!(matches!(err, Error::Status { status: 503, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_skips_non_retryable_failure() {
        let (request_fn, calls) = counting(404);
        let observable = RequestObservable::create(RequestConfig::from("http://awesome.me"), request_fn)
            .retry_with_backoff(5, Duration::from_millis(1));

        assert!(observable.await.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
