//! One-shot request dispatch.
//!
//! This is the eager, single-result request call that
//! [`RequestObservable`](crate::RequestObservable) wraps. Calling [`dispatch`]
//! snapshots the facade's defaults and interceptors, and the returned future
//! performs the request when polled:
//!
//! 1. Overlay the per-call config on the defaults
//! 2. Run request interceptors (newest first)
//! 3. Bail out with [`Error::Cancelled`] if the token already fired
//! 4. Run the adapter, racing it against the cancellation token
//! 5. Validate the status code
//! 6. Run response interceptors (oldest first)

use crate::client::interceptors::{run_chain, Interceptors};
use crate::client::transport::default_adapter;
use crate::error::{Error, Result};
use crate::types::{RequestConfig, Response};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Issue one request with `defaults` and `interceptors` applied.
pub(crate) fn dispatch(
    defaults: &RequestConfig,
    interceptors: &Interceptors,
    config: RequestConfig,
) -> BoxFuture<'static, Result<Response>> {
    let mut merged = defaults.merge(&config);
    merged.method = Some(merged.method_or_default());

    let request_handlers = interceptors.request.handlers();
    let response_handlers = interceptors.response.handlers();

    async move {
        let outcome = match run_chain(request_handlers.into_iter().rev(), Ok(merged)) {
            Ok(config) => send(config).await,
            Err(e) => Err(e),
        };
        run_chain(response_handlers, outcome)
    }
    .boxed()
}

async fn send(config: RequestConfig) -> Result<Response> {
    let token = config.cancel_token.clone();
    if token.as_ref().is_some_and(|t| t.is_cancelled()) {
        return Err(Error::Cancelled);
    }

    tracing::debug!(
        method = %config.method_or_default(),
        url = config.url.as_deref().unwrap_or_default(),
        "dispatching request"
    );

    let adapter = config.adapter.clone().unwrap_or_else(default_adapter);
    let validator = config.clone();

    let response = match token {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                result = adapter.send(config) => result,
            }
        }
        None => adapter.send(config).await,
    }?;

    if validator.is_valid_status(response.status) {
        Ok(response)
    } else {
        Err(Error::Status {
            status: response.status,
            response: Box::new(response),
        })
    }
}
