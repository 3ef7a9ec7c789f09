//! Fork-join example
//!
//! Runs several requests in parallel and waits for all of them, retrying
//! transient failures with backoff.
//!
//! Run with: cargo run --example fork_join -- [url]

use futures::future::try_join_all;
use rxhttp::RequestConfig;
use std::future::IntoFuture;
use std::time::{Duration, Instant};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://jsonplaceholder.typicode.com".to_string());

    println!("Fork-Join Example");
    println!("=================\n");

    let api = rxhttp::create(RequestConfig::new().with_base_url(base));
    api.interceptors().request.add(|config| {
        Ok(config.with_header("x-request-source", "fork-join-example"))
    });

    let requests: Vec<_> = (1..=5)
        .map(|id| {
            api.get(&format!("/todos/{id}"))
                .json::<serde_json::Value>()
                .retry_with_backoff(3, Duration::from_millis(200))
                .into_future()
        })
        .collect();

    let started = Instant::now();
    let responses = try_join_all(requests).await?;
    println!("{} responses in {:?}", responses.len(), started.elapsed());

    for response in &responses {
        println!("  [{}] {}", response.data["id"], response.data["title"]);
    }

    Ok(())
}
