//! Fetch example
//!
//! Awaits one request, subscribes to another, and cancels a third before it
//! settles.
//!
//! Run with: cargo run --example fetch -- [url]

use rxhttp::observable::FnObserver;
use rxhttp::RequestConfig;
use std::time::Duration;
use tokio::sync::oneshot;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://jsonplaceholder.typicode.com".to_string());

    println!("Observable Fetch Example");
    println!("========================\n");

    let api = rxhttp::create(
        RequestConfig::new()
            .with_base_url(base)
            .with_timeout(Duration::from_secs(10)),
    );

    // Awaited
    let todo = api.get("/todos/1").json::<serde_json::Value>().await?;
    println!("await:     {} {} {}", todo.status, todo.status_text, todo.data["title"]);

    // Subscribed
    let (tx, rx) = oneshot::channel();
    let mut tx = Some(tx);
    let _subscription = api.get("/todos/2").subscribe(
        FnObserver::new()
            .on_next(|response: rxhttp::Response| {
                println!("subscribe: {} ({} bytes)", response.status, response.data.len())
            })
            .on_error(|e| eprintln!("subscribe: failed: {e}"))
            .on_complete(move || {
                if let Some(tx) = tx.take() {
                    let _ = tx.send(());
                }
            }),
    );
    rx.await?;

    // Cancelled before it settles: no value, no error
    let subscription = api.get("/todos/3").subscribe(
        FnObserver::new()
            .on_next(|_: rxhttp::Response| println!("cancelled: unexpected value"))
            .on_error(|e| eprintln!("cancelled: unexpected error: {e}")),
    );
    subscription.unsubscribe();
    println!("cancelled: closed = {}", subscription.is_closed());

    Ok(())
}
