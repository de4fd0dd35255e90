//! Serving and shutdown against a real listener.

use axum::routing::get;
use axum::Router;
use shore::server::serve;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Notify};

fn slow_router(started: Arc<Notify>, delay: Duration) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route(
            "/slow",
            get(move || {
                let started = started.clone();
                async move {
                    started.notify_one();
                    tokio::time::sleep(delay).await;
                    "done"
                }
            }),
        )
}

async fn fetch(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    let _ = stream.read_to_end(&mut response).await;
    String::from_utf8_lossy(&response).into_owned()
}

struct Running {
    addr: SocketAddr,
    stop: oneshot::Sender<()>,
    server: tokio::task::JoinHandle<Result<(), shore::AppError>>,
}

async fn start(router: Router, graceful: bool, grace: Duration) -> Running {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, router, graceful, grace, async move {
        let _ = stopped.await;
    }));
    Running { addr, stop, server }
}

#[tokio::test]
async fn serves_until_signalled() {
    let router = slow_router(Arc::new(Notify::new()), Duration::ZERO);
    let running = start(router, true, Duration::from_secs(5)).await;

    let response = fetch(running.addr, "/health").await;
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("ok"), "{response}");

    running.stop.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), running.server).await.unwrap();
    assert!(result.unwrap().is_ok());
}

#[tokio::test]
async fn graceful_shutdown_drains_in_flight_requests() {
    let started = Arc::new(Notify::new());
    let router = slow_router(started.clone(), Duration::from_millis(300));
    let running = start(router, true, Duration::from_secs(5)).await;

    let client = tokio::spawn(fetch(running.addr, "/slow"));
    started.notified().await;
    running.stop.send(()).unwrap();

    let response = client.await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"), "{response}");
    assert!(response.ends_with("done"), "{response}");
    assert!(running.server.await.unwrap().is_ok());
}

#[tokio::test]
async fn drain_gives_up_after_grace_period() {
    let started = Arc::new(Notify::new());
    let router = slow_router(started.clone(), Duration::from_secs(30));
    let running = start(router, true, Duration::from_millis(100)).await;

    let _client = tokio::spawn(fetch(running.addr, "/slow"));
    started.notified().await;
    let begun = Instant::now();
    running.stop.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), running.server).await.unwrap();
    assert!(result.unwrap().is_ok());
    assert!(begun.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn graceless_shutdown_returns_immediately() {
    let started = Arc::new(Notify::new());
    let router = slow_router(started.clone(), Duration::from_secs(30));
    let running = start(router, false, Duration::from_secs(30)).await;

    let _client = tokio::spawn(fetch(running.addr, "/slow"));
    started.notified().await;
    let begun = Instant::now();
    running.stop.send(()).unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), running.server).await.unwrap();
    assert!(result.unwrap().is_ok());
    assert!(begun.elapsed() < Duration::from_secs(5));
}
