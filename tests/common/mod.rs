//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use room_balancer::config::ProxyConfig;
use room_balancer::lifecycle::startup::build_pool;
use room_balancer::{BackendPool, HttpServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

/// A running balancer.
pub struct Proxy {
    pub addr: SocketAddr,
    pub pool: Arc<BackendPool>,
    pub shutdown: Shutdown,
}

impl Proxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Proxy {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config for tests: no prober, fast retries.
pub fn test_config(backends: &[SocketAddr]) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.backends = backends.iter().map(|a| a.to_string()).collect();
    config.health_check.enabled = false;
    config.retries.retry_delay_ms = 1;
    config.listener.bind_host = "127.0.0.1".into();
    config
}

/// Start the balancer on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> Proxy {
    let pool = Arc::new(build_pool(&config).unwrap());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, pool.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    Proxy {
        addr,
        pool,
        shutdown,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Consume the request head so closing the socket does not reset it.
async fn read_request_head(socket: &mut TcpStream) {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 512];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                if buf.windows(4).any(|w| w == b"\r\n\r\n") {
                    return;
                }
            }
        }
    }
}

async fn respond(mut socket: TcpStream, body: &str) {
    read_request_head(&mut socket).await;
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// Start a mock backend that answers every request with `body`.
pub async fn start_mock_backend(body: &'static str) -> SocketAddr {
    let (addr, _) = start_flaky_backend(0, body).await;
    addr
}

/// Start a backend that drops its first `failures` connections, then
/// answers with `body`. Returns the accept counter.
pub async fn start_flaky_backend(failures: u32, body: &'static str) -> (SocketAddr, Arc<AtomicU32>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicU32::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let seen = counter.fetch_add(1, Ordering::SeqCst);
            if seen < failures {
                drop(socket);
                continue;
            }
            tokio::spawn(respond(socket, body));
        }
    });

    (addr, accepted)
}

/// Start a backend that accepts and immediately drops every connection.
pub async fn start_dropping_backend() -> (SocketAddr, Arc<AtomicU32>) {
    start_flaky_backend(u32::MAX, "").await
}

/// Start a WebSocket backend echoing every text or binary frame.
pub async fn start_echo_ws_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let Ok(mut ws) = tokio_tungstenite::accept_async(socket).await else {
                    return;
                };
                while let Some(Ok(msg)) = ws.next().await {
                    match msg {
                        Message::Text(_) | Message::Binary(_) => {
                            if ws.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Message::Close(_) => break,
                        _ => {}
                    }
                }
            });
        }
    });

    addr
}
