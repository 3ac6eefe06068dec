//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → [routing::Dispatcher picks a backend]
//!     → request.rs (replayable snapshot, upstream copy)
//!     → forward.rs (plain or upgraded handle) → client.rs (hyper)
//!     → websocket.rs (splice after 101)
//!     → response.rs (balancer-generated 404/503/413)
//!     → Send to client
//! ```

pub mod client;
pub mod forward;
pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use client::{ForwardError, UpstreamClient};
pub use forward::{ForwardScheme, Forwarder};
pub use request::{MakeRequestUuidV4, ProxyRequest, X_REQUEST_ID};
pub use server::HttpServer;
