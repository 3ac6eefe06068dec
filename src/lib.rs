//! Room-aware reverse-proxy load balancer.
//!
//! Room creation is balanced round-robin over alive backends; traffic for
//! an existing room is pinned to the backend owning that room's shard.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::BackendPool;
pub use routing::Dispatcher;
