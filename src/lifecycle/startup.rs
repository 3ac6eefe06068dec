//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the backend pool from configuration
//! - Bind the listening socket
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Pool is complete before the listener accepts traffic

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{ConfigError, ListenerConfig, ProxyConfig};
use crate::http::client::UpstreamClient;
use crate::http::forward::ForwardScheme;
use crate::load_balancer::{Backend, BackendError, BackendPool};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Please provide one or more backends to load balance")]
    NoBackends,

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Build the pool in configuration order.
pub fn build_pool(config: &ProxyConfig) -> Result<BackendPool, StartupError> {
    if config.backends.is_empty() {
        return Err(StartupError::NoBackends);
    }

    let client = UpstreamClient::new(&config.upstream);
    let mut pool = BackendPool::new(config.routing.shard_capacity);

    for address in &config.backends {
        let backend = Backend::new(address, config.upstream.secure, client.clone())?;
        tracing::info!(
            server = %backend.forwarder(ForwardScheme::Plain).target(),
            ws_server = %backend.forwarder(ForwardScheme::Upgraded).target(),
            "Configured server"
        );
        pool.add_backend(backend);
    }

    Ok(pool)
}

/// Bind the configured listening address.
pub async fn bind_listener(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let address = config.bind_address();
    TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })
}
