//! Room balancer (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    ROOM BALANCER                     │
//!   Client Request   │  ┌─────────┐   ┌────────────┐   ┌───────────────┐    │
//!   ─────────────────┼─▶│  http   │──▶│  routing   │──▶│ load_balancer │    │
//!                    │  │ server  │   │ dispatcher │   │ pool + cursor │    │
//!                    │  └─────────┘   └─────┬──────┘   └───────┬───────┘    │
//!                    │                      │ retry            │            │
//!                    │                      ▼                  ▼            │
//!   Client Response  │               ┌────────────┐    ┌──────────────┐     │
//!   ◀────────────────┼───────────────│ resilience │    │   backend    │◀────┼── Backend
//!                    │               └────────────┘    │ plain / ws   │     │   Server
//!                    │                                 └──────▲───────┘     │
//!                    │                                        │ liveness    │
//!                    │                                 ┌──────┴───────┐     │
//!                    │                                 │    health    │     │
//!                    │                                 │    prober    │     │
//!                    │                                 └──────────────┘     │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use clap::Parser;

use room_balancer::config::Cli;
use room_balancer::lifecycle::{signals, startup, Shutdown};
use room_balancer::observability::init_logging;
use room_balancer::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    init_logging(&config.observability);

    tracing::info!("room-balancer v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        port = config.listener.port,
        backends = config.backends.len(),
        api_prefix = %config.routing.api_prefix,
        secure = config.upstream.secure,
        shard_capacity = config.routing.shard_capacity,
        "Configuration loaded"
    );

    let pool = Arc::new(startup::build_pool(&config)?);
    let listener = startup::bind_listener(&config.listener).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        shutdown.trigger();
    });

    HttpServer::new(config, pool).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
