//! Active liveness probing.
//!
//! # Responsibilities
//! - Periodically probe every backend's address
//! - Update backend liveness based on results

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::load_balancer::BackendPool;

/// Background task keeping backend liveness current.
pub struct LivenessProber {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
}

impl LivenessProber {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        Self { pool, config }
    }

    /// Probe on every tick until shutdown.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Liveness probes disabled");
            return;
        }

        tracing::info!(
            interval = self.config.interval_secs,
            timeout = self.config.timeout_secs,
            "Liveness prober starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::info!("Starting health check...");
                    self.check_all().await;
                    tracing::info!("Health check completed");
                }
                _ = shutdown.recv() => {
                    tracing::info!("Liveness prober received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe every backend once and record the outcome.
    pub async fn check_all(&self) {
        let timeout = Duration::from_secs(self.config.timeout_secs);

        for backend in self.pool.backends() {
            let alive = is_reachable(backend.probe_address(), timeout).await;
            let was_alive = backend.set_alive(alive);

            if was_alive != alive {
                tracing::info!(
                    backend = %backend.address(),
                    status = if alive { "up" } else { "down" },
                    "Backend liveness changed"
                );
            } else {
                tracing::debug!(
                    backend = %backend.address(),
                    status = if alive { "up" } else { "down" },
                    "Backend probed"
                );
            }
        }
    }
}

/// Whether a TCP connection to `address` opens within `timeout`.
pub async fn is_reachable(address: &str, timeout: Duration) -> bool {
    match time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            tracing::warn!(addr = %address, error = %e, "Site unreachable");
            false
        }
        Err(_) => {
            tracing::warn!(addr = %address, "Site unreachable: timeout");
            false
        }
    }
}
