//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the room balancer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind host, port).
    pub listener: ListenerConfig,

    /// Upstream addresses (`host:port`), in pool order.
    pub backends: Vec<String>,

    /// Path classification and room affinity settings.
    pub routing: RoutingConfig,

    /// Upstream connection settings.
    pub upstream: UpstreamConfig,

    /// Liveness probe settings.
    pub health_check: HealthCheckConfig,

    /// Retry configuration.
    pub retries: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0").
    pub bind_host: String,

    /// Port to serve on.
    pub port: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3030,
        }
    }
}

impl ListenerConfig {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

/// Routing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Prefix prepended to the room-creation path (e.g., "/api").
    pub api_prefix: String,

    /// Number of rooms owned by each backend.
    pub shard_capacity: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_prefix: String::new(),
            shard_capacity: 10_000,
        }
    }
}

/// Upstream connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Use `https`/`wss` when talking to backends.
    pub secure: bool,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Largest request body buffered for replay, in bytes.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            secure: false,
            connect_timeout_secs: 5,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Liveness probe configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Run the background prober.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Per-backend probe timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 20,
            timeout_secs: 2,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Dispatch rounds allowed per request before answering 503.
    pub max_attempts: u32,

    /// Forwards allowed against one backend within a round.
    pub max_retries: u32,

    /// Pause between forwards to the same backend in milliseconds.
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            max_retries: 3,
            retry_delay_ms: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
