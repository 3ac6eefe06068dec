//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → cli.rs (flags / environment overlay)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → consumed once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the backend pool is fixed for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::ConfigError;
pub use schema::{
    HealthCheckConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, RetryConfig,
    RoutingConfig, UpstreamConfig,
};
