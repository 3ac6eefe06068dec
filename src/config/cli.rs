//! Command-line and environment overlay.
//!
//! Flags win over the TOML file; each flag can also come from the
//! environment variable the deployment scripts already export.

use std::path::PathBuf;

use clap::Parser;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::ProxyConfig;
use crate::config::validation::validate_config;

#[derive(Debug, Parser)]
#[command(name = "room-balancer")]
#[command(about = "Round-robin and room-affine load balancer", long_about = None)]
pub struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "ROOM_BALANCER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Port to serve.
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Load balanced backends, use commas to separate.
    #[arg(short, long, env = "SERVER_LIST")]
    pub backends: Option<String>,

    /// Prefix for the room-creation endpoint.
    #[arg(long, env = "API_PREFIX")]
    pub api_prefix: Option<String>,

    /// Any non-empty value switches upstreams to https/wss.
    #[arg(long, env = "SECURE_LAYER")]
    pub secure_layer: Option<String>,
}

impl Cli {
    /// Resolve the final, validated configuration.
    pub fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        let config = self.apply(base);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Overlay the flags that were given onto `config`.
    pub fn apply(self, mut config: ProxyConfig) -> ProxyConfig {
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(list) = self.backends {
            config.backends = parse_backend_list(&list);
        }
        if let Some(prefix) = self.api_prefix {
            config.routing.api_prefix = prefix;
        }
        if let Some(secure) = self.secure_layer {
            config.upstream.secure = !secure.is_empty();
        }
        config
    }
}

/// Split a comma-separated backend list, dropping blanks.
pub fn parse_backend_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
