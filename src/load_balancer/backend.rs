//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single upstream server
//! - Track liveness (written by the prober and failure handling, read by routing)
//! - Own the plain and upgraded forwarding handles for its address

use std::sync::atomic::{AtomicBool, Ordering};

use axum::body::Body;
use axum::http::Response;
use hyper::upgrade::OnUpgrade;
use thiserror::Error;
use url::Url;

use crate::http::client::{ForwardError, UpstreamClient};
use crate::http::forward::{ForwardScheme, Forwarder};
use crate::http::request::ProxyRequest;

/// Error building a backend from a configured address.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("invalid backend address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("backend address {0:?} has no host")]
    MissingHost(String),
}

/// Normalise an address for comparison: trimmed, lowercase, no trailing `/`.
pub fn normalize_address(address: &str) -> String {
    address.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// A single upstream server.
#[derive(Debug)]
pub struct Backend {
    /// Normalised `host:port` as configured.
    address: String,
    /// `host:port` with the scheme's default port filled in.
    probe_address: String,
    /// Liveness flag; a single atomic word, so reads are never torn.
    alive: AtomicBool,
    plain: Forwarder,
    upgraded: Forwarder,
}

impl Backend {
    /// Create a backend for `address`, initially alive.
    pub fn new(address: &str, secure: bool, client: UpstreamClient) -> Result<Self, BackendError> {
        let address = normalize_address(address);

        let target = |scheme: ForwardScheme| {
            let raw = format!("{}://{}", scheme.url_scheme(secure), address);
            Url::parse(&raw).map_err(|source| BackendError::InvalidAddress {
                address: address.clone(),
                source,
            })
        };
        let plain_url = target(ForwardScheme::Plain)?;
        let upgraded_url = target(ForwardScheme::Upgraded)?;

        let host = plain_url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| BackendError::MissingHost(address.clone()))?;
        let port = plain_url
            .port_or_known_default()
            .ok_or_else(|| BackendError::MissingHost(address.clone()))?;
        let probe_address = format!("{}:{}", host, port);

        Ok(Self {
            address,
            probe_address,
            alive: AtomicBool::new(true),
            plain: Forwarder::new(plain_url, ForwardScheme::Plain, client.clone()),
            upgraded: Forwarder::new(upgraded_url, ForwardScheme::Upgraded, client),
        })
    }

    /// Normalised configured address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Address the liveness probe connects to.
    pub fn probe_address(&self) -> &str {
        &self.probe_address
    }

    /// Set the liveness flag. Returns the previous value.
    pub fn set_alive(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::AcqRel)
    }

    /// Read the liveness flag.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// The forwarding handle for `scheme`.
    pub fn forwarder(&self, scheme: ForwardScheme) -> &Forwarder {
        match scheme {
            ForwardScheme::Plain => &self.plain,
            ForwardScheme::Upgraded => &self.upgraded,
        }
    }

    /// Forward through the handle for `scheme`.
    ///
    /// Liveness is not consulted; a backend already chosen may still serve.
    pub async fn forward(
        &self,
        scheme: ForwardScheme,
        request: &ProxyRequest,
        client_upgrade: &mut Option<OnUpgrade>,
    ) -> Result<Response<Body>, ForwardError> {
        self.forwarder(scheme).forward(request, client_upgrade).await
    }
}

#[cfg(test)]
pub(crate) fn test_backend(address: &str) -> std::sync::Arc<Backend> {
    let client = UpstreamClient::new(&crate::config::UpstreamConfig::default());
    std::sync::Arc::new(Backend::new(address, false, client).unwrap())
}
