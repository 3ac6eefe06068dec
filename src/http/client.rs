//! Upstream HTTP client.
//!
//! One client is built at startup and shared by every forwarder. Plain
//! exchanges go through the pooled legacy client; upgradable exchanges get
//! a dedicated HTTP/1.1 connection so the socket can be handed over after
//! `101 Switching Protocols`.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response, Uri};
use hyper::body::Incoming;
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tower::ServiceExt;

use crate::config::UpstreamConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// TLS-capable connector (`http` and `https`).
pub type UpstreamConnector = hyper_rustls::HttpsConnector<HttpConnector>;

/// A failed attempt to exchange a request with a backend.
///
/// Every variant is a transport failure; upstream HTTP error statuses are
/// responses, not errors.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    Build(#[source] axum::http::Error),

    #[error("invalid upstream uri: {0}")]
    Uri(#[from] axum::http::uri::InvalidUri),

    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("failed to connect to upstream: {0}")]
    Connect(#[source] BoxError),

    #[error("upstream exchange failed: {0}")]
    Exchange(#[from] hyper::Error),
}

/// Shared upstream client.
#[derive(Clone)]
pub struct UpstreamClient {
    connector: UpstreamConnector,
    pooled: Client<UpstreamConnector, Body>,
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient").finish_non_exhaustive()
    }
}

impl UpstreamClient {
    /// Build the client from the upstream settings.
    pub fn new(config: &UpstreamConfig) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(config.connect_timeout_secs)));

        let connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let pooled = Client::builder(TokioExecutor::new()).build(connector.clone());

        Self { connector, pooled }
    }

    /// Send a request with an absolute URI over a pooled connection.
    pub async fn send(&self, request: Request<Body>) -> Result<Response<Incoming>, ForwardError> {
        Ok(self.pooled.request(request).await?)
    }

    /// Send a request over a fresh connection to `origin` that stays
    /// eligible for a protocol upgrade.
    ///
    /// `request` must carry an origin-form URI and a `Host` header.
    pub async fn send_upgradable(
        &self,
        origin: Uri,
        request: Request<Body>,
    ) -> Result<Response<Incoming>, ForwardError> {
        let io = self
            .connector
            .clone()
            .oneshot(origin)
            .await
            .map_err(ForwardError::Connect)?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.with_upgrades().await {
                tracing::debug!(error = %e, "Upstream connection closed with error");
            }
        });

        Ok(sender.send_request(request).await?)
    }
}
