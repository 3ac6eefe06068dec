//! Per-backend forwarding handles.
//!
//! # Responsibilities
//! - Bind one upstream address to one forwarding scheme
//! - Rewrite the inbound target onto the backend
//! - Relay the upstream response (streamed, not buffered)
//! - Hand upgraded connections to the splice task
//!
//! # Design Decisions
//! - A forwarder never looks at liveness; callers decide who gets work
//! - Plain exchanges behave like a single-host reverse proxy
//! - Upgraded exchanges preserve `connection`/`upgrade` end to end
//! - A handshake arriving on a plain handle is tunnelled, not stripped
//! - A 101 with no client side to splice becomes a 502

use axum::body::Body;
use axum::http::{header, HeaderValue, Response, StatusCode, Uri};
use hyper::upgrade::OnUpgrade;
use url::{Position, Url};

use crate::http::client::{ForwardError, UpstreamClient};
use crate::http::request::{strip_hop_by_hop, ProxyRequest};
use crate::http::{response, websocket};

/// How a request travels to its backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardScheme {
    /// Ordinary request/response exchange.
    Plain,
    /// Long-lived exchange that may switch protocols.
    Upgraded,
}

impl ForwardScheme {
    /// URL scheme naming this kind of target.
    pub fn url_scheme(self, secure: bool) -> &'static str {
        match (self, secure) {
            (ForwardScheme::Plain, false) => "http",
            (ForwardScheme::Plain, true) => "https",
            (ForwardScheme::Upgraded, false) => "ws",
            (ForwardScheme::Upgraded, true) => "wss",
        }
    }
}

/// A forwarding handle bound to one backend address.
#[derive(Debug, Clone)]
pub struct Forwarder {
    target: Url,
    scheme: ForwardScheme,
    /// `http` or `https`; what actually goes on the wire.
    wire_scheme: &'static str,
    /// `host[:port]` as written in the target.
    authority: String,
    client: UpstreamClient,
}

impl Forwarder {
    /// Create a forwarder for `target`.
    ///
    /// `target` must have a host; its scheme decides TLS (`https`/`wss`).
    pub fn new(target: Url, scheme: ForwardScheme, client: UpstreamClient) -> Self {
        let wire_scheme = match target.scheme() {
            "https" | "wss" => "https",
            _ => "http",
        };
        let authority = target[Position::BeforeHost..Position::AfterPort].to_string();
        Self {
            target,
            scheme,
            wire_scheme,
            authority,
            client,
        }
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Forward `request` and return the upstream response.
    ///
    /// On an upgraded exchange that the backend accepts, `client_upgrade`
    /// is consumed and the two connections are spliced in the background.
    /// A plain handle passes an upgrade handshake through the same way.
    pub async fn forward(
        &self,
        request: &ProxyRequest,
        client_upgrade: &mut Option<OnUpgrade>,
    ) -> Result<Response<Body>, ForwardError> {
        match self.scheme {
            ForwardScheme::Plain if request.wants_upgrade() && client_upgrade.is_some() => {
                self.forward_upgraded(request, client_upgrade).await
            }
            ForwardScheme::Plain => self.forward_plain(request).await,
            ForwardScheme::Upgraded => self.forward_upgraded(request, client_upgrade).await,
        }
    }

    async fn forward_plain(&self, request: &ProxyRequest) -> Result<Response<Body>, ForwardError> {
        let uri: Uri = format!(
            "{}://{}{}",
            self.wire_scheme,
            self.authority,
            request.path_and_query()
        )
        .parse()?;
        let upstream = request.to_upstream(uri, false)?;

        let response = self.client.send(upstream).await?;
        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers, false);
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    async fn forward_upgraded(
        &self,
        request: &ProxyRequest,
        client_upgrade: &mut Option<OnUpgrade>,
    ) -> Result<Response<Body>, ForwardError> {
        let origin: Uri = format!("{}://{}", self.wire_scheme, self.authority).parse()?;
        let target: Uri = request.path_and_query().parse()?;
        let mut upstream = request.to_upstream(target, true)?;
        if !upstream.headers().contains_key(header::HOST) {
            if let Ok(host) = HeaderValue::from_str(&self.authority) {
                upstream.headers_mut().insert(header::HOST, host);
            }
        }

        let mut response = self.client.send_upgradable(origin, upstream).await?;

        if response.status() == StatusCode::SWITCHING_PROTOCOLS {
            match client_upgrade.take() {
                Some(client) => {
                    let backend = hyper::upgrade::on(&mut response);
                    tokio::spawn(websocket::splice(client, backend, self.target.clone()));
                }
                None => {
                    tracing::warn!(
                        target_url = %self.target,
                        "Backend switched protocols but the client connection cannot upgrade"
                    );
                    return Ok(response::bad_gateway());
                }
            }
        }

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;

    fn forwarder(target: &str, scheme: ForwardScheme) -> Forwarder {
        Forwarder::new(
            Url::parse(target).unwrap(),
            scheme,
            UpstreamClient::new(&UpstreamConfig::default()),
        )
    }

    #[test]
    fn url_schemes() {
        assert_eq!(ForwardScheme::Plain.url_scheme(false), "http");
        assert_eq!(ForwardScheme::Plain.url_scheme(true), "https");
        assert_eq!(ForwardScheme::Upgraded.url_scheme(false), "ws");
        assert_eq!(ForwardScheme::Upgraded.url_scheme(true), "wss");
    }

    #[test]
    fn websocket_targets_travel_over_http() {
        let ws = forwarder("ws://10.1.2.3:8080", ForwardScheme::Upgraded);
        assert_eq!(ws.wire_scheme, "http");
        assert_eq!(ws.authority, "10.1.2.3:8080");

        let wss = forwarder("wss://rooms.example.com", ForwardScheme::Upgraded);
        assert_eq!(wss.wire_scheme, "https");
        assert_eq!(wss.authority, "rooms.example.com");
    }

    #[tokio::test]
    async fn refused_connection_is_a_forward_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (parts, _) = axum::http::Request::builder()
            .uri("/ws/1")
            .body(())
            .unwrap()
            .into_parts();
        let request = ProxyRequest::from_parts(parts, Default::default(), None);

        for scheme in [ForwardScheme::Plain, ForwardScheme::Upgraded] {
            let f = forwarder(&format!("http://{}", addr), scheme);
            let result = f.forward(&request, &mut None).await;
            assert!(result.is_err(), "{:?} forward should fail", scheme);
        }
    }

    #[tokio::test]
    async fn switch_without_client_upgrade_is_bad_gateway() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 101 Switching Protocols\r\nConnection: upgrade\r\nUpgrade: websocket\r\n\r\n")
                .await;
        });

        let (parts, _) = axum::http::Request::builder()
            .uri("/room/1")
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .body(())
            .unwrap()
            .into_parts();
        let request = ProxyRequest::from_parts(parts, Default::default(), None);

        let f = forwarder(&format!("ws://{}", addr), ForwardScheme::Upgraded);
        let response = f.forward(&request, &mut None).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn plain_handle_without_client_upgrade_stays_plain() {
        // Upgrade headers alone do not select the tunnel; the client side must be upgradable.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let (parts, _) = axum::http::Request::builder()
            .uri("/ws/1")
            .header("connection", "upgrade")
            .header("upgrade", "websocket")
            .body(())
            .unwrap()
            .into_parts();
        let request = ProxyRequest::from_parts(parts, Default::default(), None);
        assert!(request.wants_upgrade());

        let f = forwarder(&format!("http://{}", addr), ForwardScheme::Plain);
        assert!(matches!(
            f.forward(&request, &mut None).await,
            Err(ForwardError::Request(_))
        ));
    }
}
