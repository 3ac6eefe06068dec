//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every inbound request
//! - Snapshot the inbound request so it can be replayed on retry
//! - Prepare the upstream copy (hop-by-hop stripping, X-Forwarded-For)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Bodies are buffered once; each forward clones the `Bytes` handle
//! - Original request preserved for logging; modified copy forwarded

use std::net::SocketAddr;

use axum::body::{Body, Bytes};
use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    request::Parts,
    Method, Request, Uri, Version,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::client::ForwardError;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers that describe a single transport hop and are never forwarded
/// on a plain exchange.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
];

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let value = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(value))
    }
}

/// Read the request ID assigned by the middleware, if any.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// A replayable snapshot of an inbound request.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: Option<SocketAddr>,
}

impl ProxyRequest {
    pub fn from_parts(parts: Parts, body: Bytes, client_addr: Option<SocketAddr>) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            client_addr,
        }
    }

    /// Origin-form target (`/path?query`).
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }

    /// Whether the client asks to switch protocols
    /// (`Connection: upgrade` together with an `Upgrade` header).
    pub fn wants_upgrade(&self) -> bool {
        self.headers.contains_key(header::UPGRADE)
            && self
                .headers
                .get_all(header::CONNECTION)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .flat_map(|v| v.split(','))
                .any(|token| token.trim().eq_ignore_ascii_case("upgrade"))
    }

    /// Build the upstream copy of this request.
    ///
    /// With `keep_upgrade` the `connection`/`upgrade` pair survives so the
    /// backend can switch protocols; otherwise every hop-by-hop header is
    /// removed.
    pub fn to_upstream(&self, uri: Uri, keep_upgrade: bool) -> Result<Request<Body>, ForwardError> {
        let mut headers = self.headers.clone();
        strip_hop_by_hop(&mut headers, keep_upgrade);
        if let Some(addr) = self.client_addr {
            append_forwarded_for(&mut headers, addr);
        }

        let mut builder = Request::builder()
            .method(self.method.clone())
            .uri(uri)
            .version(Version::HTTP_11);
        if let Some(h) = builder.headers_mut() {
            *h = headers;
        }
        builder
            .body(Body::from(self.body.clone()))
            .map_err(ForwardError::Build)
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub(crate) fn strip_hop_by_hop(headers: &mut HeaderMap, keep_upgrade: bool) {
    if keep_upgrade {
        for name in HOP_BY_HOP.iter().filter(|n| **n != header::CONNECTION) {
            headers.remove(name);
        }
        return;
    }

    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
    headers.remove(header::UPGRADE);
}

fn append_forwarded_for(headers: &mut HeaderMap, addr: SocketAddr) {
    let ip = addr.ip().to_string();
    let value = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) => format!("{}, {}", prior, ip),
        None => ip,
    };
    if let Ok(v) = HeaderValue::from_str(&value) {
        headers.insert(X_FORWARDED_FOR, v);
    }
}
