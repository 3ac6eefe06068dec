//! Request dispatch.
//!
//! # Responsibilities
//! - Single entry point for every inbound request
//! - Classify the path, select a backend, forward through the matching handle
//! - Drive the retry / failure protocol
//!
//! # State Machine
//! ```text
//! attempts exhausted?                → 503
//! classify: creation → next alive peer (none → 503)
//!           room     → room owner    (none → 503)
//!           other    → 404
//! forward ──ok──▶ relay response
//!    │ err
//!    ├─ retries left  → sleep, retry same backend
//!    └─ retries spent → mark backend dead, attempts += 1, back to top
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::upgrade::OnUpgrade;

use crate::http::forward::ForwardScheme;
use crate::http::request::{request_id, ProxyRequest};
use crate::http::response;
use crate::load_balancer::{Backend, BackendPool};
use crate::resilience::{RetryPolicy, RoutingRecord};
use crate::routing::matcher::{RouteMatcher, RouteTarget};

/// Routes requests onto the backend pool.
#[derive(Debug)]
pub struct Dispatcher {
    pool: Arc<BackendPool>,
    matcher: RouteMatcher,
    policy: RetryPolicy,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(
        pool: Arc<BackendPool>,
        matcher: RouteMatcher,
        policy: RetryPolicy,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            pool,
            matcher,
            policy,
            max_body_bytes,
        }
    }

    /// Handle one inbound request to completion.
    pub async fn dispatch(&self, request: Request<Body>, client_addr: Option<SocketAddr>) -> Response<Body> {
        let path = request.uri().path().to_string();
        let request_id = request_id(request.headers()).to_string();

        tracing::debug!(
            request_id = %request_id,
            method = %request.method(),
            path = %path,
            "Incoming request"
        );

        let Some(target) = self.matcher.classify(&path) else {
            tracing::warn!(request_id = %request_id, path = %path, "URL doesn't match any resource");
            return response::not_found();
        };

        let (mut parts, body) = request.into_parts();
        let client_upgrade = parts.extensions.remove::<OnUpgrade>();
        let body = match axum::body::to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "Failed to buffer request body");
                return response::payload_too_large();
            }
        };
        let request = ProxyRequest::from_parts(parts, body, client_addr);

        self.route(target, &request, client_upgrade, &request_id).await
    }

    async fn route(
        &self,
        target: RouteTarget,
        request: &ProxyRequest,
        mut client_upgrade: Option<OnUpgrade>,
        request_id: &str,
    ) -> Response<Body> {
        let scheme = target.scheme();
        let mut record = RoutingRecord::default();

        loop {
            if self.policy.attempts_exhausted(record) {
                tracing::warn!(
                    request_id = %request_id,
                    path = %request.uri.path(),
                    attempts = record.attempts,
                    "Max attempts reached, terminating"
                );
                return response::service_unavailable();
            }

            let backend = match target.room_id() {
                None => match self.pool.next_alive_peer() {
                    Some(b) => b,
                    None => {
                        tracing::warn!(request_id = %request_id, "No alive backend for room creation");
                        return response::service_unavailable();
                    }
                },
                Some(room_id) => match self.pool.sticky_peer(room_id) {
                    Some(b) => b,
                    None => {
                        tracing::warn!(request_id = %request_id, room_id, "Server doesn't exist");
                        return response::unknown_server();
                    }
                },
            };

            tracing::debug!(
                request_id = %request_id,
                backend = %backend.address(),
                scheme = ?scheme,
                attempt = record.attempts,
                "Forwarding request"
            );

            match self
                .forward_with_retries(&backend, scheme, request, &mut client_upgrade, record, request_id)
                .await
            {
                Ok(response) => return response,
                Err(spent) => {
                    self.pool.mark_status(backend.address(), false);
                    tracing::warn!(
                        request_id = %request_id,
                        backend = %backend.address(),
                        attempt = spent.attempts + 1,
                        "Backend marked dead, re-dispatching"
                    );
                    record = spent.next_attempt();
                }
            }
        }
    }

    /// Forward to one backend, retrying transparently.
    /// On exhaustion returns the record as it stood at the last failure.
    async fn forward_with_retries(
        &self,
        backend: &Backend,
        scheme: ForwardScheme,
        request: &ProxyRequest,
        client_upgrade: &mut Option<OnUpgrade>,
        mut record: RoutingRecord,
        request_id: &str,
    ) -> Result<Response<Body>, RoutingRecord> {
        loop {
            match backend.forward(scheme, request, client_upgrade).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    record = record.retried();
                    tracing::warn!(
                        request_id = %request_id,
                        backend = %backend.address(),
                        retries = record.retries,
                        error = %e,
                        "Upstream error"
                    );
                    if !self.policy.may_retry(record) {
                        return Err(record);
                    }
                    tokio::time::sleep(self.policy.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use crate::http::client::UpstreamClient;
    use axum::http::StatusCode;

    fn dead_port() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr.to_string()
    }

    fn dispatcher(addresses: &[String], capacity: u64) -> Dispatcher {
        let client = UpstreamClient::new(&UpstreamConfig::default());
        let mut pool = BackendPool::new(capacity);
        for a in addresses {
            pool.add_backend(Backend::new(a, false, client.clone()).unwrap());
        }
        let mut policy = RetryPolicy::default();
        policy.delay = std::time::Duration::from_millis(1);
        Dispatcher::new(Arc::new(pool), RouteMatcher::new(""), policy, 1024)
    }

    fn get(path: &str) -> Request<Body> {
        Request::builder().uri(path).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let d = dispatcher(&[dead_port()], 10);
        let res = d.dispatch(get("/elsewhere"), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn room_out_of_range_is_503() {
        let d = dispatcher(&[dead_port()], 10);
        let res = d.dispatch(get("/ws/11"), None).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(d.pool.backends()[0].is_alive());
    }

    #[tokio::test]
    async fn unreachable_pool_exhausts_into_503() {
        let addrs = [dead_port(), dead_port(), dead_port()];
        let d = dispatcher(&addrs, 10);
        let res = d.dispatch(get("/room"), None).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(d.pool.backends().iter().all(|b| !b.is_alive()));
    }

    #[tokio::test]
    async fn sticky_failure_keeps_affinity() {
        let addrs = [dead_port(), dead_port()];
        let d = dispatcher(&addrs, 10);
        let res = d.dispatch(get("/room/15/state"), None).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(d.pool.backends()[0].is_alive());
        assert!(!d.pool.backends()[1].is_alive());
    }

    #[tokio::test]
    async fn oversized_body_is_rejected() {
        let d = dispatcher(&[dead_port()], 10);
        let req = Request::builder()
            .method("POST")
            .uri("/room")
            .body(Body::from(vec![0u8; 4096]))
            .unwrap();
        let res = d.dispatch(req, None).await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
