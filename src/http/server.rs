//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all dispatch handler
//! - Wire up middleware (request ID, tracing)
//! - Serve on the bound listener with upgrade support
//! - Start the liveness prober alongside the server
//! - Drain on shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::health::LivenessProber;
use crate::http::request::MakeRequestUuidV4;
use crate::lifecycle::shutdown::signalled;
use crate::load_balancer::BackendPool;
use crate::resilience::RetryPolicy;
use crate::routing::{Dispatcher, RouteMatcher};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

/// HTTP server for the balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<BackendPool>,
}

impl HttpServer {
    /// Create a server dispatching onto `pool`.
    pub fn new(config: ProxyConfig, pool: Arc<BackendPool>) -> Self {
        let dispatcher = Dispatcher::new(
            pool.clone(),
            RouteMatcher::new(&config.routing.api_prefix),
            RetryPolicy::from_config(&config.retries),
            config.upstream.max_body_bytes,
        );
        let state = AppState {
            dispatcher: Arc::new(dispatcher),
        };

        let router = Self::build_router(state);
        Self { router, config, pool }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "Load Balancer started"
        );

        if self.config.health_check.enabled {
            let prober = LivenessProber::new(self.pool.clone(), self.config.health_check.clone());
            let prober_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                prober.run(prober_shutdown).await;
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(signalled(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler; every request goes through the dispatcher.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    state.dispatcher.dispatch(request, Some(addr)).await
}
