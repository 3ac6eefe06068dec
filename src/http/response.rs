//! Terminal responses produced by the balancer itself.
//!
//! Upstream responses are relayed as-is; these cover the cases where no
//! backend answers.

use axum::body::Body;
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;

pub const SERVICE_NOT_AVAILABLE: &str = "Service not available";
pub const SERVER_NOT_FOUND: &str = "Server doesn't exist";
pub const NO_MATCHING_RESOURCE: &str = "URL doesn't match any resource";

/// 503: no alive peer or attempts exhausted.
pub fn service_unavailable() -> Response<Body> {
    (StatusCode::SERVICE_UNAVAILABLE, SERVICE_NOT_AVAILABLE).into_response()
}

/// 503: room outside the addressable range.
pub fn unknown_server() -> Response<Body> {
    (StatusCode::SERVICE_UNAVAILABLE, SERVER_NOT_FOUND).into_response()
}

/// 404: path matches no known shape.
pub fn not_found() -> Response<Body> {
    (StatusCode::NOT_FOUND, NO_MATCHING_RESOURCE).into_response()
}

/// 413: body could not be buffered for replay.
pub fn payload_too_large() -> Response<Body> {
    (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
}

/// 502: backend switched protocols on a connection that cannot follow.
pub fn bad_gateway() -> Response<Body> {
    (StatusCode::BAD_GATEWAY, "Upgrade not possible").into_response()
}
