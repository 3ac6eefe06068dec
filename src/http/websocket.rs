//! Upgraded connection splicing.
//!
//! # Responsibilities
//! - Wait for both sides of a `101 Switching Protocols` exchange to upgrade
//! - Copy bytes in both directions until either side closes
//!
//! # Data Flow
//! ```text
//! Client ←──── opaque byte stream ────→ Balancer ←──── opaque byte stream ────→ Backend
//! ```
//!
//! # Design Decisions
//! - Frames are not parsed; the upgraded stream is treated as opaque bytes
//! - Runs detached from the request task so the handler can return the 101

use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use url::Url;

/// Join the client and backend upgraded streams.
pub async fn splice(client: OnUpgrade, backend: OnUpgrade, target: Url) {
    let (client, backend) = match tokio::try_join!(client, backend) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(target_url = %target, error = %e, "Connection upgrade failed");
            return;
        }
    };

    tracing::debug!(target_url = %target, "Upgraded connection established");

    let mut client = TokioIo::new(client);
    let mut backend = TokioIo::new(backend);
    match tokio::io::copy_bidirectional(&mut client, &mut backend).await {
        Ok((to_backend, to_client)) => {
            tracing::debug!(
                target_url = %target,
                to_backend,
                to_client,
                "Upgraded connection closed"
            );
        }
        Err(e) => {
            tracing::debug!(target_url = %target, error = %e, "Upgraded connection closed with error");
        }
    }
}
