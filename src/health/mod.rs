//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active probes (active.rs):
//!     Periodic timer
//!     → TCP connect to each backend (bounded by timeout)
//!     → Backend::set_alive
//!
//! Failure handling (routing::dispatcher):
//!     Retries against a backend exhausted
//!     → BackendPool::mark_status(address, false)
//! ```
//!
//! # Design Decisions
//! - Probes never add, remove or reorder backends
//! - A single probe result decides liveness; no thresholds
//! - Probe failures are logged, never surfaced to clients

pub mod active;

pub use active::LivenessProber;
