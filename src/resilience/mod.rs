//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Forward to backend fails:
//!     → retries.rs (retry same backend after a short delay while retries remain)
//!     → retries exhausted: backend marked dead, new dispatch round
//!     → attempts exhausted: 503
//! ```
//!
//! # Design Decisions
//! - Connection-level failures are retried; upstream status codes are not
//! - Bounded work per request: max_attempts × max_retries forwards

pub mod retries;

pub use retries::{RetryPolicy, RoutingRecord};
