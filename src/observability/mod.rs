//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → tower_http TraceLayer (per-request spans)
//!
//! Consumers:
//!     → stdout (human or JSON lines)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through dispatch and upstream requests

pub mod logging;

pub use logging::init_logging;
