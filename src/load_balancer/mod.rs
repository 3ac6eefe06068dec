//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher classifies request
//!     → pool.rs (shared, append-only backend sequence)
//!     → Apply selection policy:
//!         - round_robin.rs (rotate through alive backends, room creation)
//!         - sticky.rs (room id → fixed slot, room traffic)
//!     → backend.rs (forward through plain or upgraded handle)
//!     → Return upstream response or forward error
//! ```
//!
//! # Design Decisions
//! - Pool composition is fixed before serving; only liveness mutates
//! - Round-robin excludes dead backends, sticky routing does not
//! - Liveness is a lock-free atomic flag

pub mod backend;
pub mod pool;
pub mod round_robin;
pub mod sticky;

pub use backend::{Backend, BackendError};
pub use pool::BackendPool;
