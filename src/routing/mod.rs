//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → matcher.rs (classify: creation / room action / room connection / miss)
//!     → dispatcher.rs (select backend, forward, retry, re-dispatch)
//!     → Return: upstream response, 404 or 503
//! ```
//!
//! # Design Decisions
//! - Matcher built at startup, immutable at runtime
//! - No regex in hot path (segment parsing only)
//! - Deterministic: same path always classifies the same way
//! - Re-dispatch is a bounded loop, not recursion

pub mod dispatcher;
pub mod matcher;

pub use dispatcher::Dispatcher;
pub use matcher::{RouteMatcher, RouteTarget};
