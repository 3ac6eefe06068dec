//! Retry logic.
//!
//! # Responsibilities
//! - Carry per-request retry state explicitly (`RoutingRecord`)
//! - Decide when a backend has been retried enough and when a request gives up
//!
//! # Design Decisions
//! - State travels by value through the dispatch loop, never stored globally
//! - `retries` bounds transparent retries against one backend
//! - `attempts` bounds re-routing rounds; each round resets `retries`
//! - Fixed short delay between retries; only the owning task sleeps

use std::time::Duration;

use crate::config::RetryConfig;

/// Retry counters for one logical request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingRecord {
    /// Dispatch rounds already spent (each ended with a backend marked dead).
    pub attempts: u32,
    /// Failed forwards against the current backend in this round.
    pub retries: u32,
}

impl RoutingRecord {
    /// Record one more failed forward against the current backend.
    pub fn retried(self) -> Self {
        Self {
            retries: self.retries + 1,
            ..self
        }
    }

    /// Start a new dispatch round.
    pub fn next_attempt(self) -> Self {
        Self {
            attempts: self.attempts + 1,
            retries: 0,
        }
    }
}

/// Limits applied to every request.
///
/// Both counters start at 0, so `>=` / `<` give exactly
/// `max_attempts × max_retries` forwards before the final 503.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// No more dispatch rounds are allowed.
    pub fn attempts_exhausted(&self, record: RoutingRecord) -> bool {
        record.attempts >= self.max_attempts
    }

    /// The current backend may be tried again.
    pub fn may_retry(&self, record: RoutingRecord) -> bool {
        record.retries < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
