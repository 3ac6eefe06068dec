//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::load_balancer::backend::Backend;

/// Round-robin selector.
/// Stores an internal cursor to rotate through backends.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the cursor and return the slot it pointed at.
    /// `None` for an empty pool.
    pub fn next_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.cursor.fetch_add(1, Ordering::Relaxed) % len)
    }

    /// Next alive backend, scanning one full cycle from the cursor.
    ///
    /// When dead backends are skipped the cursor moves past the chosen
    /// one, so the next call does not rescan them.
    pub fn next_alive(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        let len = backends.len();
        let start = self.next_index(len)?;

        for offset in 0..len {
            let index = (start + offset) % len;
            let backend = &backends[index];
            if backend.is_alive() {
                if offset != 0 {
                    self.cursor.store(index + 1, Ordering::Relaxed);
                }
                return Some(backend.clone());
            }
        }
        None
    }
}
