//! Backend pool management.
//!
//! # Responsibilities
//! - Hold the ordered, append-only backend sequence
//! - Round-robin selection over alive backends
//! - Sticky selection of a room's owner
//! - Liveness updates by address

use std::sync::Arc;

use crate::load_balancer::{
    backend::{normalize_address, Backend},
    round_robin::RoundRobin,
    sticky::ShardMap,
};

/// The ordered set of backends plus selection bookkeeping.
///
/// Positions are stable once serving starts: the pool is built with
/// `&mut self` and then shared behind an `Arc`.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    round_robin: RoundRobin,
    shards: ShardMap,
}

impl BackendPool {
    /// Create an empty pool whose backends each own `shard_capacity` rooms.
    pub fn new(shard_capacity: u64) -> Self {
        Self {
            backends: Vec::new(),
            round_robin: RoundRobin::new(),
            shards: ShardMap::new(shard_capacity),
        }
    }

    /// Append a backend. Only possible before the pool is shared.
    pub fn add_backend(&mut self, backend: Backend) {
        self.backends.push(Arc::new(backend));
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// All backends in insertion order.
    pub fn backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    /// Advance the round-robin cursor. `None` for an empty pool.
    pub fn next_index(&self) -> Option<usize> {
        self.round_robin.next_index(self.backends.len())
    }

    /// Next alive backend in round-robin order.
    pub fn next_alive_peer(&self) -> Option<Arc<Backend>> {
        let peer = self.round_robin.next_alive(&self.backends);
        if peer.is_none() {
            tracing::debug!(backend_count = self.backends.len(), "No alive backends in pool");
        }
        peer
    }

    /// Backend owning `room_id`, alive or not.
    pub fn sticky_peer(&self, room_id: u64) -> Option<Arc<Backend>> {
        let index = self.shards.owner_index(room_id, self.backends.len());
        tracing::debug!(room_id, server_id = ?index, "Resolved room owner");
        index.map(|i| self.backends[i].clone())
    }

    /// Set liveness on the first backend whose address matches.
    /// Returns whether a backend matched.
    pub fn mark_status(&self, address: &str, alive: bool) -> bool {
        let wanted = normalize_address(address);
        match self.backends.iter().find(|b| b.address() == wanted) {
            Some(backend) => {
                backend.set_alive(alive);
                true
            }
            None => false,
        }
    }
}
