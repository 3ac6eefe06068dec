//! Room affinity (sticky) mapping.
//!
//! Rooms are numbered from 1 and allocated to backends in contiguous
//! shards of `capacity` rooms: rooms `1..=capacity` belong to slot 0,
//! the next `capacity` rooms to slot 1, and so on.

/// Maps room identifiers to pool slots.
#[derive(Debug, Clone, Copy)]
pub struct ShardMap {
    capacity: u64,
}

impl ShardMap {
    pub fn new(capacity: u64) -> Self {
        Self { capacity }
    }

    /// Slot that owns `room_id`, ignoring pool size.
    /// Room 0 has no owner.
    pub fn shard_of(&self, room_id: u64) -> Option<usize> {
        let slot = room_id.checked_sub(1)?.checked_div(self.capacity)?;
        usize::try_from(slot).ok()
    }

    /// Slot that owns `room_id` in a pool of `len` backends.
    pub fn owner_index(&self, room_id: u64, len: usize) -> Option<usize> {
        self.shard_of(room_id).filter(|&slot| slot < len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_boundaries() {
        let shards = ShardMap::new(10_000);
        assert_eq!(shards.shard_of(1), Some(0));
        assert_eq!(shards.shard_of(10_000), Some(0));
        assert_eq!(shards.shard_of(10_001), Some(1));
        assert_eq!(shards.shard_of(30_001), Some(3));
    }

    #[test]
    fn index_equal_to_len_is_out_of_range() {
        let shards = ShardMap::new(10_000);
        assert_eq!(shards.owner_index(20_001, 3), Some(2));
        assert_eq!(shards.owner_index(30_000, 3), Some(2));
        assert_eq!(shards.owner_index(30_001, 3), None);
    }

    #[test]
    fn room_zero_and_zero_capacity_have_no_owner() {
        assert_eq!(ShardMap::new(10).shard_of(0), None);
        assert_eq!(ShardMap::new(0).shard_of(5), None);
    }
}
