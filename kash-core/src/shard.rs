//! A single shard: an independently-locked slice of the keyspace.
//!
//! Amortized expiry sweeping is driven by `op_count`, which every
//! insert/overwrite bumps; once it crosses `SWEEP_THRESHOLD` the caller
//! schedules a sweep of this shard and resets the counter.

use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::value::Value;

/// Set operations reset `op_count` and schedule a sweep once it reaches
/// this many.
pub(crate) const SWEEP_THRESHOLD: u64 = 100;

/// A single keyspace entry.
///
/// `deadline` is an absolute nanosecond timestamp; `i64::MAX` means "never
/// expires". `lru_index` is `None` when the LRU list is disabled, otherwise
/// it is the entry's node in the process-wide arena.
pub(crate) struct ShardSlot {
    pub value: Value,
    pub deadline: i64,
    pub lru_index: Option<usize>,
}

#[derive(Default)]
pub(crate) struct ShardInner {
    pub table: HashMap<Arc<[u8]>, ShardSlot>,
    pub op_count: u64,
}

#[derive(Default)]
pub(crate) struct Shard {
    pub inner: RwLock<ShardInner>,
}
