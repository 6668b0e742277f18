//! Amortized expiry sweeps.
//!
//! A sweep walks one shard, removing entries whose deadline has passed, and
//! unlinks anything it removes from the LRU list. Sweeps are dispatched as
//! short-lived threads rather than a fire-and-forget goroutine — the store
//! tracks their `JoinHandle`s and joins all of them in `Close`, so `Close`
//! never returns while a sweep is still touching a shard.

use crate::store::StoreInner;
use crate::time::now_nanos;

pub(crate) fn sweep_shard(inner: &StoreInner, shard_idx: usize) {
    let shard = &inner.shards[shard_idx];
    let now = now_nanos();

    let mut evicted_lru_indices = Vec::new();
    let mut swept = 0usize;
    {
        let mut guard = shard.inner.write();
        let expired: Vec<_> = guard
            .table
            .iter()
            .filter(|(_, slot)| slot.deadline <= now)
            .map(|(key, _)| key.clone())
            .collect();
        for key in expired {
            if let Some(slot) = guard.table.remove(&key) {
                swept += 1;
                if let Some(idx) = slot.lru_index {
                    evicted_lru_indices.push(idx);
                }
            }
        }
    }

    if !evicted_lru_indices.is_empty() {
        for idx in evicted_lru_indices {
            inner.lru.unlink(idx);
        }
    }

    if swept > 0 {
        tracing::trace!(shard_idx, swept, "expiry sweep reclaimed entries");
    }
}
