//! The store facade: `Set`, `SetWithTimeout`, `Get`, `Delete`, `Increase`,
//! `GetTTL`, `DumpAllJSON`, `Close`.
//!
//! Lock ordering is fixed throughout this module: a shard's `RwLock` is
//! always acquired before the LRU list's mutex, never the reverse. Where an
//! operation needs to evict an entry from a *different* shard than the one
//! it is already holding, it releases both locks and re-acquires them one
//! at a time in that same order — see `link_new_entry` below.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::Mutex;
use rand::Rng;

use crate::hash::{shard_index, SHARD_COUNT};
use crate::lru::LruList;
use crate::options::{EvictionPolicy, OptionsState, StoreOption};
use crate::shard::{Shard, ShardSlot, SWEEP_THRESHOLD};
use crate::status::StatusCode;
use crate::sweeper;
use crate::time::{deadline_from_timeout, now_nanos, NEVER_EXPIRES};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CapacityMode {
    Unbounded,
    Random,
    Lru,
}

pub(crate) struct StoreInner {
    pub shards: Vec<Shard>,
    pub lru: LruList,
    capacity_mode: CapacityMode,
    capacity: usize,
    default_timeout_nanos: i64,
    max_memory_bytes: Option<u64>,
    eviction_policy: EvictionPolicy,
    sweep_handles: Mutex<Vec<JoinHandle<()>>>,
    closed: AtomicBool,
}

/// A sharded, TTL- and (optionally) LRU-evicting in-memory cache.
///
/// Cheap to clone: internally an `Arc`, so every clone shares the same
/// shards, LRU list, and background sweep bookkeeping.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    /// Builds a store from a sequence of functional options, e.g.
    /// `Store::new([with_capacity(1000), with_eviction_policy(EvictionPolicy::LRU)])`.
    pub fn new(options: impl IntoIterator<Item = StoreOption>) -> Store {
        let mut state = OptionsState::default();
        for opt in options {
            opt.apply(&mut state);
        }

        let capacity_mode = if state.capacity == 0 {
            CapacityMode::Unbounded
        } else {
            match state.eviction_policy {
                EvictionPolicy::LRU => CapacityMode::Lru,
                EvictionPolicy::Random => CapacityMode::Random,
                _ => CapacityMode::Unbounded,
            }
        };

        let mut shards = Vec::with_capacity(SHARD_COUNT);
        for _ in 0..SHARD_COUNT {
            shards.push(Shard::default());
        }

        Store {
            inner: Arc::new(StoreInner {
                shards,
                lru: LruList::default(),
                capacity_mode,
                capacity: state.capacity,
                default_timeout_nanos: state.default_timeout_nanos,
                max_memory_bytes: state.max_memory_bytes,
                eviction_policy: state.eviction_policy,
                sweep_handles: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// The configured eviction policy, for introspection.
    pub fn eviction_policy(&self) -> EvictionPolicy {
        self.inner.eviction_policy
    }

    /// The configured advisory memory budget, if any.
    pub fn max_memory_bytes(&self) -> Option<u64> {
        self.inner.max_memory_bytes
    }

    /// `Set(key, value)`, expiring after the store's default timeout (never,
    /// if the default timeout is zero).
    pub fn set(&self, key: Vec<u8>, value: Value) -> StatusCode {
        let timeout = self.inner.default_timeout_nanos;
        self.set_with_timeout(key, value, timeout)
    }

    /// `SetWithTimeout(key, value, timeout)`. `timeout_nanos <= 0` means the
    /// entry never expires.
    pub fn set_with_timeout(&self, key: Vec<u8>, value: Value, timeout_nanos: i64) -> StatusCode {
        let key_arc: Arc<[u8]> = Arc::from(key.into_boxed_slice());
        let shard_idx = shard_index(&key_arc);
        let deadline = deadline_from_timeout(timeout_nanos);

        let existed;
        let mut schedule_sweep = false;
        {
            let shard = &self.inner.shards[shard_idx];
            let mut inner = shard.inner.write();
            existed = inner.table.contains_key(&key_arc);
            if existed {
                let slot = inner.table.get_mut(&key_arc).expect("checked above");
                slot.value = value;
                slot.deadline = deadline;
                // LRU touch happens while this shard's write lock is still
                // held, so the captured index can never be freed and
                // reassigned to a different key before it is used.
                if self.inner.capacity_mode == CapacityMode::Lru {
                    if let Some(idx) = slot.lru_index {
                        self.inner.lru.move_to_front(idx);
                    }
                }
            } else {
                inner.table.insert(
                    key_arc.clone(),
                    ShardSlot { value, deadline, lru_index: None },
                );
            }
            inner.op_count += 1;
            if inner.op_count >= SWEEP_THRESHOLD {
                inner.op_count = 0;
                schedule_sweep = true;
            }
        }

        match self.inner.capacity_mode {
            CapacityMode::Lru if !existed => self.link_new_entry(shard_idx, key_arc),
            CapacityMode::Random if !existed => self.evict_random_if_over_capacity(),
            _ => {}
        }

        if schedule_sweep {
            self.schedule_sweep(shard_idx);
        }

        StatusCode::Success
    }

    /// `Get(key)`. Lazily removes (and unlinks from the LRU list) an entry
    /// found past its deadline, then reports it as not found.
    ///
    /// The LRU touch/unlink runs while this shard's write lock is still
    /// held, in the same critical section as the table lookup — not as a
    /// second, independently-locked step. Releasing the shard lock first
    /// would let the arena slot backing a captured index be freed and
    /// recycled for an unrelated key before the LRU call runs on it.
    pub fn get(&self, key: &[u8]) -> (Option<Value>, StatusCode) {
        let shard_idx = shard_index(key);
        let now = now_nanos();

        let found;
        {
            let shard = &self.inner.shards[shard_idx];
            let mut inner = shard.inner.write();
            let mut expired_lru_idx = None;
            let mut touch_lru_idx = None;
            match inner.table.get(key) {
                None => return (None, StatusCode::KeyNotFound),
                Some(slot) => {
                    if now > slot.deadline {
                        expired_lru_idx = slot.lru_index;
                        found = None;
                    } else {
                        found = Some(slot.value.clone());
                        touch_lru_idx = slot.lru_index;
                    }
                }
            }
            if found.is_none() {
                inner.table.remove(key);
                if let Some(idx) = expired_lru_idx {
                    self.inner.lru.unlink(idx);
                }
            } else if let Some(idx) = touch_lru_idx {
                self.inner.lru.move_to_front(idx);
            }
        }

        match found {
            None => (None, StatusCode::KeyNotFound),
            Some(value) => (Some(value), StatusCode::Success),
        }
    }

    /// `Delete(key)`. Idempotent: deleting an absent key is still `Success`.
    /// The LRU unlink runs while this shard's write lock is still held, for
    /// the same reason `Get` keeps it inside the shard's critical section.
    pub fn delete(&self, key: &[u8]) -> StatusCode {
        let shard_idx = shard_index(key);
        {
            let shard = &self.inner.shards[shard_idx];
            let mut inner = shard.inner.write();
            let lru_idx = inner.table.remove(key).and_then(|slot| slot.lru_index);
            if let Some(idx) = lru_idx {
                self.inner.lru.unlink(idx);
            }
        }
        StatusCode::Success
    }

    /// `Increase(key)`. Creates the key with value `1` if absent (an LRU
    /// insertion, subject to the same capacity eviction as `Set`); in place
    /// otherwise, preserving the prior deadline and numeric variant.
    ///
    /// Does not expiry-check an existing entry before incrementing it —
    /// only `Get` and `GetTTL` perform lazy expiry, matching the original
    /// store, which did not special-case `Increase` either.
    pub fn increase(&self, key: &[u8]) -> StatusCode {
        let key_arc: Arc<[u8]> = Arc::from(key);
        let shard_idx = shard_index(&key_arc);

        let mut status = StatusCode::Success;
        let mut newly_inserted = false;
        {
            let shard = &self.inner.shards[shard_idx];
            let mut inner = shard.inner.write();
            if let Some(slot) = inner.table.get_mut(&key_arc) {
                match slot.value.increment() {
                    Ok(incremented) => slot.value = incremented,
                    Err(code) => status = code,
                }
            } else {
                inner.table.insert(
                    key_arc.clone(),
                    ShardSlot { value: Value::Int(1), deadline: NEVER_EXPIRES, lru_index: None },
                );
                newly_inserted = true;
            }
        }

        if newly_inserted {
            match self.inner.capacity_mode {
                CapacityMode::Lru => self.link_new_entry(shard_idx, key_arc),
                CapacityMode::Random => self.evict_random_if_over_capacity(),
                CapacityMode::Unbounded => {}
            }
        }

        status
    }

    /// `GetTTL(key)`. Same expiry-aware lookup, LRU touch included, as
    /// `Get`, returning the absolute deadline instead of the value. The LRU
    /// touch/unlink runs inside the same shard-locked critical section as
    /// the lookup, for the same reason `Get` does.
    pub fn get_ttl(&self, key: &[u8]) -> (i64, StatusCode) {
        let shard_idx = shard_index(key);
        let now = now_nanos();

        let found;
        {
            let shard = &self.inner.shards[shard_idx];
            let mut inner = shard.inner.write();
            let mut expired_lru_idx = None;
            let mut touch_lru_idx = None;
            match inner.table.get(key) {
                None => return (0, StatusCode::KeyNotFound),
                Some(slot) => {
                    if now > slot.deadline {
                        expired_lru_idx = slot.lru_index;
                        found = None;
                    } else {
                        found = Some(slot.deadline);
                        touch_lru_idx = slot.lru_index;
                    }
                }
            }
            if found.is_none() {
                inner.table.remove(key);
                if let Some(idx) = expired_lru_idx {
                    self.inner.lru.unlink(idx);
                }
            } else if let Some(idx) = touch_lru_idx {
                self.inner.lru.move_to_front(idx);
            }
        }

        match found {
            None => (0, StatusCode::KeyNotFound),
            Some(deadline) => (deadline, StatusCode::Success),
        }
    }

    /// `DumpAllJSON()`. Snapshots every shard in turn (no global lock, so
    /// this is not a single atomic instant across shards) into one JSON
    /// object. Entries already past their deadline but not yet swept are
    /// included — sweeping is amortized and best-effort, not a precondition
    /// for correctness of reads, and `Dump` is a diagnostic, not a cache
    /// operation with expiry semantics of its own.
    pub fn dump_all_json(&self) -> (String, StatusCode) {
        let total: usize = self.inner.shards.iter().map(|s| s.inner.read().table.len()).sum();
        let mut map = serde_json::Map::with_capacity(total);

        for shard in &self.inner.shards {
            let inner = shard.inner.read();
            for (key, slot) in inner.table.iter() {
                let key_str = String::from_utf8_lossy(key).into_owned();
                let value_json = match serde_json::to_value(&slot.value) {
                    Ok(v) => v,
                    Err(_) => return (String::new(), StatusCode::JsonMarshalErr),
                };
                map.insert(key_str, value_json);
            }
        }

        match serde_json::to_string(&serde_json::Value::Object(map)) {
            Ok(s) => (s, StatusCode::Success),
            Err(_) => (String::new(), StatusCode::JsonMarshalErr),
        }
    }

    /// `Close()`. Idempotent: signals the sweeper to stop scheduling new
    /// work and joins every in-flight sweep thread before returning, so no
    /// sweep is still touching a shard once `Close` completes. Clears every
    /// shard and the LRU list; behavior of operations issued after `Close`
    /// is otherwise unspecified.
    pub fn close(&self) -> StatusCode {
        self.inner.closed.store(true, Ordering::Release);

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.inner.sweep_handles.lock();
            std::mem::take(&mut *guard)
        };
        let pending = handles.len();
        for handle in handles {
            let _ = handle.join();
        }

        for shard in &self.inner.shards {
            let mut inner = shard.inner.write();
            inner.table.clear();
            inner.op_count = 0;
        }
        self.inner.lru.clear();

        tracing::debug!(joined_sweeps = pending, "store closed");
        StatusCode::Success
    }

    /// Links a freshly-inserted key into the LRU list and, if that pushes
    /// the list over capacity, evicts the tail. The tail's shard is
    /// determined while still holding this shard's write lock and the LRU
    /// mutex (acquired in that order); if the victim lives in this same
    /// shard, it is removed immediately in the same critical section. If it
    /// lives in a different shard, both locks are released and reacquired
    /// one at a time — shard first, LRU mutex second — to avoid ever
    /// holding two shards' write locks at once.
    fn link_new_entry(&self, shard_idx: usize, key_arc: Arc<[u8]>) {
        let mut victim = None;
        {
            let shard = &self.inner.shards[shard_idx];
            let mut inner = shard.inner.write();
            let (arena_idx, tail_victim) =
                self.inner.lru.push_front_and_check_capacity(key_arc.clone(), shard_idx, self.inner.capacity);

            match inner.table.get_mut(&key_arc) {
                Some(slot) => slot.lru_index = Some(arena_idx),
                None => {
                    // Raced with a concurrent delete of the very key we just
                    // inserted. Undo the link rather than leaving a dangling
                    // arena node.
                    self.inner.lru.unlink(arena_idx);
                    return;
                }
            }

            if let Some((victim_key, victim_shard_idx, victim_node_idx)) = tail_victim {
                if victim_shard_idx == shard_idx {
                    inner.table.remove(&victim_key);
                    self.inner.lru.unlink(victim_node_idx);
                } else {
                    victim = Some((victim_key, victim_shard_idx, victim_node_idx));
                }
            }
        }

        if let Some((victim_key, victim_shard_idx, victim_node_idx)) = victim {
            {
                let victim_shard = &self.inner.shards[victim_shard_idx];
                let mut victim_inner = victim_shard.inner.write();
                victim_inner.table.remove(&victim_key);
            }
            self.inner.lru.unlink(victim_node_idx);
            tracing::trace!(victim_shard_idx, "evicted lru tail from a different shard");
        }
    }

    /// `Random` eviction intent: if the store holds more live entries than
    /// its capacity, picks a uniformly random shard and evicts a uniformly
    /// random key from it. Unlike LRU this needs no recency bookkeeping, so
    /// it walks shards directly rather than consulting the (disabled, in
    /// this mode) LRU list.
    fn evict_random_if_over_capacity(&self) {
        if self.total_len() <= self.inner.capacity {
            return;
        }
        let mut rng = rand::thread_rng();
        let start = rng.gen_range(0..SHARD_COUNT);
        for offset in 0..SHARD_COUNT {
            let idx = (start + offset) % SHARD_COUNT;
            let shard = &self.inner.shards[idx];
            let mut inner = shard.inner.write();
            if inner.table.is_empty() {
                continue;
            }
            let victim_pos = rng.gen_range(0..inner.table.len());
            let victim_key = inner.table.keys().nth(victim_pos).cloned();
            if let Some(key) = victim_key {
                inner.table.remove(&key);
            }
            return;
        }
    }

    fn total_len(&self) -> usize {
        self.inner.shards.iter().map(|s| s.inner.read().table.len()).sum()
    }

    fn schedule_sweep(&self, shard_idx: usize) {
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }
        tracing::trace!(shard_idx, "scheduling expiry sweep");
        let inner = Arc::clone(&self.inner);
        let handle = std::thread::spawn(move || sweeper::sweep_shard(&inner, shard_idx));

        let mut handles = self.inner.sweep_handles.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    #[cfg(test)]
    pub(crate) fn inner_for_test(&self) -> &StoreInner {
        &self.inner
    }

    #[cfg(test)]
    pub(crate) fn lru_len_for_test(&self) -> usize {
        self.inner.lru.len()
    }

    #[cfg(test)]
    pub(crate) fn shard_index_for_test(key: &[u8]) -> usize {
        shard_index(key)
    }
}
