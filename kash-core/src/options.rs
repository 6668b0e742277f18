//! Functional-options construction.
//!
//! `Store::new` takes a list of `StoreOption`s, each of which mutates one
//! field of the builder state — the same shape the original store's
//! `SetDefaultTimeout`/`SetEvictionPolicy`/`SetMaxMemory`/`SetCapacity`
//! options used, ported from closures-over-an-interface to closures-over-a-
//! struct.

use std::time::Duration;

/// Which entries are candidates for capacity-triggered eviction, and how a
/// victim is chosen among them.
///
/// Only `LRU` and `Random` are wired to an eviction strategy; the other
/// four variants are accepted (so callers porting the original store's
/// policy constants compile unchanged) but currently evict nothing — no
/// eviction runs for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    #[default]
    Random,
    LRU,
    VolatileRandom,
    VolatileLRU,
    AllRandom,
    AllLRU,
}

pub(crate) struct OptionsState {
    pub default_timeout_nanos: i64,
    pub max_memory_bytes: Option<u64>,
    pub capacity: usize,
    pub eviction_policy: EvictionPolicy,
}

impl Default for OptionsState {
    fn default() -> Self {
        OptionsState {
            default_timeout_nanos: 0,
            max_memory_bytes: None,
            capacity: 0,
            eviction_policy: EvictionPolicy::Random,
        }
    }
}

/// One option, applied in order to the builder state.
pub struct StoreOption(Box<dyn FnOnce(&mut OptionsState)>);

impl StoreOption {
    pub(crate) fn apply(self, state: &mut OptionsState) {
        (self.0)(state)
    }
}

/// Sets the timeout `Set` uses when no explicit timeout is given. Zero (the
/// default) means entries never expire unless `SetWithTimeout` is used.
pub fn with_default_timeout(timeout: Duration) -> StoreOption {
    StoreOption(Box::new(move |s| s.default_timeout_nanos = timeout.as_nanos() as i64))
}

/// Sets an advisory memory budget in bytes. Not enforced by eviction — the
/// store does not track per-value memory usage — but retained so callers
/// can read back what was configured.
pub fn with_max_memory_bytes(bytes: u64) -> StoreOption {
    StoreOption(Box::new(move |s| s.max_memory_bytes = Some(bytes)))
}

/// Sets the maximum number of live entries before eviction kicks in. `0`
/// (the default) means unbounded.
pub fn with_capacity(capacity: usize) -> StoreOption {
    StoreOption(Box::new(move |s| s.capacity = capacity))
}

/// Selects which entries eviction considers and how it picks among them.
pub fn with_eviction_policy(policy: EvictionPolicy) -> StoreOption {
    StoreOption(Box::new(move |s| s.eviction_policy = policy))
}
