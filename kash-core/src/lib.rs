//! # kash-core
//!
//! A sharded, TTL- and LRU-evicting in-memory key/value cache.
//!
//! Keys are routed to one of [`hash::SHARD_COUNT`] shards by a fixed FNV-1a
//! hash; each shard is independently locked, so unrelated keys never
//! contend on the same lock. Expiry is amortized: a shard sweeps itself for
//! expired entries once its own operation count crosses a threshold, rather
//! than on a fixed timer. LRU eviction, when enabled, is tracked by a single
//! list spanning every shard, guarded by its own lock distinct from any
//! shard's.
//!
//! The [`Store`] facade is the only public entry point; its operations
//! return a closed [`StatusCode`] rather than a `Result` — there is no
//! recoverable-error path inside the cache itself, only "found" / "not
//! found" / "wrong type" / "could not marshal".

mod hash;
mod lru;
mod options;
mod shard;
mod status;
mod store;
mod sweeper;
mod time;
mod value;

pub use hash::SHARD_COUNT;
pub use options::{with_capacity, with_default_timeout, with_eviction_policy, with_max_memory_bytes, EvictionPolicy, StoreOption};
pub use status::StatusCode;
pub use store::Store;
pub use value::Value;

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use bytes::Bytes;

    use super::*;

    fn bytes_value(s: &str) -> Value {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    // --- Round-trip -----------------------------------------------------

    #[test]
    fn set_then_get_round_trips() {
        let store = Store::new(std::iter::empty());
        assert_eq!(store.set(b"k".to_vec(), Value::Int(42)), StatusCode::Success);
        let (value, status) = store.get(b"k");
        assert_eq!(status, StatusCode::Success);
        assert_eq!(value, Some(Value::Int(42)));
    }

    #[test]
    fn get_missing_key_reports_not_found() {
        let store = Store::new(std::iter::empty());
        let (value, status) = store.get(b"missing");
        assert_eq!(status, StatusCode::KeyNotFound);
        assert_eq!(value, None);
    }

    // --- Expiry -----------------------------------------------------------

    #[test]
    fn get_after_timeout_reports_not_found() {
        let store = Store::new(std::iter::empty());
        store.set_with_timeout(b"k".to_vec(), Value::Int(1), 1_000_000); // 1ms
        thread::sleep(std::time::Duration::from_millis(10));
        let (value, status) = store.get(b"k");
        assert_eq!(status, StatusCode::KeyNotFound);
        assert_eq!(value, None);
    }

    #[test]
    fn zero_timeout_never_expires() {
        let store = Store::new(std::iter::empty());
        store.set_with_timeout(b"k".to_vec(), Value::Int(1), 0);
        thread::sleep(std::time::Duration::from_millis(5));
        let (value, status) = store.get(b"k");
        assert_eq!(status, StatusCode::Success);
        assert_eq!(value, Some(Value::Int(1)));
    }

    // --- Idempotent delete --------------------------------------------------

    #[test]
    fn delete_is_idempotent() {
        let store = Store::new(std::iter::empty());
        store.set(b"k".to_vec(), Value::Int(1));
        assert_eq!(store.delete(b"k"), StatusCode::Success);
        assert_eq!(store.delete(b"k"), StatusCode::Success);
        let (_, status) = store.get(b"k");
        assert_eq!(status, StatusCode::KeyNotFound);
    }

    // --- Shard stability ----------------------------------------------------

    #[test]
    fn shard_routing_is_stable_across_calls() {
        let idx_a = Store::shard_index_for_test(b"stable-key");
        let idx_b = Store::shard_index_for_test(b"stable-key");
        assert_eq!(idx_a, idx_b);
    }

    // --- LRU invariant and capacity bound ------------------------------------

    #[test]
    fn lru_capacity_two_trace() {
        // A concrete walk through the LRU capacity=2 scenario: inserting a
        // third key evicts the least-recently-used one, and a Get between
        // inserts changes which key that is.
        let store = Store::new([with_capacity(2), with_eviction_policy(EvictionPolicy::LRU)]);

        assert_eq!(store.set(b"a".to_vec(), Value::Int(1)), StatusCode::Success);
        assert_eq!(store.set(b"b".to_vec(), Value::Int(2)), StatusCode::Success);
        // List (front..back, MRU..LRU): b, a

        // Touch "a", making "b" the LRU.
        let (value, status) = store.get(b"a");
        assert_eq!(status, StatusCode::Success);
        assert_eq!(value, Some(Value::Int(1)));
        // List: a, b

        // Inserting "c" must evict "b", not "a".
        assert_eq!(store.set(b"c".to_vec(), Value::Int(3)), StatusCode::Success);

        let (_, status_b) = store.get(b"b");
        assert_eq!(status_b, StatusCode::KeyNotFound, "b was least-recently-used and should have been evicted");

        let (value_a, status_a) = store.get(b"a");
        assert_eq!(status_a, StatusCode::Success);
        assert_eq!(value_a, Some(Value::Int(1)));

        let (value_c, status_c) = store.get(b"c");
        assert_eq!(status_c, StatusCode::Success);
        assert_eq!(value_c, Some(Value::Int(3)));
    }

    #[test]
    fn lru_never_exceeds_capacity() {
        let store = Store::new([with_capacity(4), with_eviction_policy(EvictionPolicy::LRU)]);
        for i in 0..100 {
            store.set(format!("key-{i}").into_bytes(), Value::Int(i));
            assert!(store.lru_len_for_test() <= 4);
        }
        assert_eq!(store.lru_len_for_test(), 4);
    }

    #[test]
    fn overwriting_existing_key_does_not_grow_lru_list() {
        let store = Store::new([with_capacity(2), with_eviction_policy(EvictionPolicy::LRU)]);
        store.set(b"a".to_vec(), Value::Int(1));
        store.set(b"a".to_vec(), Value::Int(2));
        assert_eq!(store.lru_len_for_test(), 1);
        let (value, _) = store.get(b"a");
        assert_eq!(value, Some(Value::Int(2)));
    }

    // --- Increase type matrix ------------------------------------------------

    #[test]
    fn increase_creates_absent_key_as_one() {
        let store = Store::new(std::iter::empty());
        assert_eq!(store.increase(b"counter"), StatusCode::Success);
        let (value, _) = store.get(b"counter");
        assert_eq!(value, Some(Value::Int(1)));
    }

    #[test]
    fn increase_matrix_over_numeric_variants() {
        let store = Store::new(std::iter::empty());

        store.set(b"i".to_vec(), Value::Int(1));
        assert_eq!(store.increase(b"i"), StatusCode::Success);
        assert_eq!(store.get(b"i").0, Some(Value::Int(2)));

        store.set(b"u32".to_vec(), Value::UInt32(1));
        assert_eq!(store.increase(b"u32"), StatusCode::Success);
        assert_eq!(store.get(b"u32").0, Some(Value::UInt32(2)));

        store.set(b"u64".to_vec(), Value::UInt64(1));
        assert_eq!(store.increase(b"u64"), StatusCode::Success);
        assert_eq!(store.get(b"u64").0, Some(Value::UInt64(2)));
    }

    #[test]
    fn increase_rejects_non_numeric_variants() {
        let store = Store::new(std::iter::empty());

        store.set(b"bytes".to_vec(), bytes_value("hello"));
        assert_eq!(store.increase(b"bytes"), StatusCode::ValueNotNumberType);

        store.set(b"json".to_vec(), Value::Json(serde_json::json!({"a": 1})));
        assert_eq!(store.increase(b"json"), StatusCode::ValueNotNumberType);
    }

    #[test]
    fn increase_preserves_deadline_on_existing_key() {
        let store = Store::new(std::iter::empty());
        store.set_with_timeout(b"k".to_vec(), Value::Int(1), 60_000_000_000);
        let (deadline_before, _) = store.get_ttl(b"k");
        store.increase(b"k");
        let (deadline_after, _) = store.get_ttl(b"k");
        assert_eq!(deadline_before, deadline_after);
    }

    // --- GetTTL -------------------------------------------------------------

    #[test]
    fn get_ttl_reports_never_expires_as_max() {
        let store = Store::new(std::iter::empty());
        store.set(b"k".to_vec(), Value::Int(1));
        let (deadline, status) = store.get_ttl(b"k");
        assert_eq!(status, StatusCode::Success);
        assert_eq!(deadline, i64::MAX);
    }

    #[test]
    fn get_ttl_on_missing_key() {
        let store = Store::new(std::iter::empty());
        let (deadline, status) = store.get_ttl(b"missing");
        assert_eq!(status, StatusCode::KeyNotFound);
        assert_eq!(deadline, 0);
    }

    // --- DumpAllJSON ---------------------------------------------------------

    #[test]
    fn dump_all_json_includes_every_live_entry() {
        let store = Store::new(std::iter::empty());
        store.set(b"a".to_vec(), Value::Int(1));
        store.set(b"b".to_vec(), bytes_value("hi"));
        let (json, status) = store.dump_all_json();
        assert_eq!(status, StatusCode::Success);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["a"], serde_json::json!(1));
        assert_eq!(parsed["b"], serde_json::json!("hi"));
    }

    #[test]
    fn dump_all_json_includes_expired_but_unswept_entries() {
        // Pinned behavior: Dump does not itself expiry-check, so an entry
        // past its deadline but not yet reclaimed by a sweep still appears.
        let store = Store::new(std::iter::empty());
        store.set_with_timeout(b"stale".to_vec(), Value::Int(1), 1);
        thread::sleep(std::time::Duration::from_millis(5));
        let (json, status) = store.dump_all_json();
        assert_eq!(status, StatusCode::Success);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["stale"], serde_json::json!(1));
    }

    // --- Close ----------------------------------------------------------------

    #[test]
    fn close_is_idempotent_and_empties_the_store() {
        let store = Store::new(std::iter::empty());
        store.set(b"k".to_vec(), Value::Int(1));
        assert_eq!(store.close(), StatusCode::Success);
        assert_eq!(store.close(), StatusCode::Success);
        let (_, status) = store.get(b"k");
        assert_eq!(status, StatusCode::KeyNotFound);
    }

    // --- Concrete scenarios ---------------------------------------------------

    #[test]
    fn scenario_set_get_delete_get() {
        let store = Store::new(std::iter::empty());
        store.set(b"name".to_vec(), bytes_value("kash"));
        assert_eq!(store.get(b"name").0, Some(bytes_value("kash")));
        store.delete(b"name");
        assert_eq!(store.get(b"name").0, None);
    }

    #[test]
    fn scenario_increase_absent_then_present_then_wrong_type() {
        let store = Store::new(std::iter::empty());
        assert_eq!(store.increase(b"hits"), StatusCode::Success);
        assert_eq!(store.increase(b"hits"), StatusCode::Success);
        assert_eq!(store.get(b"hits").0, Some(Value::Int(2)));

        store.set(b"name".to_vec(), bytes_value("kash"));
        assert_eq!(store.increase(b"name"), StatusCode::ValueNotNumberType);
    }

    #[test]
    fn scenario_set_with_timeout_then_expiry_then_reuse_key() {
        let store = Store::new(std::iter::empty());
        store.set_with_timeout(b"session".to_vec(), bytes_value("token-a"), 1_000_000);
        thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(store.get(b"session").0, None);
        store.set(b"session".to_vec(), bytes_value("token-b"));
        assert_eq!(store.get(b"session").0, Some(bytes_value("token-b")));
    }

    #[test]
    fn scenario_many_keys_same_shard_do_not_interfere() {
        let store = Store::new(std::iter::empty());
        // Brute-force a handful of keys landing in the same shard so we can
        // exercise the shard's own map directly.
        let mut by_shard: std::collections::HashMap<usize, Vec<String>> = std::collections::HashMap::new();
        for i in 0..500 {
            let key = format!("k{i}");
            by_shard.entry(Store::shard_index_for_test(key.as_bytes())).or_default().push(key);
        }
        let (_, same_shard_keys) = by_shard.into_iter().find(|(_, ks)| ks.len() >= 3).expect("some shard collides with 500 keys");

        for (i, key) in same_shard_keys.iter().enumerate() {
            store.set(key.clone().into_bytes(), Value::Int(i as i64));
        }
        for (i, key) in same_shard_keys.iter().enumerate() {
            assert_eq!(store.get(key.as_bytes()).0, Some(Value::Int(i as i64)));
        }
    }

    #[test]
    fn scenario_dump_reflects_deletes() {
        let store = Store::new(std::iter::empty());
        store.set(b"a".to_vec(), Value::Int(1));
        store.set(b"b".to_vec(), Value::Int(2));
        store.delete(b"a".as_ref());
        let (json, _) = store.dump_all_json();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(parsed.get("a").is_none());
        assert_eq!(parsed["b"], serde_json::json!(2));
    }

    #[test]
    fn scenario_lru_capacity_one_always_keeps_most_recent() {
        let store = Store::new([with_capacity(1), with_eviction_policy(EvictionPolicy::LRU)]);
        store.set(b"a".to_vec(), Value::Int(1));
        store.set(b"b".to_vec(), Value::Int(2));
        assert_eq!(store.get(b"a").0, None);
        assert_eq!(store.get(b"b").0, Some(Value::Int(2)));
        assert_eq!(store.lru_len_for_test(), 1);
    }

    // --- Concurrency ---------------------------------------------------------

    #[test]
    fn concurrent_writers_and_readers_do_not_corrupt_state() {
        let store = Store::new(std::iter::empty());
        let writers: Vec<_> = (0..32)
            .map(|w| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..1000 {
                        let key = format!("w{w}-{i}");
                        store.set(key.into_bytes(), Value::Int(i));
                    }
                })
            })
            .collect();

        let stop = Arc::new(AtomicUsize::new(0));
        let readers: Vec<_> = (0..32)
            .map(|_| {
                let store = store.clone();
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    while stop.load(Ordering::Relaxed) == 0 {
                        let _ = store.get(b"w0-0");
                    }
                })
            })
            .collect();

        for w in writers {
            w.join().unwrap();
        }
        stop.store(1, Ordering::Relaxed);
        for r in readers {
            r.join().unwrap();
        }

        for w in 0..32 {
            for i in [0, 999] {
                let key = format!("w{w}-{i}");
                assert_eq!(store.get(key.as_bytes()).0, Some(Value::Int(i)));
            }
        }
    }

    #[test]
    fn sweep_runs_under_concurrent_sets() {
        let store = Store::new(std::iter::empty());
        let writers: Vec<_> = (0..8)
            .map(|w| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..500 {
                        // Short timeouts so entries are already expired by
                        // the time a sweep (triggered by op_count crossing
                        // the threshold) walks the shard.
                        store.set_with_timeout(format!("w{w}-{i}").into_bytes(), Value::Int(i), 1);
                    }
                })
            })
            .collect();
        for w in writers {
            w.join().unwrap();
        }
        thread::sleep(std::time::Duration::from_millis(50));
        store.close();
    }

    #[test]
    fn concurrent_lru_traffic_with_deletes_keeps_the_lru_list_consistent() {
        // Same interleaving as concurrent_writers_and_readers_do_not_corrupt_state,
        // but with LRU eviction actually engaged (bounded capacity) and
        // deletes mixed in with the writes and reads, so every LRU-touching
        // path (Set-overwrite, Get, Delete, new-key eviction) runs under
        // contention.
        let store = Store::new([with_capacity(256), with_eviction_policy(EvictionPolicy::LRU)]);

        let writers: Vec<_> = (0..32)
            .map(|w| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..1000 {
                        let key = format!("w{w}-{}", i % 50);
                        if i % 7 == 0 {
                            store.delete(key.as_bytes());
                        } else {
                            store.set(key.into_bytes(), Value::Int(i));
                        }
                    }
                })
            })
            .collect();

        let stop = Arc::new(AtomicUsize::new(0));
        let readers: Vec<_> = (0..32)
            .map(|w| {
                let store = store.clone();
                let stop = Arc::clone(&stop);
                thread::spawn(move || {
                    while stop.load(Ordering::Relaxed) == 0 {
                        let _ = store.get(format!("w{w}-0").as_bytes());
                    }
                })
            })
            .collect();

        for w in writers {
            w.join().unwrap();
        }
        stop.store(1, Ordering::Relaxed);
        for r in readers {
            r.join().unwrap();
        }

        let total_entries: usize =
            store.inner_for_test().shards.iter().map(|s| s.inner.read().table.len()).sum();
        assert_eq!(
            store.lru_len_for_test(),
            total_entries,
            "every live entry must have exactly one LRU node and vice versa"
        );
    }
}
