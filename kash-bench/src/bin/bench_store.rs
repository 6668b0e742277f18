//! A dependency-free throughput benchmark for `kash-core::Store`.
//!
//! Keys and values are generated with a hand-rolled xorshift PRNG rather
//! than pulling in a `rand` dependency for the bench binary itself — the
//! store's own eviction policies use `rand`, but the workload generator
//! here doesn't need cryptographic or even well-distributed randomness,
//! just something cheap and repeatable.

use std::time::Instant;

use kash_core::{with_capacity, with_eviction_policy, EvictionPolicy, Store, Value};

struct XorShift64(u64);

impl XorShift64 {
    fn new(seed: u64) -> Self {
        XorShift64(if seed == 0 { 0xdead_beef_cafe_babe } else { seed })
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

struct BenchConfig {
    keys: usize,
    value_bytes: usize,
    iterations: usize,
    capacity: usize,
}

impl BenchConfig {
    fn from_args() -> Self {
        let mut keys = 10_000;
        let mut value_bytes = 64;
        let mut iterations = 200_000;
        let mut capacity = 0;

        let mut args = std::env::args().skip(1);
        while let Some(flag) = args.next() {
            let value = args.next();
            match (flag.as_str(), value) {
                ("--keys", Some(v)) => keys = v.parse().unwrap_or(keys),
                ("--value-bytes", Some(v)) => value_bytes = v.parse().unwrap_or(value_bytes),
                ("--iterations", Some(v)) => iterations = v.parse().unwrap_or(iterations),
                ("--capacity", Some(v)) => capacity = v.parse().unwrap_or(capacity),
                _ => {}
            }
        }

        BenchConfig { keys, value_bytes, iterations, capacity }
    }
}

fn build_buffers(config: &BenchConfig) -> (Vec<Vec<u8>>, Vec<u8>) {
    let mut rng = XorShift64::new(0x5eed);
    let keys: Vec<Vec<u8>> = (0..config.keys).map(|i| format!("bench-key-{i}").into_bytes()).collect();
    let mut value = vec![0u8; config.value_bytes];
    for byte in value.iter_mut() {
        *byte = rng.next_u64() as u8;
    }
    (keys, value)
}

fn report(label: &str, operations: usize, elapsed: std::time::Duration) {
    let secs = elapsed.as_secs_f64();
    let ops_per_sec = if secs > 0.0 { operations as f64 / secs } else { f64::INFINITY };
    println!("{label}: {operations} ops in {secs:.3}s ({ops_per_sec:.0} ops/s)");
}

fn main() {
    let config = BenchConfig::from_args();
    let (keys, value) = build_buffers(&config);

    let store = if config.capacity > 0 {
        Store::new([with_capacity(config.capacity), with_eviction_policy(EvictionPolicy::LRU)])
    } else {
        Store::new(std::iter::empty())
    };

    for key in &keys {
        store.set(key.clone(), Value::Bytes(value.clone().into()));
    }

    let mut rng = XorShift64::new(0xf00d);

    let started = Instant::now();
    for _ in 0..config.iterations {
        let idx = (rng.next_u64() as usize) % keys.len();
        let _ = store.get(&keys[idx]);
    }
    report("get", config.iterations, started.elapsed());

    let started = Instant::now();
    for i in 0..config.iterations {
        let idx = (rng.next_u64() as usize) % keys.len();
        store.set_with_timeout(keys[idx].clone(), Value::Int(i as i64), 0);
    }
    report("set", config.iterations, started.elapsed());

    store.close();
}
