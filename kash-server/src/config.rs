//! Translates CLI input into a running [`Store`].

use std::net::SocketAddr;
use std::time::Duration;

use kash_common::{parse_human_size, CacheResult};
use kash_core::{
    with_capacity, with_default_timeout, with_eviction_policy, with_max_memory_bytes, EvictionPolicy, Store,
    StoreOption,
};

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub capacity: usize,
    pub eviction_policy: EvictionPolicy,
    pub default_timeout: Duration,
    pub max_memory: Option<String>,
}

impl Config {
    pub fn build_store(&self) -> CacheResult<Store> {
        let mut options: Vec<StoreOption> = vec![
            with_capacity(self.capacity),
            with_eviction_policy(self.eviction_policy),
            with_default_timeout(self.default_timeout),
        ];
        if let Some(raw) = &self.max_memory {
            options.push(with_max_memory_bytes(parse_human_size(raw)?));
        }
        Ok(Store::new(options))
    }
}
