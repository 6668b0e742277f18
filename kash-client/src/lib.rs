//! # kash-client
//!
//! A pooled TCP client for `kash-server`'s line protocol.

mod client;
mod pool;
mod protocol;

pub use client::{ClientConfig, KashClient};
