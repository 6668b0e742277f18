//! # kash-common
//!
//! Shared ambient types used by the server, client, and benchmark crates:
//! the `CacheError`/`CacheResult` pair for configuration and I/O failures,
//! and the human-readable size parser feeding `kash-core::Options`.
//!
//! The core store itself (`kash-core`) does not depend on this crate — its
//! operations return a closed status-code enum rather than `Result`, per
//! the cache's error-handling design.

mod error;
mod size;

pub use error::{CacheError, CacheResult};
pub use size::parse_human_size;
