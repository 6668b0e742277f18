//! # Ambient Error Type
//!
//! Purpose: give configuration loading, the size parser, the server, and the
//! client a single error type instead of each inventing its own.

use thiserror::Error;

/// Result type for ambient (non-core) operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced outside the core store's closed status-code contract.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A human-readable size string (e.g. "64MB") could not be parsed.
    #[error("invalid size string: {0}")]
    InvalidSize(String),

    /// Network or I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line-protocol request was malformed.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server returned an error line for a request.
    #[error("server error: {0}")]
    Server(String),

    /// Configuration value was out of range or otherwise invalid.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
