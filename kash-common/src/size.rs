//! Convert strings like `"64MB"` into a byte count for
//! `kash-core::Options::with_max_memory`. Kept outside the core crate: no
//! locking or eviction concerns, just string parsing.

use crate::error::{CacheError, CacheResult};

const UNIT_SUFFIXES: [(&str, u64); 5] = [
    ("GB", 1024 * 1024 * 1024),
    ("MB", 1024 * 1024),
    ("KB", 1024),
    ("B", 1),
    ("", 1),
];

/// Parses a human-readable byte size such as `"64MB"`, `"512KB"`, or a bare
/// integer (bytes). Case-insensitive; whitespace around the number is
/// trimmed.
///
/// # Errors
/// Returns `CacheError::InvalidSize` if the string has no numeric prefix or
/// the numeric part does not fit in a `u64`.
pub fn parse_human_size(input: &str) -> CacheResult<u64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CacheError::InvalidSize(input.to_string()));
    }

    let upper = trimmed.to_ascii_uppercase();
    for (suffix, multiplier) in UNIT_SUFFIXES {
        if let Some(number) = upper.strip_suffix(suffix) {
            let number = number.trim();
            if number.is_empty() {
                continue;
            }
            let value: f64 = number
                .parse()
                .map_err(|_| CacheError::InvalidSize(input.to_string()))?;
            if value < 0.0 {
                return Err(CacheError::InvalidSize(input.to_string()));
            }
            return Ok((value * multiplier as f64) as u64);
        }
    }

    Err(CacheError::InvalidSize(input.to_string()))
}
