//! Absolute deadlines are stored as nanoseconds since the Unix epoch.

use std::time::{SystemTime, UNIX_EPOCH};

/// Sentinel deadline meaning "never expires".
pub const NEVER_EXPIRES: i64 = i64::MAX;

/// Current time as nanoseconds since the epoch.
///
/// Saturates rather than panicking if the clock is somehow before the
/// epoch; that reads as "already expired" for any finite deadline, which is
/// a safe direction to err in for a cache.
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0)
}

/// Computes an absolute deadline from a relative timeout in nanoseconds.
/// `0` means "never expires".
pub fn deadline_from_timeout(timeout_nanos: i64) -> i64 {
    if timeout_nanos <= 0 {
        NEVER_EXPIRES
    } else {
        now_nanos().saturating_add(timeout_nanos)
    }
}
