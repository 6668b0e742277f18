//! Closed result codes for the core store's operations.
//!
//! The store never returns a rich error type for expected outcomes — only
//! one of these four codes. Ambient crates (server, client) are free to wrap
//! a `StatusCode` in their own `thiserror` error types for transport, but the
//! core itself stays closed.

/// Outcome of a store operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// The operation completed as requested.
    Success,
    /// The key was not present (or had already expired).
    KeyNotFound,
    /// `Increase` was called on a value that is not one of the numeric
    /// variants.
    ValueNotNumberType,
    /// `DumpAllJSON` failed to marshal the snapshot.
    JsonMarshalErr,
}
