//! The stored value type.
//!
//! The original store held `interface{}` and reflected on it at `Increase`
//! time. A closed, tagged enum replaces that reflection with a match.

use bytes::Bytes;
use serde::{Serialize, Serializer};

use crate::status::StatusCode;

/// A value stored in the cache.
///
/// `Bytes` shares its backing buffer on `clone` (a reference-counted view,
/// not a copy) rather than deep-copying. Two clones of the same entry alias
/// the same memory; this is a documented hazard, not a bug, and mirrors the
/// original store's reference-semantics get/set.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bytes(Bytes),
    Int(i64),
    UInt32(u32),
    UInt64(u64),
    Json(serde_json::Value),
}

impl Value {
    /// Increments a numeric value by one, preserving its variant, wrapping
    /// on overflow rather than panicking.
    pub fn increment(&self) -> Result<Value, StatusCode> {
        match self {
            Value::Int(v) => Ok(Value::Int(v.wrapping_add(1))),
            Value::UInt32(v) => Ok(Value::UInt32(v.wrapping_add(1))),
            Value::UInt64(v) => Ok(Value::UInt64(v.wrapping_add(1))),
            Value::Bytes(_) | Value::Json(_) => Err(StatusCode::ValueNotNumberType),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Bytes(b) => serializer.serialize_str(&String::from_utf8_lossy(b)),
            Value::Int(v) => serializer.serialize_i64(*v),
            Value::UInt32(v) => serializer.serialize_u32(*v),
            Value::UInt64(v) => serializer.serialize_u64(*v),
            Value::Json(v) => v.serialize(serializer),
        }
    }
}
