//! The line protocol: request parsing and value encoding.
//!
//! Not RESP — a minimal, whitespace-split protocol of the kind a raw
//! `telnet` session can drive. Values in `SET` are a single whitespace-free
//! token; richer values (JSON, raw binary with embedded spaces) are reached
//! only through `kash-client`, not this wire format.

use kash_core::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Get { key: Vec<u8> },
    Set { key: Vec<u8>, value: Vec<u8>, timeout_nanos: Option<i64> },
    Del { key: Vec<u8> },
    Incr { key: Vec<u8> },
    Ttl { key: Vec<u8> },
    Dump,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError(pub String);

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseError {}

/// Parses one already-trimmed request line.
pub fn parse_line(line: &str) -> Result<Command, ParseError> {
    let mut parts = line.split_ascii_whitespace();
    let cmd = parts.next().ok_or_else(|| ParseError("empty command".to_string()))?;

    match cmd.to_ascii_uppercase().as_str() {
        "GET" => {
            let key = require_arg(&mut parts, "GET requires a key")?;
            Ok(Command::Get { key: key.as_bytes().to_vec() })
        }
        "SET" => {
            let key = require_arg(&mut parts, "SET requires a key")?;
            let value = require_arg(&mut parts, "SET requires a value")?;
            // The wire protocol's trailing SET argument is whole seconds;
            // the core store's timeouts are nanoseconds.
            let timeout_nanos = match parts.next() {
                Some(raw) => {
                    let secs = raw
                        .parse::<i64>()
                        .map_err(|_| ParseError(format!("invalid timeout: {raw}")))?;
                    let nanos = secs
                        .checked_mul(1_000_000_000)
                        .ok_or_else(|| ParseError(format!("timeout out of range: {raw}")))?;
                    Some(nanos)
                }
                None => None,
            };
            Ok(Command::Set {
                key: key.as_bytes().to_vec(),
                value: value.as_bytes().to_vec(),
                timeout_nanos,
            })
        }
        "DEL" => {
            let key = require_arg(&mut parts, "DEL requires a key")?;
            Ok(Command::Del { key: key.as_bytes().to_vec() })
        }
        "INCR" => {
            let key = require_arg(&mut parts, "INCR requires a key")?;
            Ok(Command::Incr { key: key.as_bytes().to_vec() })
        }
        "TTL" => {
            let key = require_arg(&mut parts, "TTL requires a key")?;
            Ok(Command::Ttl { key: key.as_bytes().to_vec() })
        }
        "DUMP" => Ok(Command::Dump),
        "STOP" => Ok(Command::Stop),
        other => Err(ParseError(format!("cmd not recognized: {other}"))),
    }
}

fn require_arg<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    message: &str,
) -> Result<&'a str, ParseError> {
    parts.next().ok_or_else(|| ParseError(message.to_string()))
}

/// Renders a stored value as wire bytes.
pub fn encode_value(value: &Value) -> Vec<u8> {
    match value {
        Value::Bytes(b) => b.to_vec(),
        Value::Int(v) => v.to_string().into_bytes(),
        Value::UInt32(v) => v.to_string().into_bytes(),
        Value::UInt64(v) => v.to_string().into_bytes(),
        Value::Json(v) => v.to_string().into_bytes(),
    }
}
