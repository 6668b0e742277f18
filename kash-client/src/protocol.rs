//! Wire encoding/decoding for the line protocol, from the client's side.

use std::io;

use kash_common::{CacheError, CacheResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;

/// A parsed response line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok,
    Value(Vec<u8>),
    Err(String),
}

/// Encodes a command and its arguments as one request line, including the
/// trailing newline.
pub fn encode_command(name: &str, args: &[&[u8]]) -> Vec<u8> {
    let mut line = Vec::new();
    line.extend_from_slice(name.as_bytes());
    for arg in args {
        line.push(b' ');
        line.extend_from_slice(arg);
    }
    line.push(b'\n');
    line
}

/// Reads and classifies one response line.
pub async fn read_response(reader: &mut BufReader<OwnedReadHalf>) -> CacheResult<Response> {
    let mut line = String::new();
    let bytes_read = reader.read_line(&mut line).await.map_err(CacheError::Io)?;
    if bytes_read == 0 {
        return Err(CacheError::Io(io::Error::new(io::ErrorKind::UnexpectedEof, "server closed the connection")));
    }

    let trimmed = line.trim_end_matches(['\r', '\n']);
    if trimmed == "OK" {
        Ok(Response::Ok)
    } else if let Some(message) = trimmed.strip_prefix("ERR ") {
        Ok(Response::Err(message.to_string()))
    } else {
        Ok(Response::Value(trimmed.as_bytes().to_vec()))
    }
}
