//! The TCP accept loop and per-connection request dispatch.

use kash_core::{Store, StatusCode, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::protocol::{encode_value, parse_line, Command};

/// Accepts connections until the listener errors, spawning one task per
/// connection. Each task shares the same `Store` (cheap to clone — an
/// `Arc` underneath).
pub async fn run(listener: TcpListener, store: Store) -> anyhow::Result<()> {
    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let store = store.clone();
        tokio::spawn(async move {
            tracing::info!(%peer_addr, "client connected");
            match handle_connection(stream, store).await {
                Ok(()) => tracing::info!(%peer_addr, "client disconnected"),
                Err(err) => tracing::warn!(%peer_addr, error = %err, "connection ended with an error"),
            }
        });
    }
}

pub async fn handle_connection(stream: TcpStream, store: Store) -> anyhow::Result<()> {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line).await?;
        if bytes_read == 0 {
            break;
        }

        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            continue;
        }

        let command = match parse_line(trimmed) {
            Ok(command) => command,
            Err(err) => {
                write_error(&mut writer, &err.0).await?;
                continue;
            }
        };

        if command == Command::Stop {
            write_ok(&mut writer).await?;
            break;
        }

        dispatch_command(&store, command, &mut writer).await?;
    }

    Ok(())
}

async fn dispatch_command(
    store: &Store,
    command: Command,
    writer: &mut (impl AsyncWriteExt + Unpin),
) -> anyhow::Result<()> {
    match command {
        Command::Get { key } => {
            let (value, status) = store.get(&key);
            match (status, value) {
                (StatusCode::Success, Some(value)) => write_value(writer, &encode_value(&value)).await,
                _ => write_error(writer, "key not found").await,
            }
        }
        Command::Set { key, value, timeout_nanos } => {
            let status = match timeout_nanos {
                Some(t) => store.set_with_timeout(key, Value::Bytes(value.into()), t),
                None => store.set(key, Value::Bytes(value.into())),
            };
            respond_status(writer, status).await
        }
        Command::Del { key } => respond_status(writer, store.delete(&key)).await,
        Command::Incr { key } => respond_status(writer, store.increase(&key)).await,
        Command::Ttl { key } => {
            let (deadline, status) = store.get_ttl(&key);
            match status {
                StatusCode::Success => write_value(writer, deadline.to_string().as_bytes()).await,
                _ => write_error(writer, "key not found").await,
            }
        }
        Command::Dump => {
            let (json, status) = store.dump_all_json();
            match status {
                StatusCode::Success => write_value(writer, json.as_bytes()).await,
                _ => write_error(writer, "could not marshal snapshot").await,
            }
        }
        Command::Stop => unreachable!("STOP is handled by the caller before dispatch"),
    }
}

async fn respond_status(
    writer: &mut (impl AsyncWriteExt + Unpin),
    status: StatusCode,
) -> anyhow::Result<()> {
    match status {
        StatusCode::Success => write_ok(writer).await,
        StatusCode::KeyNotFound => write_error(writer, "key not found").await,
        StatusCode::ValueNotNumberType => write_error(writer, "value not a number type").await,
        StatusCode::JsonMarshalErr => write_error(writer, "could not marshal value").await,
    }
}

async fn write_ok(writer: &mut (impl AsyncWriteExt + Unpin)) -> anyhow::Result<()> {
    writer.write_all(b"OK\n").await?;
    Ok(())
}

async fn write_value(writer: &mut (impl AsyncWriteExt + Unpin), payload: &[u8]) -> anyhow::Result<()> {
    writer.write_all(payload).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}

async fn write_error(writer: &mut (impl AsyncWriteExt + Unpin), message: &str) -> anyhow::Result<()> {
    writer.write_all(b"ERR ").await?;
    writer.write_all(message.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    Ok(())
}
