//! The public client facade.

use std::time::Duration;

use kash_common::{CacheError, CacheResult};
use tokio::io::AsyncWriteExt;

use crate::pool::ConnectionPool;
use crate::protocol::{encode_command, read_response, Response};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub addr: String,
    pub pool_size: usize,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            addr: "127.0.0.1:6380".to_string(),
            pool_size: 4,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// A pooled client for a `kash-server` instance.
///
/// Cheap to clone: every clone shares the same underlying connection pool.
#[derive(Clone)]
pub struct KashClient {
    pool: ConnectionPool,
}

impl KashClient {
    pub async fn connect(config: ClientConfig) -> CacheResult<Self> {
        Ok(KashClient { pool: ConnectionPool::new(config).await? })
    }

    async fn roundtrip(&self, request: Vec<u8>) -> CacheResult<Response> {
        let mut conn = self.pool.acquire().await?;
        conn.writer.write_all(&request).await.map_err(CacheError::Io)?;
        read_response(&mut conn.reader).await
    }

    pub async fn set(&self, key: &[u8], value: &[u8]) -> CacheResult<()> {
        self.expect_ok(encode_command("SET", &[key, value]), "SET").await
    }

    pub async fn set_with_timeout(&self, key: &[u8], value: &[u8], timeout_nanos: i64) -> CacheResult<()> {
        let timeout = timeout_nanos.to_string();
        self.expect_ok(encode_command("SET", &[key, value, timeout.as_bytes()]), "SET").await
    }

    pub async fn get(&self, key: &[u8]) -> CacheResult<Option<Vec<u8>>> {
        match self.roundtrip(encode_command("GET", &[key])).await? {
            Response::Value(bytes) => Ok(Some(bytes)),
            Response::Err(_) => Ok(None),
            Response::Ok => Err(CacheError::Protocol("unexpected OK response to GET".to_string())),
        }
    }

    pub async fn delete(&self, key: &[u8]) -> CacheResult<()> {
        self.expect_ok(encode_command("DEL", &[key]), "DEL").await
    }

    pub async fn increase(&self, key: &[u8]) -> CacheResult<()> {
        self.expect_ok(encode_command("INCR", &[key]), "INCR").await
    }

    pub async fn get_ttl(&self, key: &[u8]) -> CacheResult<Option<i64>> {
        match self.roundtrip(encode_command("TTL", &[key])).await? {
            Response::Value(bytes) => {
                let text = String::from_utf8_lossy(&bytes);
                text.parse::<i64>()
                    .map(Some)
                    .map_err(|_| CacheError::Protocol(format!("invalid ttl in response: {text}")))
            }
            Response::Err(_) => Ok(None),
            Response::Ok => Err(CacheError::Protocol("unexpected OK response to TTL".to_string())),
        }
    }

    pub async fn dump_all_json(&self) -> CacheResult<String> {
        match self.roundtrip(encode_command("DUMP", &[])).await? {
            Response::Value(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Response::Err(message) => Err(CacheError::Server(message)),
            Response::Ok => Err(CacheError::Protocol("unexpected OK response to DUMP".to_string())),
        }
    }

    pub async fn stop(&self) -> CacheResult<()> {
        self.expect_ok(encode_command("STOP", &[]), "STOP").await
    }

    async fn expect_ok(&self, request: Vec<u8>, command: &str) -> CacheResult<()> {
        match self.roundtrip(request).await? {
            Response::Ok => Ok(()),
            Response::Err(message) => Err(CacheError::Server(message)),
            Response::Value(_) => Err(CacheError::Protocol(format!("unexpected value response to {command}"))),
        }
    }
}
