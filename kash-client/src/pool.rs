//! A small connection pool: idle connections are handed out on `acquire`
//! and returned on drop rather than closed, the same RAII shape as the
//! pool this is modeled on.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use kash_common::{CacheError, CacheResult};
use tokio::io::BufReader;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::client::ClientConfig;

pub(crate) struct Connection {
    pub reader: BufReader<OwnedReadHalf>,
    pub writer: OwnedWriteHalf,
}

impl Connection {
    async fn connect(addr: &str) -> CacheResult<Self> {
        let stream = TcpStream::connect(addr).await.map_err(CacheError::Io)?;
        let (read_half, writer) = stream.into_split();
        Ok(Connection { reader: BufReader::new(read_half), writer })
    }
}

struct PoolState {
    addr: String,
    idle: Mutex<VecDeque<Connection>>,
    permits: Arc<Semaphore>,
}

/// A bounded pool of TCP connections to one `kash-server` address.
///
/// Cheap to clone: every clone shares the same idle queue and semaphore.
#[derive(Clone)]
pub struct ConnectionPool {
    state: Arc<PoolState>,
}

impl ConnectionPool {
    pub async fn new(config: ClientConfig) -> CacheResult<Self> {
        Ok(ConnectionPool {
            state: Arc::new(PoolState {
                addr: config.addr,
                idle: Mutex::new(VecDeque::new()),
                permits: Arc::new(Semaphore::new(config.pool_size)),
            }),
        })
    }

    /// Checks out a connection, blocking until one of `pool_size` slots is
    /// free. Reuses an idle connection if one is available, otherwise
    /// dials a new one.
    pub async fn acquire(&self) -> CacheResult<PooledConnection> {
        let permit = Arc::clone(&self.state.permits)
            .acquire_owned()
            .await
            .map_err(|_| CacheError::Protocol("connection pool closed".to_string()))?;

        let idle_connection = {
            let mut idle = self.state.idle.lock().expect("pool mutex poisoned");
            idle.pop_front()
        };
        let connection = match idle_connection {
            Some(connection) => connection,
            None => Connection::connect(&self.state.addr).await?,
        };

        Ok(PooledConnection { connection: Some(connection), state: Arc::clone(&self.state), _permit: permit })
    }
}

/// A checked-out connection. Returns itself to the pool's idle queue when
/// dropped instead of closing the socket.
pub struct PooledConnection {
    connection: Option<Connection>,
    state: Arc<PoolState>,
    _permit: OwnedSemaphorePermit,
}

impl std::ops::Deref for PooledConnection {
    type Target = Connection;
    fn deref(&self) -> &Connection {
        self.connection.as_ref().expect("connection present until drop")
    }
}

impl std::ops::DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.connection.as_mut().expect("connection present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            let mut idle = self.state.idle.lock().expect("pool mutex poisoned");
            idle.push_back(connection);
        }
    }
}
