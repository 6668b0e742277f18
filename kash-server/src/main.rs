use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use kash_core::EvictionPolicy;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use kash_server::config::Config;
use kash_server::server;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EvictionPolicyArg {
    Random,
    Lru,
}

impl From<EvictionPolicyArg> for EvictionPolicy {
    fn from(arg: EvictionPolicyArg) -> Self {
        match arg {
            EvictionPolicyArg::Random => EvictionPolicy::Random,
            EvictionPolicyArg::Lru => EvictionPolicy::LRU,
        }
    }
}

/// A sharded, TTL- and LRU-evicting in-memory cache server.
#[derive(Debug, Parser)]
#[command(name = "kash-server", version, about)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:6380")]
    bind: SocketAddr,

    /// Maximum number of live entries before eviction kicks in. 0 = unbounded.
    #[arg(long, default_value_t = 0)]
    capacity: usize,

    /// Which entries eviction considers and how it picks among them.
    #[arg(long, value_enum, default_value_t = EvictionPolicyArg::Random)]
    eviction_policy: EvictionPolicyArg,

    /// Default entry lifetime in seconds when SET is called without an
    /// explicit timeout. 0 = never expires.
    #[arg(long, default_value_t = 0)]
    default_timeout_secs: u64,

    /// Advisory memory budget, e.g. "64MB". Not enforced by eviction.
    #[arg(long)]
    max_memory: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config {
        bind_addr: cli.bind,
        capacity: cli.capacity,
        eviction_policy: cli.eviction_policy.into(),
        default_timeout: Duration::from_secs(cli.default_timeout_secs),
        max_memory: cli.max_memory,
    };

    let store = config.build_store()?;
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "kash-server listening");

    server::run(listener, store).await
}
