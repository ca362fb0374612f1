//! Run one peerlock node

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use peerlock::{build_node, server};
use peerlock_core::config::{
    DEFAULT_BACKOFF_MS, DEFAULT_IDLE_MS, DEFAULT_ROUND_TIMEOUT, DEFAULT_USE_MS,
};
use peerlock_core::NodeConfig;

#[derive(Parser, Debug)]
#[command(name = "peerlock")]
#[command(about = "Run one node of a decentralized mutual-exclusion cluster")]
struct Args {
    /// Unique numeric node id (falls back to PEERLOCK_NODE_ID)
    #[arg(long)]
    node_id: Option<String>,

    /// Listen address, host:port (falls back to PEERLOCK_LISTEN)
    #[arg(long)]
    listen: Option<String>,

    /// Comma list of peers as id=host:port (falls back to PEERLOCK_PEERS)
    #[arg(long)]
    peers: Option<String>,

    /// Per-peer response wait bound in milliseconds
    #[arg(long)]
    round_timeout_ms: Option<u64>,

    /// Retry backoff range in milliseconds, min..max
    #[arg(long)]
    backoff_ms: Option<String>,

    /// Idle pause range between cycles in milliseconds, min..max
    #[arg(long)]
    idle_ms: Option<String>,

    /// Simulated resource-use range in milliseconds, min..max
    #[arg(long)]
    use_ms: Option<String>,

    /// Append-only JSONL access log path
    #[arg(long)]
    access_log: Option<PathBuf>,
}

fn flag_or_env(flag: Option<String>, var: &str) -> Option<String> {
    flag.or_else(|| std::env::var(var).ok())
}

fn load_config(args: Args) -> anyhow::Result<NodeConfig> {
    let node_id = flag_or_env(args.node_id, "PEERLOCK_NODE_ID")
        .context("node id missing: pass --node-id or set PEERLOCK_NODE_ID")?;
    let listen = flag_or_env(args.listen, "PEERLOCK_LISTEN")
        .context("listen address missing: pass --listen or set PEERLOCK_LISTEN")?;
    let peers = flag_or_env(args.peers, "PEERLOCK_PEERS")
        .context("peer list missing: pass --peers or set PEERLOCK_PEERS")?;

    let round_timeout = match args.round_timeout_ms {
        Some(ms) => Duration::from_millis(ms),
        None => match std::env::var("PEERLOCK_ROUND_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(
                ms.trim()
                    .parse()
                    .with_context(|| format!("invalid PEERLOCK_ROUND_TIMEOUT_MS '{ms}'"))?,
            ),
            Err(_) => DEFAULT_ROUND_TIMEOUT,
        },
    };

    let backoff = flag_or_env(args.backoff_ms, "PEERLOCK_BACKOFF_MS")
        .unwrap_or_else(|| DEFAULT_BACKOFF_MS.to_string());
    let idle = flag_or_env(args.idle_ms, "PEERLOCK_IDLE_MS")
        .unwrap_or_else(|| DEFAULT_IDLE_MS.to_string());
    let use_range = flag_or_env(args.use_ms, "PEERLOCK_USE_MS")
        .unwrap_or_else(|| DEFAULT_USE_MS.to_string());
    let access_log = args
        .access_log
        .or_else(|| std::env::var("PEERLOCK_ACCESS_LOG").ok().map(PathBuf::from));

    NodeConfig::build(
        &node_id,
        &listen,
        &peers,
        round_timeout,
        &backoff,
        &idle,
        &use_range,
        access_log,
    )
    .context("invalid configuration")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config(Args::parse())?;
    let (node, agent) = build_node(&config)?;

    let listener = tokio::net::TcpListener::bind(&config.identity.address)
        .await
        .with_context(|| format!("cannot bind {}", config.identity.address))?;
    info!(node = %config.identity, peers = config.peers.len(), "peerlock node up");

    let router = server::router(Arc::clone(&node));
    let serve = axum::serve(listener, router).into_future();

    tokio::select! {
        result = serve => {
            result.context("http server failed")?;
        }
        result = agent.run() => {
            result.context("agent loop failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
        }
    }
    Ok(())
}
