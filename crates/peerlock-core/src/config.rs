//! Node configuration
//!
//! Environment-first: every knob has a `PEERLOCK_*` variable, and the binary
//! may override any of them with flags. A missing identity or an empty peer
//! list is the only fatal error.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::identity::{NodeId, NodeIdentity};
use crate::retry::BackoffPolicy;

/// Default per-peer response wait bound
pub const DEFAULT_ROUND_TIMEOUT: Duration = Duration::from_secs(2);

/// Default delay range between retry rounds, in milliseconds
pub const DEFAULT_BACKOFF_MS: &str = "200..1500";

/// Default idle pause between resource-use cycles, in milliseconds
pub const DEFAULT_IDLE_MS: &str = "8000..12000";

/// Default simulated resource-use duration, in milliseconds
pub const DEFAULT_USE_MS: &str = "1000..3000";

/// Complete configuration for one node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// This node's identity; the address is the listen endpoint
    pub identity: NodeIdentity,
    /// All other participants, static for the run
    pub peers: Vec<NodeIdentity>,
    /// Per-peer response wait bound for one broadcast round
    pub round_timeout: Duration,
    /// Delay range between retry rounds
    pub retry_backoff: BackoffPolicy,
    /// Pause range between resource-use cycles
    pub idle_delay: BackoffPolicy,
    /// Simulated resource-use duration range
    pub use_delay: BackoffPolicy,
    /// Append-only access log path, if event persistence is wanted
    pub access_log: Option<PathBuf>,
}

impl NodeConfig {
    /// Load configuration from `PEERLOCK_*` environment variables
    ///
    /// Recognized variables:
    /// - `PEERLOCK_NODE_ID`: unique numeric id (required)
    /// - `PEERLOCK_LISTEN`: this node's `host:port` (required)
    /// - `PEERLOCK_PEERS`: comma list of `id=host:port` (required, non-empty)
    /// - `PEERLOCK_ROUND_TIMEOUT_MS`: per-peer wait bound
    /// - `PEERLOCK_BACKOFF_MS`, `PEERLOCK_IDLE_MS`, `PEERLOCK_USE_MS`:
    ///   `min..max` millisecond ranges
    /// - `PEERLOCK_ACCESS_LOG`: JSONL event log path
    pub fn from_env() -> Result<Self> {
        let id = require_var("PEERLOCK_NODE_ID")?;
        let listen = require_var("PEERLOCK_LISTEN")?;
        let peers = require_var("PEERLOCK_PEERS")?;

        let round_timeout = match std::env::var("PEERLOCK_ROUND_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(ms.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!("invalid PEERLOCK_ROUND_TIMEOUT_MS '{ms}'"))
            })?),
            Err(_) => DEFAULT_ROUND_TIMEOUT,
        };

        Self::build(
            &id,
            &listen,
            &peers,
            round_timeout,
            &var_or("PEERLOCK_BACKOFF_MS", DEFAULT_BACKOFF_MS),
            &var_or("PEERLOCK_IDLE_MS", DEFAULT_IDLE_MS),
            &var_or("PEERLOCK_USE_MS", DEFAULT_USE_MS),
            std::env::var("PEERLOCK_ACCESS_LOG").ok().map(PathBuf::from),
        )
    }

    /// Assemble and validate a configuration from raw string parts
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        id: &str,
        listen: &str,
        peers: &str,
        round_timeout: Duration,
        backoff_ms: &str,
        idle_ms: &str,
        use_ms: &str,
        access_log: Option<PathBuf>,
    ) -> Result<Self> {
        let id = NodeId::parse(id)?;
        let identity = NodeIdentity::new(id, listen)?;
        let peers = parse_peers(peers, id)?;

        Ok(Self {
            identity,
            peers,
            round_timeout,
            retry_backoff: BackoffPolicy::parse_millis(backoff_ms)?,
            idle_delay: BackoffPolicy::parse_millis(idle_ms)?,
            use_delay: BackoffPolicy::parse_millis(use_ms)?,
            access_log,
        })
    }
}

fn require_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{name} is not set")))
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Parse a `id=host:port` comma list into peer identities
fn parse_peers(s: &str, own_id: NodeId) -> Result<Vec<NodeIdentity>> {
    let mut peers = Vec::new();
    let mut seen = HashSet::new();

    for entry in s.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        let (id, address) = entry
            .split_once('=')
            .ok_or_else(|| Error::Config(format!("expected 'id=host:port', got '{entry}'")))?;
        let id = NodeId::parse(id)?;
        if id == own_id {
            // The peer list may include ourselves for convenience; skip it.
            continue;
        }
        if !seen.insert(id) {
            return Err(Error::Config(format!("duplicate peer id {id}")));
        }
        peers.push(NodeIdentity::new(id, address.trim())?);
    }

    if peers.is_empty() {
        return Err(Error::Config("peer list is empty".to_string()));
    }
    Ok(peers)
}
