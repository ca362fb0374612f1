//! Node identity types

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unique node identifier
///
/// Doubles as the deterministic tie-break key when two requests carry the
/// same wall-clock time: the lower id wins at every peer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NodeId(u64);

impl NodeId {
    /// Create a new node ID
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Parse a node ID from a string
    pub fn parse(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::Config(format!("invalid node id '{s}'")))
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant in the protocol
///
/// Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// Unique identifier
    pub id: NodeId,
    /// Reachable endpoint, `host:port`
    pub address: String,
}

impl NodeIdentity {
    /// Create a new node identity
    pub fn new(id: NodeId, address: impl Into<String>) -> Result<Self> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(Error::Config(format!("node {id} has an empty address")));
        }
        Ok(Self { id, address })
    }
}

impl std::fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.address)
    }
}
