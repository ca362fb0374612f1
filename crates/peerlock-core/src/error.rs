//! Error types for peerlock-core

use thiserror::Error;

use crate::identity::NodeId;

/// Core error type for peerlock operations
#[derive(Debug, Error)]
pub enum Error {
    /// A peer could not be reached within the round timeout
    ///
    /// Folded into the round decision as a `denied`; never fatal.
    #[error("peer {peer} unreachable: {reason}")]
    PeerUnreachable { peer: NodeId, reason: String },

    /// A request carried a timestamp older than the last granted one
    #[error("stale request from node {requester}")]
    StaleRequest { requester: NodeId },

    /// A message arrived missing required fields
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A state transition was attempted from the wrong state
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// The caller's deadline elapsed before access was obtained
    #[error("timed out waiting for access")]
    Timeout,

    /// Configuration errors, fatal at startup only
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors, e.g. writing the access log
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for peerlock-core operations
pub type Result<T> = std::result::Result<T, Error>;
