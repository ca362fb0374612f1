//! Wire message vocabulary
//!
//! JSON bodies exchanged between peers. Payloads missing required fields are
//! rejected at the transport boundary and never reach the state block.

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::identity::NodeId;

/// A peer asks for permission to use the resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Requesting node
    pub node_id: NodeId,
    /// Fresh timestamp for this round
    pub timestamp: Timestamp,
}

/// The admission decision returned for an [`AccessRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessStatus {
    /// This peer does not object
    Ok,
    /// Retry later
    Denied,
    /// Retry later; the requester is registered for a direct hand-off
    Queued,
}

impl std::fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Denied => write!(f, "denied"),
            Self::Queued => write!(f, "queued"),
        }
    }
}

/// Response body for an [`AccessRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessReply {
    /// The admission decision
    pub status: AccessStatus,
}

impl AccessReply {
    /// Wrap a status in a reply body
    #[must_use]
    pub const fn new(status: AccessStatus) -> Self {
        Self { status }
    }
}

/// Fire-and-forget notice that a node now holds the resource
///
/// Sent best-effort after a successful round, and sent directly to the queue
/// head on release (the hand-off). Idempotent: duplicates are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantNotice {
    /// The node that may now proceed
    pub node_id: NodeId,
}

/// Notice that a node finished with the resource
///
/// Part of the message vocabulary for the centralized-arbiter variant only;
/// the peer-to-peer protocol releases through direct hand-off instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseNotice {
    /// The node giving the resource back
    pub node_id: NodeId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_snake_case() {
        #[allow(clippy::unwrap_used)]
        let json = serde_json::to_string(&AccessReply::new(AccessStatus::Queued)).unwrap();
        assert_eq!(json, r#"{"status":"queued"}"#);
    }

    #[test]
    fn request_round_trips_through_json() {
        use crate::identity::NodeId;

        let request = AccessRequest {
            node_id: NodeId::new(3),
            timestamp: Timestamp::new(1234, NodeId::new(3)),
        };
        #[allow(clippy::unwrap_used)]
        let parsed: AccessRequest =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn missing_fields_are_rejected() {
        let result = serde_json::from_str::<AccessRequest>(r#"{"node_id":3}"#);
        assert!(result.is_err());
    }
}
