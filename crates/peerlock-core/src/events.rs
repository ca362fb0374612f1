//! Access-log event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::NodeId;

/// Event kinds recorded in the access log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessEventKind {
    /// A node started a request round
    Requested,
    /// This node answered a peer's request with ok
    Granted,
    /// This node deferred a peer's request into its queue
    Queued,
    /// This node denied a peer's request
    Denied,
    /// A node began using the resource
    Used,
    /// A node finished using the resource
    Released,
}

impl std::fmt::Display for AccessEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = serde_json::to_string(self).map_err(|_| std::fmt::Error)?;
        write!(f, "{}", s.trim_matches('"'))
    }
}

/// One line of the append-only access log
///
/// The merged logs of all nodes are the externally auditable record of the
/// protocol run; they are never read back for recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    /// Acting node
    pub node_id: NodeId,
    /// What happened
    pub kind: AccessEventKind,
    /// When it happened, by the recording node's clock
    pub at: DateTime<Utc>,
    /// The peer the event concerns, when not the acting node itself
    pub peer_id: Option<NodeId>,
}

impl AccessEvent {
    /// Create a new event stamped with the current time
    #[must_use]
    pub fn new(node_id: NodeId, kind: AccessEventKind) -> Self {
        Self {
            node_id,
            kind,
            at: Utc::now(),
            peer_id: None,
        }
    }

    /// Set the peer this event concerns
    #[must_use]
    pub const fn with_peer(mut self, peer_id: NodeId) -> Self {
        self.peer_id = Some(peer_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_snake_case() {
        assert_eq!(AccessEventKind::Released.to_string(), "released");
        assert_eq!(AccessEventKind::Queued.to_string(), "queued");
    }

    #[test]
    fn event_round_trips_through_json() {
        let event = AccessEvent::new(NodeId::new(1), AccessEventKind::Granted)
            .with_peer(NodeId::new(2));
        #[allow(clippy::unwrap_used)]
        let parsed: AccessEvent =
            serde_json::from_str(&serde_json::to_string(&event).unwrap()).unwrap();
        assert_eq!(parsed, event);
    }
}
