//! The shared per-node handle
//!
//! Everything both roles touch lives here: the lock-guarded state block the
//! inbound handlers and the coordinator mutate, the hand-off wakeup, and the
//! event sink. The state lock is never held across a network call.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::Notify;

use peerlock_core::{
    admit, AccessEvent, AccessEventKind, AccessRequest, AccessStatus, Error, GrantNotice, NodeId,
    NodeIdentity, NodeState, Result,
};

use crate::audit_log::AccessLog;

/// One participant's shared state
#[derive(Debug)]
pub struct Node {
    identity: NodeIdentity,
    peers: Vec<NodeIdentity>,
    state: Mutex<NodeState>,
    handoff: Notify,
    observed_holder: Mutex<Option<NodeId>>,
    last_ok_granted: Mutex<Option<Instant>>,
    log: AccessLog,
}

impl Node {
    /// Create a node handle
    #[must_use]
    pub fn new(identity: NodeIdentity, peers: Vec<NodeIdentity>, log: AccessLog) -> Self {
        Self {
            identity,
            peers,
            state: Mutex::new(NodeState::new()),
            handoff: Notify::new(),
            observed_holder: Mutex::new(None),
            last_ok_granted: Mutex::new(None),
            log,
        }
    }

    /// This node's identity
    #[must_use]
    pub const fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    /// The other participants
    #[must_use]
    pub fn peers(&self) -> &[NodeIdentity] {
        &self.peers
    }

    /// Lock the state block
    pub(crate) fn state(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The hand-off wakeup shared with the coordinator
    pub(crate) const fn handoff(&self) -> &Notify {
        &self.handoff
    }

    /// Record an event about this node itself
    pub(crate) fn record(&self, kind: AccessEventKind) {
        self.log.record(&AccessEvent::new(self.identity.id, kind));
    }

    /// Answer a peer's request for access
    ///
    /// The admission decision runs under the state lock; unknown requesters
    /// are rejected at the boundary without touching state.
    pub fn handle_access(&self, request: &AccessRequest) -> Result<AccessStatus> {
        let requester = self
            .peers
            .iter()
            .find(|p| p.id == request.node_id)
            .cloned()
            .ok_or_else(|| {
                Error::MalformedMessage(format!("unknown requester {}", request.node_id))
            })?;

        let status = {
            let mut state = self.state();
            admit(&mut state, requester, request.timestamp)
        };

        if status == AccessStatus::Ok {
            *self
                .last_ok_granted
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
        }

        let kind = match status {
            AccessStatus::Ok => AccessEventKind::Granted,
            AccessStatus::Queued => AccessEventKind::Queued,
            AccessStatus::Denied => AccessEventKind::Denied,
        };
        self.log
            .record(&AccessEvent::new(self.identity.id, kind).with_peer(request.node_id));

        Ok(status)
    }

    /// Take note of a grant notice
    ///
    /// A notice naming this node wakes the coordinator's hand-off wait; a
    /// notice naming a peer is informational bookkeeping. Duplicates are
    /// no-ops either way.
    pub fn receive_grant(&self, notice: &GrantNotice) {
        if notice.node_id == self.identity.id {
            self.handoff.notify_one();
        } else {
            *self
                .observed_holder
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(notice.node_id);
        }
    }

    /// The peer last announced as holding the resource, if any
    ///
    /// Optimistic bookkeeping only; admission decisions never consult it.
    #[must_use]
    pub fn observed_holder(&self) -> Option<NodeId> {
        *self
            .observed_holder
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a hand-off may be taken directly
    ///
    /// A node that answered `ok` to some peer within the last round window
    /// must assume that peer's round may still succeed, so it declines the
    /// hand-off and re-broadcasts instead of promoting straight to held.
    pub(crate) fn handoff_guard_clear(&self, window: Duration) -> bool {
        self.last_ok_granted
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .map_or(true, |granted| granted.elapsed() >= window)
    }
}
