//! The inbound admission decision
//!
//! A purely local test: each node answers peer requests from its own state
//! block alone and never consults other peers on another node's behalf.

use crate::clock::Timestamp;
use crate::identity::NodeIdentity;
use crate::message::AccessStatus;
use crate::queue::RequestRecord;
use crate::state::{MutexState, NodeState};

/// Decide whether a peer's request may proceed
///
/// Evaluated in order, under the node's lock:
///
/// 1. Holding the resource: deny.
/// 2. Mid-request ourselves: an incoming request that orders strictly before
///    our own outstanding one is queued for a later hand-off; a later one is
///    denied and must retry once our request resolves.
/// 3. A timestamp below the last granted one is stale: deny.
/// 4. Otherwise grant, and advance the granted watermark.
///
/// `denied` and `queued` both mean "retry" to the requester; `queued`
/// additionally registers it for a direct hand-off on release.
pub fn admit(state: &mut NodeState, requester: NodeIdentity, timestamp: Timestamp) -> AccessStatus {
    match state.state() {
        MutexState::Held => AccessStatus::Denied,
        MutexState::Requesting(own) => {
            if timestamp < own {
                state
                    .wait_queue_mut()
                    .push(RequestRecord::new(requester, timestamp));
                AccessStatus::Queued
            } else {
                AccessStatus::Denied
            }
        }
        MutexState::Idle => {
            if state.last_granted().is_some_and(|last| timestamp < last) {
                AccessStatus::Denied
            } else {
                state.record_grant(timestamp);
                AccessStatus::Ok
            }
        }
    }
}
