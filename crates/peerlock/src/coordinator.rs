//! Request and release coordination
//!
//! Drives this node's own request cycle: broadcast a fresh-timestamped
//! request to every peer, require unanimous `ok`, otherwise back off and try
//! again. A releasing peer can cut the wait short by handing the resource
//! over directly. Release pops the local queue head and notifies it outside
//! the state lock.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::FutureExt;
use tracing::{debug, warn};

use peerlock_core::{
    AccessEventKind, AccessRequest, AccessStatus, BackoffPolicy, Error, GrantNotice, RequestClock,
    Result,
};

use crate::node::Node;
use crate::transport::Transport;

/// Drives one node's request and release cycle
pub struct Coordinator {
    node: Arc<Node>,
    transport: Arc<dyn Transport>,
    clock: Mutex<RequestClock>,
    round_timeout: Duration,
    backoff: BackoffPolicy,
}

impl Coordinator {
    /// Create a coordinator for the given node
    #[must_use]
    pub fn new(
        node: Arc<Node>,
        transport: Arc<dyn Transport>,
        round_timeout: Duration,
        backoff: BackoffPolicy,
    ) -> Self {
        let clock = Mutex::new(RequestClock::new(node.identity().id));
        Self {
            node,
            transport,
            clock,
            round_timeout,
            backoff,
        }
    }

    /// Obtain exclusive access to the resource
    ///
    /// Blocks until every peer answers `ok` in one round, or until a peer
    /// hands the resource over directly. Unreachable peers count as `denied`
    /// for their round, so a crashed peer causes retries, never a hang on one
    /// call. With a deadline the call fails with [`Error::Timeout`] instead
    /// of retrying forever.
    pub async fn request_access(&self, deadline: Option<Duration>) -> Result<()> {
        let started = Instant::now();

        // A stale hand-off permit from an earlier cycle must not be
        // mistaken for a fresh grant.
        let _ = self.node.handoff().notified().now_or_never();

        self.node.record(AccessEventKind::Requested);

        loop {
            if let Some(limit) = deadline {
                if started.elapsed() >= limit {
                    return Err(Error::Timeout);
                }
            }

            let timestamp = {
                let mut clock = self.clock.lock().unwrap_or_else(PoisonError::into_inner);
                clock.next()
            };
            {
                self.node.state().begin_request(timestamp)?;
            }

            let request = AccessRequest {
                node_id: self.node.identity().id,
                timestamp,
            };
            let replies = join_all(self.node.peers().iter().map(|peer| {
                let request = request.clone();
                async move {
                    match self.transport.request_access(peer, &request).await {
                        Ok(status) => status,
                        Err(error) => {
                            warn!(peer = %peer.id, %error, "peer unreachable, counting round as denied");
                            AccessStatus::Denied
                        }
                    }
                }
            }))
            .await;

            if replies.iter().all(|status| *status == AccessStatus::Ok) {
                {
                    self.node.state().acquire()?;
                }
                self.broadcast_grant_notices();
                return Ok(());
            }

            debug!(
                node = %self.node.identity().id,
                ?replies,
                "round failed, backing off"
            );
            {
                self.node.state().abandon_request()?;
            }

            let mut wait = self.backoff.delay();
            if let Some(limit) = deadline {
                let remaining = limit.saturating_sub(started.elapsed());
                wait = wait.min(remaining);
            }

            tokio::select! {
                () = self.node.handoff().notified() => {
                    // A releasing peer popped us off its queue. Promote
                    // directly, unless we just told some peer `ok` and its
                    // round may still be in flight.
                    if self.node.handoff_guard_clear(self.round_timeout) {
                        let mut state = self.node.state();
                        state.begin_request(timestamp)?;
                        state.acquire()?;
                        drop(state);
                        self.broadcast_grant_notices();
                        return Ok(());
                    }
                    debug!(node = %self.node.identity().id, "declining hand-off, re-broadcasting");
                }
                () = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// Give the resource back
    ///
    /// Clears held status and hands off to the queue head, if any. The
    /// notification goes out after the state lock is dropped so a slow waiter
    /// cannot stall inbound handlers.
    pub async fn release(&self) -> Result<()> {
        let handoff = { self.node.state().release()? };
        self.node.record(AccessEventKind::Released);

        if let Some(record) = handoff {
            let notice = GrantNotice {
                node_id: record.requester.id,
            };
            if let Err(error) = self.transport.notify_granted(&record.requester, &notice).await {
                // The waiter keeps its own retry loop; losing the hand-off
                // costs it a round, not liveness.
                warn!(waiter = %record.requester.id, %error, "hand-off notice failed");
            }
        }
        Ok(())
    }

    /// Best-effort notice to all peers that this node now holds the resource
    ///
    /// Informational only; correctness derives from the admission rule.
    fn broadcast_grant_notices(&self) {
        let notice = GrantNotice {
            node_id: self.node.identity().id,
        };
        for peer in self.node.peers() {
            let transport = Arc::clone(&self.transport);
            let peer = peer.clone();
            tokio::spawn(async move {
                if let Err(error) = transport.notify_granted(&peer, &notice).await {
                    debug!(peer = %peer.id, %error, "grant notice not delivered");
                }
            });
        }
    }
}
