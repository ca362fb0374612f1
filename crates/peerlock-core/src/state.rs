//! The per-node mutex state machine

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::error::{Error, Result};
use crate::queue::{RequestRecord, WaitQueue};

/// Where this node stands with respect to the shared resource
///
/// Exactly one variant holds at any time; transitions are driven only by the
/// request and release coordinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MutexState {
    /// Not interested in the resource
    Idle,
    /// Mid-request, with the timestamp of the outstanding broadcast
    Requesting(Timestamp),
    /// Holding the resource
    Held,
}

impl MutexState {
    /// Check if this node currently holds the resource
    #[must_use]
    pub const fn is_held(self) -> bool {
        matches!(self, Self::Held)
    }

    /// Get the outstanding request timestamp, if mid-request
    #[must_use]
    pub const fn requesting_since(self) -> Option<Timestamp> {
        match self {
            Self::Requesting(ts) => Some(ts),
            Self::Idle | Self::Held => None,
        }
    }
}

impl Default for MutexState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for MutexState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Requesting(_) => write!(f, "requesting"),
            Self::Held => write!(f, "held"),
        }
    }
}

/// The complete lock-guarded state block of one node
///
/// Owned exclusively by its node; all mutation happens under that node's
/// internal lock, and never across a network call.
#[derive(Debug, Default)]
pub struct NodeState {
    state: MutexState,
    wait_queue: WaitQueue,
    last_granted: Option<Timestamp>,
}

impl NodeState {
    /// Create a fresh idle state block
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current state tag
    #[must_use]
    pub const fn state(&self) -> MutexState {
        self.state
    }

    /// Get the most recently granted timestamp at this node
    #[must_use]
    pub const fn last_granted(&self) -> Option<Timestamp> {
        self.last_granted
    }

    /// Get the waiting queue
    #[must_use]
    pub const fn wait_queue(&self) -> &WaitQueue {
        &self.wait_queue
    }

    /// Mutable access to the waiting queue, for the admission decision
    pub fn wait_queue_mut(&mut self) -> &mut WaitQueue {
        &mut self.wait_queue
    }

    /// Start a request round: `Idle -> Requesting`
    ///
    /// Also called between retry rounds to swap in the fresh timestamp.
    pub fn begin_request(&mut self, timestamp: Timestamp) -> Result<()> {
        match self.state {
            MutexState::Idle | MutexState::Requesting(_) => {
                self.state = MutexState::Requesting(timestamp);
                Ok(())
            }
            MutexState::Held => Err(Error::InvalidTransition(
                "cannot request while holding the resource".to_string(),
            )),
        }
    }

    /// Abandon a failed round: `Requesting -> Idle`
    ///
    /// No partial commitment survives an abandoned round; any `queued`
    /// registration this node holds at its peers stays valid and is redeemed
    /// by their hand-off.
    pub fn abandon_request(&mut self) -> Result<()> {
        match self.state {
            MutexState::Requesting(_) => {
                self.state = MutexState::Idle;
                Ok(())
            }
            MutexState::Idle | MutexState::Held => Err(Error::InvalidTransition(format!(
                "cannot abandon a request from state '{}'",
                self.state
            ))),
        }
    }

    /// Take the resource: `Requesting -> Held`
    pub fn acquire(&mut self) -> Result<()> {
        match self.state {
            MutexState::Requesting(_) => {
                self.state = MutexState::Held;
                Ok(())
            }
            MutexState::Idle | MutexState::Held => Err(Error::InvalidTransition(format!(
                "cannot acquire from state '{}'",
                self.state
            ))),
        }
    }

    /// Give the resource back: `Held -> Idle`
    ///
    /// Returns the next waiter to hand off to, if any. The caller must send
    /// the hand-off notification outside the lock. `last_granted` is left
    /// untouched so its monotonicity survives releases.
    pub fn release(&mut self) -> Result<Option<RequestRecord>> {
        match self.state {
            MutexState::Held => {
                self.state = MutexState::Idle;
                Ok(self.wait_queue.pop_front())
            }
            MutexState::Idle | MutexState::Requesting(_) => Err(Error::InvalidTransition(
                format!("cannot release from state '{}'", self.state),
            )),
        }
    }

    /// Record a granted timestamp; keeps `last_granted` non-decreasing
    pub fn record_grant(&mut self, timestamp: Timestamp) {
        if self.last_granted.map_or(true, |last| timestamp >= last) {
            self.last_granted = Some(timestamp);
        }
    }
}
