//! The node's own request cycle
//!
//! Idle for a random interval, obtain the resource, simulate using it for a
//! bounded duration, release, repeat. The agent is the only caller of the
//! coordinator, so `Idle -> Requesting -> Held -> Idle` is driven from one
//! place.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use peerlock_core::{AccessEventKind, BackoffPolicy, Result};

use crate::coordinator::Coordinator;
use crate::node::Node;

/// One participant's lifecycle loop
pub struct NodeAgent {
    node: Arc<Node>,
    coordinator: Coordinator,
    idle_delay: BackoffPolicy,
    use_delay: BackoffPolicy,
}

impl NodeAgent {
    /// Create an agent
    #[must_use]
    pub const fn new(
        node: Arc<Node>,
        coordinator: Coordinator,
        idle_delay: BackoffPolicy,
        use_delay: BackoffPolicy,
    ) -> Self {
        Self {
            node,
            coordinator,
            idle_delay,
            use_delay,
        }
    }

    /// Run one idle / request / use / release cycle
    pub async fn cycle(&self) -> Result<()> {
        tokio::time::sleep(self.idle_delay.delay()).await;

        self.coordinator.request_access(None).await?;
        self.node.record(AccessEventKind::Used);
        info!(node = %self.node.identity().id, "using the shared resource");

        tokio::time::sleep(self.use_delay.delay()).await;

        self.coordinator.release().await?;
        info!(node = %self.node.identity().id, "released the shared resource");
        Ok(())
    }

    /// Run a fixed number of cycles
    pub async fn run_cycles(&self, cycles: usize) -> Result<()> {
        for _ in 0..cycles {
            self.cycle().await?;
        }
        Ok(())
    }

    /// Run until the process is stopped
    pub async fn run(&self) -> Result<()> {
        loop {
            self.cycle().await?;
        }
    }

    /// Obtain the resource once with a deadline, without the cycle pauses
    ///
    /// For callers that need a definite failure when peers are unreachable.
    pub async fn acquire_with_deadline(&self, deadline: Duration) -> Result<()> {
        self.coordinator.request_access(Some(deadline)).await?;
        self.node.record(AccessEventKind::Used);
        Ok(())
    }

    /// Release after [`Self::acquire_with_deadline`]
    pub async fn release(&self) -> Result<()> {
        self.coordinator.release().await
    }
}
