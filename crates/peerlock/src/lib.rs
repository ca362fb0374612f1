//! Peerlock - one node of a decentralized mutual-exclusion cluster
//!
//! A fixed set of peers coordinates exclusive access to a shared resource
//! with no central arbiter. Each node runs two concurrent roles: an inbound
//! HTTP server answering peer requests from its own state alone, and an
//! outbound agent loop driving its own request/use/release cycle.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod audit_log;
pub mod coordinator;
pub mod node;
pub mod server;
pub mod transport;

use std::sync::Arc;

use peerlock_core::{NodeConfig, Result};

pub use agent::NodeAgent;
pub use audit_log::AccessLog;
pub use coordinator::Coordinator;
pub use node::Node;
pub use transport::{HttpTransport, Transport};

/// Assemble a runnable node from its configuration
///
/// Returns the shared node handle (for the HTTP router) and the agent that
/// drives its request cycle.
pub fn build_node(config: &NodeConfig) -> Result<(Arc<Node>, NodeAgent)> {
    let log = AccessLog::open(config.access_log.as_deref())?;
    let node = Arc::new(Node::new(
        config.identity.clone(),
        config.peers.clone(),
        log,
    ));
    let transport = Arc::new(HttpTransport::new(config.round_timeout)?);
    let coordinator = Coordinator::new(
        Arc::clone(&node),
        transport,
        config.round_timeout,
        config.retry_backoff,
    );
    let agent = NodeAgent::new(
        Arc::clone(&node),
        coordinator,
        config.idle_delay,
        config.use_delay,
    );
    Ok((node, agent))
}
