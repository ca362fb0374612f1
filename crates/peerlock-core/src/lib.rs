//! Peerlock-core - Protocol types and logic for decentralized mutual exclusion
//!
//! This crate provides:
//! - Node identity and timestamp ordering
//! - The per-node mutex state machine and waiting queue
//! - The inbound admission decision (grant / deny / queue)
//! - Wire message vocabulary
//! - Access-log events and the mutual-exclusion audit
//! - Retry and configuration types
//!
//! Everything here is synchronous and free of I/O; the `peerlock` crate
//! supplies the transport and the runtime.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod admission;
pub mod audit;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod identity;
pub mod message;
pub mod queue;
pub mod retry;
pub mod state;

pub use admission::admit;
pub use clock::{RequestClock, Timestamp};
pub use config::NodeConfig;
pub use error::{Error, Result};
pub use events::{AccessEvent, AccessEventKind};
pub use identity::{NodeId, NodeIdentity};
pub use message::{AccessReply, AccessRequest, AccessStatus, GrantNotice, ReleaseNotice};
pub use queue::{RequestRecord, WaitQueue};
pub use retry::BackoffPolicy;
pub use state::{MutexState, NodeState};
