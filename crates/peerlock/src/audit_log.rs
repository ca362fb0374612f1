//! Append-only access log
//!
//! One JSONL line per event. The merged logs of all nodes are the external
//! audit trail for the mutual-exclusion property; they are never read back
//! for recovery.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

use tracing::{info, warn};

use peerlock_core::{AccessEvent, Error, Result};

/// Sink for access events
///
/// Every event goes to the tracing subscriber; with a configured path it is
/// also appended to the JSONL log file.
#[derive(Debug)]
pub struct AccessLog {
    file: Option<Mutex<File>>,
}

impl AccessLog {
    /// Open the log file for appending, or run log-to-tracing only
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(Mutex::new(
                OpenOptions::new().create(true).append(true).open(path)?,
            )),
            None => None,
        };
        Ok(Self { file })
    }

    /// A sink that only forwards to tracing
    #[must_use]
    pub const fn disabled() -> Self {
        Self { file: None }
    }

    /// Record one event
    ///
    /// Write failures are logged and swallowed; the protocol never stalls on
    /// its audit trail.
    pub fn record(&self, event: &AccessEvent) {
        info!(
            node = %event.node_id,
            kind = %event.kind,
            peer = event.peer_id.map(|p| p.value()),
            "access event"
        );
        let Some(file) = &self.file else {
            return;
        };
        match serde_json::to_string(event) {
            Ok(line) => {
                let mut guard = file.lock().unwrap_or_else(PoisonError::into_inner);
                if let Err(error) = writeln!(guard, "{line}") {
                    warn!(%error, "failed to append to access log");
                }
            }
            Err(error) => warn!(%error, "failed to encode access event"),
        }
    }
}

/// Read all events back from a JSONL access log
///
/// Used by audits and tests, not by the running protocol.
pub fn read_events(path: &Path) -> Result<Vec<AccessEvent>> {
    let contents = std::fs::read_to_string(path)?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line)
                .map_err(|e| Error::MalformedMessage(format!("bad log line: {e}")))
        })
        .collect()
}
