//! The waiting queue of deferred requests

use serde::{Deserialize, Serialize};

use crate::clock::Timestamp;
use crate::identity::{NodeId, NodeIdentity};

/// A request that arrived at, or was issued by, this node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// Who is asking for access
    pub requester: NodeIdentity,
    /// When they asked, in the requester's clock
    pub timestamp: Timestamp,
}

impl RequestRecord {
    /// Create a new request record
    #[must_use]
    pub const fn new(requester: NodeIdentity, timestamp: Timestamp) -> Self {
        Self {
            requester,
            timestamp,
        }
    }
}

/// FIFO of deferred requests, in arrival order at this node
///
/// Holds at most one record per requester: a requester that retries while
/// already queued keeps its position but gets its timestamp refreshed.
#[derive(Debug, Clone, Default)]
pub struct WaitQueue {
    records: Vec<RequestRecord>,
}

impl WaitQueue {
    /// Create a new empty queue
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of waiting requests
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Append a request, or refresh it in place if the requester is already queued
    pub fn push(&mut self, record: RequestRecord) {
        if let Some(existing) = self
            .records
            .iter_mut()
            .find(|r| r.requester.id == record.requester.id)
        {
            existing.timestamp = record.timestamp;
        } else {
            self.records.push(record);
        }
    }

    /// Remove and return the request at the head of the queue
    pub fn pop_front(&mut self) -> Option<RequestRecord> {
        if self.records.is_empty() {
            None
        } else {
            Some(self.records.remove(0))
        }
    }

    /// Check whether a requester is currently queued
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.records.iter().any(|r| r.requester.id == id)
    }

    /// Get all waiting requests in order
    #[must_use]
    pub fn records(&self) -> &[RequestRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, micros: i64) -> RequestRecord {
        let node = NodeId::new(id);
        #[allow(clippy::unwrap_used)]
        let identity = NodeIdentity::new(node, format!("127.0.0.1:{}", 4100 + id)).unwrap();
        RequestRecord::new(identity, Timestamp::new(micros, node))
    }

    #[test]
    fn fifo_order_is_arrival_order() {
        let mut queue = WaitQueue::new();
        queue.push(record(2, 500));
        queue.push(record(1, 100));

        // Arrival order, not timestamp order.
        assert_eq!(queue.pop_front().map(|r| r.requester.id), Some(NodeId::new(2)));
        assert_eq!(queue.pop_front().map(|r| r.requester.id), Some(NodeId::new(1)));
        assert!(queue.pop_front().is_none());
    }

    #[test]
    fn duplicate_requester_is_refreshed_not_duplicated() {
        let mut queue = WaitQueue::new();
        queue.push(record(1, 100));
        queue.push(record(2, 200));
        queue.push(record(1, 300));

        assert_eq!(queue.len(), 2);
        let head = queue.pop_front();
        assert_eq!(head.as_ref().map(|r| r.requester.id), Some(NodeId::new(1)));
        assert_eq!(head.map(|r| r.timestamp.wall_micros), Some(300));
    }

    #[test]
    fn contains_tracks_membership() {
        let mut queue = WaitQueue::new();
        assert!(!queue.contains(NodeId::new(1)));
        queue.push(record(1, 100));
        assert!(queue.contains(NodeId::new(1)));
        queue.pop_front();
        assert!(!queue.contains(NodeId::new(1)));
    }
}
