//! Request timestamps and the per-node clock

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::identity::NodeId;

/// A totally ordered request timestamp
///
/// Ordered lexicographically by `(wall_micros, node_id)`, so two requests
/// issued at the same wall-clock instant are still strictly ordered by the
/// node id. Wall-clock skew across nodes can bias fairness but never breaks
/// the total order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Microseconds since the Unix epoch
    pub wall_micros: i64,
    /// Issuing node, the tie-break key
    pub node_id: NodeId,
}

impl Timestamp {
    /// Create a timestamp from raw parts
    #[must_use]
    pub const fn new(wall_micros: i64, node_id: NodeId) -> Self {
        Self {
            wall_micros,
            node_id,
        }
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.wall_micros, self.node_id)
    }
}

/// Issues fresh, strictly increasing timestamps for one node
///
/// Every request round draws a new timestamp; stale timestamps are never
/// reused. If the wall clock stalls or steps backwards the clock bumps past
/// the last issued value so local monotonicity still holds.
#[derive(Debug)]
pub struct RequestClock {
    node_id: NodeId,
    last_micros: i64,
}

impl RequestClock {
    /// Create a clock for the given node
    #[must_use]
    pub const fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            last_micros: 0,
        }
    }

    /// Issue a fresh timestamp, strictly greater than any issued before
    pub fn next(&mut self) -> Timestamp {
        let now = Utc::now().timestamp_micros();
        self.last_micros = now.max(self.last_micros + 1);
        Timestamp::new(self.last_micros, self.node_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_wall_time_first() {
        let a = Timestamp::new(100, NodeId::new(9));
        let b = Timestamp::new(101, NodeId::new(1));
        assert!(a < b);
    }

    #[test]
    fn equal_wall_time_breaks_tie_on_node_id() {
        let a = Timestamp::new(100, NodeId::new(1));
        let b = Timestamp::new(100, NodeId::new(2));
        assert!(a < b);
        assert_ne!(a, b);
    }

    #[test]
    fn clock_is_strictly_increasing() {
        let mut clock = RequestClock::new(NodeId::new(3));
        let mut prev = clock.next();
        for _ in 0..1000 {
            let next = clock.next();
            assert!(next > prev);
            prev = next;
        }
    }
}
