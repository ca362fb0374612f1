//! Mutual-exclusion audit over merged access logs
//!
//! Replays `used`/`released` events from every node and checks that no two
//! nodes held the resource at overlapping instants.

use chrono::{DateTime, Utc};

use crate::events::{AccessEvent, AccessEventKind};
use crate::identity::NodeId;

/// An interval during which one node believed it held the resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeldInterval {
    /// The holding node
    pub node_id: NodeId,
    /// When use began
    pub from: DateTime<Utc>,
    /// When the node released, or `None` if the log ends mid-use
    pub until: Option<DateTime<Utc>>,
}

/// A detected violation: two nodes held the resource at once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    /// The first interval
    pub first: HeldInterval,
    /// The interval that overlaps it
    pub second: HeldInterval,
}

impl std::fmt::Display for Overlap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "nodes {} and {} held the resource concurrently",
            self.first.node_id, self.second.node_id
        )
    }
}

/// Extract per-node held intervals from a merged event stream
///
/// Events may arrive in any order; they are sorted by recording time first.
#[must_use]
pub fn held_intervals(events: &[AccessEvent]) -> Vec<HeldInterval> {
    let mut sorted: Vec<&AccessEvent> = events
        .iter()
        .filter(|e| matches!(e.kind, AccessEventKind::Used | AccessEventKind::Released))
        .collect();
    sorted.sort_by_key(|e| (e.at, e.node_id));

    let mut intervals = Vec::new();
    let mut open: Vec<(NodeId, DateTime<Utc>)> = Vec::new();

    for event in sorted {
        match event.kind {
            AccessEventKind::Used => open.push((event.node_id, event.at)),
            AccessEventKind::Released => {
                if let Some(pos) = open.iter().position(|(id, _)| *id == event.node_id) {
                    let (node_id, from) = open.remove(pos);
                    intervals.push(HeldInterval {
                        node_id,
                        from,
                        until: Some(event.at),
                    });
                }
            }
            _ => {}
        }
    }

    // Anything still open ran to the end of the log.
    for (node_id, from) in open {
        intervals.push(HeldInterval {
            node_id,
            from,
            until: None,
        });
    }
    intervals
}

/// Verify the mutual-exclusion property over a merged event stream
///
/// Returns the first pair of overlapping held intervals from distinct nodes,
/// or `Ok(())` if every pair is disjoint.
pub fn verify_mutual_exclusion(events: &[AccessEvent]) -> Result<(), Overlap> {
    let intervals = held_intervals(events);
    for (i, a) in intervals.iter().enumerate() {
        for b in &intervals[i + 1..] {
            if a.node_id != b.node_id && overlaps(a, b) {
                return Err(Overlap {
                    first: *a,
                    second: *b,
                });
            }
        }
    }
    Ok(())
}

fn overlaps(a: &HeldInterval, b: &HeldInterval) -> bool {
    let a_ends_before_b = a.until.map_or(false, |end| end <= b.from);
    let b_ends_before_a = b.until.map_or(false, |end| end <= a.from);
    !(a_ends_before_b || b_ends_before_a)
}
