//! Property tests for the ordering and admission rules

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use peerlock_core::{
    admit, AccessStatus, NodeId, NodeIdentity, NodeState, RequestRecord, Timestamp, WaitQueue,
};
use proptest::prelude::*;

fn timestamp() -> impl Strategy<Value = Timestamp> {
    (0..1_000_000i64, 0..64u64).prop_map(|(micros, id)| Timestamp::new(micros, NodeId::new(id)))
}

proptest! {
    /// `(wall_micros, node_id)` ordering is total and antisymmetric.
    #[test]
    fn timestamp_ordering_is_total(a in timestamp(), b in timestamp()) {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => prop_assert!(b > a),
            std::cmp::Ordering::Greater => prop_assert!(b < a),
            std::cmp::Ordering::Equal => {
                prop_assert_eq!(a.wall_micros, b.wall_micros);
                prop_assert_eq!(a.node_id, b.node_id);
            }
        }
    }

    /// Two requests with equal wall time are always ordered by node id.
    #[test]
    fn tie_break_is_deterministic(micros in 0..1_000_000i64, a in 0..64u64, b in 0..64u64) {
        prop_assume!(a != b);
        let ta = Timestamp::new(micros, NodeId::new(a));
        let tb = Timestamp::new(micros, NodeId::new(b));
        prop_assert_eq!(ta < tb, a < b);
    }

    /// However requests arrive, the queue never holds two records for the
    /// same requester.
    #[test]
    fn wait_queue_never_duplicates(entries in prop::collection::vec((0..8u64, 0..1_000i64), 0..32)) {
        let mut queue = WaitQueue::new();
        for (id, micros) in entries {
            let node = NodeId::new(id);
            let identity = NodeIdentity::new(node, format!("127.0.0.1:{}", 4100 + id)).unwrap();
            queue.push(RequestRecord::new(identity, Timestamp::new(micros, node)));
        }
        let mut seen = std::collections::HashSet::new();
        for record in queue.records() {
            prop_assert!(seen.insert(record.requester.id));
        }
    }

    /// Granting only ever moves the watermark forward, whatever the
    /// interleaving of incoming requests.
    #[test]
    fn last_granted_is_monotonic(requests in prop::collection::vec((0..1_000i64, 0..8u64), 1..64)) {
        let mut state = NodeState::new();
        let mut previous = None;
        for (micros, id) in requests {
            let node = NodeId::new(id);
            let identity = NodeIdentity::new(node, format!("127.0.0.1:{}", 4100 + id)).unwrap();
            admit(&mut state, identity, Timestamp::new(micros, node));
            if let Some(granted) = state.last_granted() {
                if let Some(prev) = previous {
                    prop_assert!(granted >= prev);
                }
                previous = Some(granted);
            }
        }
    }

    /// An idle node's decision depends only on the watermark comparison.
    #[test]
    fn idle_admission_matches_watermark(watermark in timestamp(), incoming in timestamp()) {
        let mut state = NodeState::new();
        state.record_grant(watermark);
        let identity =
            NodeIdentity::new(incoming.node_id, "127.0.0.1:4999").unwrap();
        let status = admit(&mut state, identity, incoming);
        if incoming < watermark {
            prop_assert_eq!(status, AccessStatus::Denied);
        } else {
            prop_assert_eq!(status, AccessStatus::Ok);
        }
    }
}
