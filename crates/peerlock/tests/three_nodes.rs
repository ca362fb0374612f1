//! Full-stack cluster tests: real HTTP servers, real coordinators
//!
//! Spins up nodes in-process on ephemeral ports, runs their agent cycles,
//! then audits the merged access logs for the mutual-exclusion property.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::uninlined_format_args
)]

use std::future::IntoFuture;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::net::TcpListener;

use peerlock::{audit_log, build_node, server, Node, NodeAgent};
use peerlock_core::{
    audit::verify_mutual_exclusion, AccessEventKind, Error, GrantNotice, NodeConfig, NodeId,
};

struct ClusterNode {
    node: Arc<Node>,
    agent: NodeAgent,
    log_path: PathBuf,
}

/// Bind ephemeral ports, build the peer map, start every node's server.
async fn spawn_cluster(count: u64, dir: &std::path::Path) -> Vec<ClusterNode> {
    let mut listeners = Vec::new();
    for _ in 0..count {
        listeners.push(TcpListener::bind("127.0.0.1:0").await.unwrap());
    }
    let addrs: Vec<String> = listeners
        .iter()
        .map(|l| l.local_addr().unwrap().to_string())
        .collect();
    let peer_spec: String = addrs
        .iter()
        .enumerate()
        .map(|(i, addr)| format!("{}={}", i + 1, addr))
        .collect::<Vec<_>>()
        .join(",");

    let mut cluster = Vec::new();
    for (i, listener) in listeners.into_iter().enumerate() {
        let id = i as u64 + 1;
        let log_path = dir.join(format!("node-{id}.jsonl"));
        let config = NodeConfig::build(
            &id.to_string(),
            &addrs[i],
            &peer_spec,
            Duration::from_millis(500),
            "10..60",
            "5..30",
            "15..40",
            Some(log_path.clone()),
        )
        .unwrap();

        let (node, agent) = build_node(&config).unwrap();
        let router = server::router(Arc::clone(&node));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        cluster.push(ClusterNode {
            node,
            agent,
            log_path,
        });
    }
    cluster
}

#[tokio::test]
async fn cluster_preserves_mutual_exclusion_under_contention() {
    let dir = tempfile::tempdir().unwrap();
    let cluster = spawn_cluster(3, dir.path()).await;

    let log_paths: Vec<PathBuf> = cluster.iter().map(|n| n.log_path.clone()).collect();

    let runs = cluster.into_iter().map(|member| {
        tokio::spawn(async move { member.agent.run_cycles(3).await })
    });
    let results = tokio::time::timeout(Duration::from_secs(120), join_all(runs))
        .await
        .expect("cluster cycles should finish well inside the deadline");
    for result in results {
        result.unwrap().unwrap();
    }

    let mut merged = Vec::new();
    for path in &log_paths {
        let events = audit_log::read_events(path).unwrap();

        // Progress: every node completed each of its cycles.
        let used = events
            .iter()
            .filter(|e| e.kind == AccessEventKind::Used)
            .count();
        let released = events
            .iter()
            .filter(|e| e.kind == AccessEventKind::Released)
            .count();
        assert_eq!(used, 3, "node log {path:?} is missing use events");
        assert_eq!(released, 3, "node log {path:?} is missing release events");

        merged.extend(events);
    }

    // Safety: no two nodes ever held the resource at overlapping instants.
    if let Err(overlap) = verify_mutual_exclusion(&merged) {
        panic!("mutual exclusion violated: {overlap}");
    }
}

#[tokio::test]
async fn contended_resource_is_serialized_between_two_nodes() {
    let dir = tempfile::tempdir().unwrap();
    let mut cluster = spawn_cluster(3, dir.path()).await;
    let c = cluster.pop().unwrap();
    let b = cluster.pop().unwrap();
    let a = cluster.pop().unwrap();
    drop(c.agent); // node C only answers requests in this test

    // A takes the resource uncontended.
    a.agent
        .acquire_with_deadline(Duration::from_secs(10))
        .await
        .unwrap();

    // B contends while A holds; it can only win after A releases.
    let b_run = tokio::spawn(async move {
        b.agent
            .acquire_with_deadline(Duration::from_secs(30))
            .await
            .unwrap();
        b.agent.release().await.unwrap();
        b
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    a.agent.release().await.unwrap();

    let b = tokio::time::timeout(Duration::from_secs(30), b_run)
        .await
        .expect("node B should obtain the resource after A releases")
        .unwrap();

    let mut merged = audit_log::read_events(&a.log_path).unwrap();
    merged.extend(audit_log::read_events(&b.log_path).unwrap());
    merged.extend(audit_log::read_events(&c.log_path).unwrap());
    assert!(verify_mutual_exclusion(&merged).is_ok());

    // A was denied to B at least once while holding.
    let denials = audit_log::read_events(&a.log_path)
        .unwrap()
        .iter()
        .filter(|e| {
            e.kind == AccessEventKind::Denied && e.peer_id == Some(b.node.identity().id)
        })
        .count();
    assert!(denials >= 1, "expected node A to deny node B while held");
}

#[tokio::test]
async fn handoff_notice_promotes_a_backed_off_requester() {
    // One live node whose only peer never answers: every round fails, so the
    // node sits in backoff until a direct grant notice arrives over HTTP.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    // A bound-then-dropped socket gives a dead peer address.
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap().to_string();
    drop(dead);

    let config = NodeConfig::build(
        "2",
        &addr,
        &format!("1={dead_addr}"),
        Duration::from_millis(100),
        "2000..3000",
        "5..10",
        "5..10",
        None,
    )
    .unwrap();
    let (node, agent) = build_node(&config).unwrap();
    tokio::spawn(axum::serve(listener, server::router(Arc::clone(&node))).into_future());

    let acquire = tokio::spawn(async move {
        agent
            .acquire_with_deadline(Duration::from_secs(20))
            .await
            .map(|()| agent)
    });

    // Let the first round fail and the long backoff start, then hand off.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let client = reqwest::Client::new();
    client
        .post(format!("http://{addr}/granted"))
        .json(&GrantNotice {
            node_id: NodeId::new(2),
        })
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    let started = Instant::now();
    let agent = tokio::time::timeout(Duration::from_secs(5), acquire)
        .await
        .expect("hand-off should promote the requester promptly")
        .unwrap()
        .unwrap();
    // Promotion beat the 2s minimum backoff expiry into a fresh (hopeless) round.
    assert!(started.elapsed() < Duration::from_secs(2));
    agent.release().await.unwrap();
}

#[tokio::test]
async fn unreachable_peers_produce_a_definite_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();

    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap().to_string();
    drop(dead);

    let config = NodeConfig::build(
        "1",
        &addr,
        &format!("2={dead_addr}"),
        Duration::from_millis(100),
        "10..30",
        "5..10",
        "5..10",
        None,
    )
    .unwrap();
    let (node, agent) = build_node(&config).unwrap();
    tokio::spawn(axum::serve(listener, server::router(node)).into_future());

    let result = agent.acquire_with_deadline(Duration::from_millis(600)).await;
    assert!(matches!(result, Err(Error::Timeout)));
}
