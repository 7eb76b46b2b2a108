//! # Dissemination Scenarios
//!
//! End-to-end runs of the network controller against real node tasks.
//! Every test runs on a paused clock, so simulated latencies, pull timers
//! and convergence deadlines elapse in virtual time.

use std::time::Duration;

use gossip_engine::{
    FixedLatency, GossipError, GossipNetworkApi, GossipNetworkService, NeighborPolicy,
    NetworkTopology, NodeKind, PushMessage, SimulationConfig, VersionBucket,
};

fn config(policy: NeighborPolicy) -> SimulationConfig {
    SimulationConfig {
        neighbor_policy: policy,
        pull_interval_bound: Duration::from_secs(1),
        ..SimulationConfig::default()
    }
}

/// Push-only network where every node lists every node: one unicast
/// reaches everyone and each node forwards exactly once.
#[tokio::test(start_paused = true)]
async fn test_push_network_fully_converges() {
    // Arrange
    let service = GossipNetworkService::new(config(NeighborPolicy::Flat(10)));
    service.spawn_network(10, NodeKind::Push).await.unwrap();

    // Act
    let report = service.unicast(0).await.unwrap();

    // Assert
    assert_eq!(report.version, 1);
    assert!(report.convergence.consensus_reached);
    assert!(!report.convergence.timed_out);
    assert!(report.convergence.time_to_consensus.unwrap() <= report.convergence.time_to_quiescence);

    let status = service.status().await.unwrap();
    assert_eq!(status.buckets, vec![VersionBucket { version: 1, count: 10 }]);
    // 10 nodes, 9 non-self neighbors each, one forward per node
    assert_eq!(status.total_messages, 90);
}

#[tokio::test(start_paused = true)]
async fn test_single_node_converges_immediately() {
    let service = GossipNetworkService::new(config(NeighborPolicy::default()));
    service.spawn_network(1, NodeKind::PushPull).await.unwrap();

    let report = service.unicast(0).await.unwrap();

    assert!(report.convergence.consensus_reached);
    assert!(!report.convergence.timed_out);

    let status = service.status().await.unwrap();
    assert_eq!(status.buckets, vec![VersionBucket { version: 1, count: 1 }]);
    assert_eq!(status.total_messages, 0);
}

/// Node 0 only lists itself, so a push to it goes nowhere. The other nodes
/// can only learn the version by pulling from node 0.
#[tokio::test(start_paused = true)]
async fn test_push_pull_converges_through_pull_alone() {
    // Arrange
    let service = GossipNetworkService::new(config(NeighborPolicy::default()));
    let topology =
        NetworkTopology::from_adjacency(vec![vec![0], vec![0], vec![0], vec![0], vec![0]])
            .unwrap();
    service
        .spawn_with_topology(topology, NodeKind::PushPull)
        .await
        .unwrap();

    // Act: write straight into node 0's mailbox, bypassing broadcast/unicast
    service.convergence().message_sent();
    let mailbox = service.mailbox(0).await.unwrap();
    assert!(mailbox.push(PushMessage::Version(1)).await);

    tokio::time::sleep(Duration::from_secs(30)).await;

    // Assert
    let status = service.status().await.unwrap();
    assert_eq!(status.buckets, vec![VersionBucket { version: 1, count: 5 }]);
    assert!(status.total_messages >= 4);
    assert_eq!(service.current_version(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_push_only_does_not_pull() {
    let service = GossipNetworkService::new(config(NeighborPolicy::default()));
    let topology = NetworkTopology::from_adjacency(vec![vec![0], vec![0], vec![0]]).unwrap();
    service
        .spawn_with_topology(topology, NodeKind::Push)
        .await
        .unwrap();

    service.convergence().message_sent();
    service
        .mailbox(0)
        .await
        .unwrap()
        .push(PushMessage::Version(1))
        .await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    let status = service.status().await.unwrap();
    assert_eq!(status.count_at(0), 2);
    assert_eq!(status.count_at(1), 1);
}

#[tokio::test(start_paused = true)]
async fn test_respawn_replaces_generation() {
    // Arrange
    let service = GossipNetworkService::new(config(NeighborPolicy::default()));
    service.spawn_network(8, NodeKind::PushPull).await.unwrap();
    let old_mailbox = service.mailbox(0).await.unwrap();

    // Act
    service.spawn_network(5, NodeKind::Push).await.unwrap();

    // Assert
    assert_eq!(service.live_tasks().await, 5);
    assert_eq!(service.network_size().await, 5);
    assert!(old_mailbox.is_closed());
    assert_eq!(service.convergence().snapshot(), Default::default());
}

#[tokio::test(start_paused = true)]
async fn test_teardown_is_idempotent() {
    let service = GossipNetworkService::new(config(NeighborPolicy::default()));
    service.spawn_network(4, NodeKind::PushPull).await.unwrap();
    let mailbox = service.mailbox(3).await.unwrap();

    assert!(service.teardown_network().await);
    assert!(!service.teardown_network().await);

    assert!(mailbox.is_closed());
    assert_eq!(service.live_tasks().await, 0);
    assert_eq!(service.broadcast().await, Err(GossipError::NoNetwork));
}

/// Two disjoint pairs: the round settles but only half the network learns
/// the version.
#[tokio::test(start_paused = true)]
async fn test_disconnected_topology_misses_consensus() {
    let service = GossipNetworkService::with_latency(
        config(NeighborPolicy::default()),
        FixedLatency(Duration::from_millis(50)),
    );
    let topology =
        NetworkTopology::from_adjacency(vec![vec![1], vec![0], vec![3], vec![2]]).unwrap();
    service
        .spawn_with_topology(topology, NodeKind::Push)
        .await
        .unwrap();

    let report = service.unicast(0).await.unwrap();

    assert!(!report.convergence.consensus_reached);
    assert!(report.convergence.time_to_consensus.is_none());
    assert!(!report.convergence.timed_out);

    let status = service.status().await.unwrap();
    assert_eq!(
        status.buckets,
        vec![
            VersionBucket { version: 0, count: 2 },
            VersionBucket { version: 1, count: 2 },
        ]
    );
    assert!(!status.is_converged());
}

#[tokio::test(start_paused = true)]
async fn test_broadcast_reaches_every_node() {
    let service = GossipNetworkService::new(config(NeighborPolicy::Percent(30)));
    service.spawn_network(6, NodeKind::Push).await.unwrap();

    let version = service.broadcast().await.unwrap();
    let report = service
        .convergence()
        .wait_for_convergence_from(0, 6, Duration::from_secs(90), Duration::from_millis(1))
        .await;

    assert_eq!(version, 1);
    assert!(report.consensus_reached);
    assert_eq!(service.status().await.unwrap().count_at(1), 6);
}

#[tokio::test(start_paused = true)]
async fn test_later_rounds_supersede_earlier_ones() {
    let service = GossipNetworkService::new(config(NeighborPolicy::Flat(10)));
    service.spawn_network(10, NodeKind::Push).await.unwrap();

    service.unicast(3).await.unwrap();
    let second = service.unicast(7).await.unwrap();

    // Counted from the second round's own baseline
    assert!(second.convergence.consensus_reached);
    let status = service.status().await.unwrap();
    assert_eq!(status.highest_version(), Some(2));
    assert_eq!(status.count_at(2), 10);
    assert_eq!(status.total_messages, 180);
}
