//! Inbound ports (API) for the gossip engine.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{NeighborPolicy, NodeIndex, NodeKind, StatusReport, UnicastReport, Version};
use crate::events::GossipError;

/// Operations available to the command layer.
///
/// Each call is a single command from the caller's point of view. Calls that
/// cannot apply (empty network, bad index) return an error and change nothing.
#[async_trait]
pub trait GossipNetworkApi: Send + Sync {
    /// Replace any running network with `size` fresh nodes of `kind`.
    ///
    /// An existing network is torn down first and its termination awaited,
    /// so two generations never run at the same time.
    async fn spawn_network(&self, size: usize, kind: NodeKind) -> Result<(), GossipError>;

    /// Stop every node and reset the counters.
    ///
    /// Returns `false` if there was no network (a no-op).
    async fn teardown_network(&self) -> bool;

    /// Deliver the next version directly to every node.
    async fn broadcast(&self) -> Result<Version, GossipError>;

    /// Deliver the next version to one node and wait for gossip to settle.
    async fn unicast(&self, node: NodeIndex) -> Result<UnicastReport, GossipError>;

    /// Version distribution and total messages sent.
    async fn status(&self) -> Result<StatusReport, GossipError>;

    /// Neighbor sizing for the next spawn.
    fn update_neighbor_policy(&self, policy: NeighborPolicy);

    /// Pull-interval bound for the next spawn.
    fn update_pull_interval(&self, bound: Duration) -> Result<(), GossipError>;
}
