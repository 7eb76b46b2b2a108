//! # Gossip Network Service
//!
//! The network controller. Owns the node arena, builds topologies, launches
//! one [`NodeAgent`] task per node and injects versions into the network.
//!
//! ## Generations
//!
//! Every spawn creates a new generation. The previous one is always torn
//! down first: a poison pill is queued on every push mailbox and the
//! controller waits for every task to exit before the counters are reset.
//! Two generations never run at the same time. Each generation starts its
//! version sequence from 1; a counter reset keeps the sequence going.
//!
//! ## Configuration
//!
//! [`SimulationConfig`] is read at spawn time. Changing the neighbor policy
//! or the pull-interval bound affects the next spawn only; call
//! [`GossipNetworkService::respawn`] to rebuild immediately.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, info_span, warn, Instrument};

use crate::adapters::UniformLatency;
use crate::agent::NodeAgent;
use crate::domain::{
    ConvergenceState, NeighborPolicy, NetworkTopology, NodeIndex, NodeKind, NodeState,
    SimulationConfig, StatusReport, TopologyBuilder, UnicastReport, Version,
};
use crate::events::GossipError;
use crate::mailbox::{Mailbox, PushMessage};
use crate::ports::inbound::GossipNetworkApi;
use crate::ports::outbound::LatencyModel;

struct NodeSlot {
    mailbox: Mailbox,
    state: Arc<NodeState>,
    task: JoinHandle<()>,
}

/// One running generation of node tasks.
struct Network {
    generation: u64,
    kind: NodeKind,
    nodes: Vec<NodeSlot>,
}

impl Network {
    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, index: NodeIndex) -> Result<&NodeSlot, GossipError> {
        self.nodes.get(index).ok_or(GossipError::NodeIndexOutOfRange {
            index,
            size: self.nodes.len(),
        })
    }

    /// Poison every node and wait for every task to exit.
    async fn shut_down(mut self) {
        let nodes = std::mem::take(&mut self.nodes);

        for node in &nodes {
            // A closed mailbox means the task is already gone
            node.mailbox.push(PushMessage::Poison).await;
        }

        for (index, node) in nodes.into_iter().enumerate() {
            if let Err(e) = node.task.await {
                warn!(
                    generation = self.generation,
                    node = index,
                    error = %e,
                    "Node task ended abnormally"
                );
            }
        }
    }
}

impl Drop for Network {
    fn drop(&mut self) {
        for node in &self.nodes {
            node.task.abort();
        }
    }
}

/// Network controller.
///
/// Thread-safe; share it across tasks via `Arc`. Operations that touch the
/// node arena are serialized on an async mutex, so a unicast round holds
/// the network until its convergence wait completes.
pub struct GossipNetworkService<L: LatencyModel = UniformLatency> {
    config: RwLock<SimulationConfig>,
    convergence: Arc<ConvergenceState>,
    latency: Arc<L>,
    network: Mutex<Option<Network>>,
    /// Last version handed out by broadcast/unicast in this generation.
    version: AtomicU64,
    generation: AtomicU64,
}

impl GossipNetworkService<UniformLatency> {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_latency(config, UniformLatency::default())
    }
}

impl Default for GossipNetworkService<UniformLatency> {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl<L: LatencyModel> GossipNetworkService<L> {
    pub fn with_latency(config: SimulationConfig, latency: L) -> Self {
        Self {
            config: RwLock::new(config),
            convergence: Arc::new(ConvergenceState::new()),
            latency: Arc::new(latency),
            network: Mutex::new(None),
            version: AtomicU64::new(0),
            generation: AtomicU64::new(0),
        }
    }

    /// Copy of the current configuration.
    pub fn config(&self) -> SimulationConfig {
        self.config.read().clone()
    }

    /// Shared gossip counters.
    pub fn convergence(&self) -> &Arc<ConvergenceState> {
        &self.convergence
    }

    /// Last version handed out (0 before the first broadcast/unicast).
    pub fn current_version(&self) -> Version {
        self.version.load(Ordering::Acquire)
    }

    /// Number of nodes in the running network (0 if none).
    pub async fn network_size(&self) -> usize {
        self.network.lock().await.as_ref().map_or(0, Network::len)
    }

    /// Kind of the running network.
    pub async fn network_kind(&self) -> Option<NodeKind> {
        self.network.lock().await.as_ref().map(|n| n.kind)
    }

    /// Handle to a node's mailboxes. Writes through it bypass the
    /// controller and its counters.
    pub async fn mailbox(&self, index: NodeIndex) -> Result<Mailbox, GossipError> {
        let guard = self.network.lock().await;
        let network = guard.as_ref().ok_or(GossipError::NoNetwork)?;
        Ok(network.node(index)?.mailbox.clone())
    }

    /// Shared state of one node.
    pub async fn node_state(&self, index: NodeIndex) -> Result<Arc<NodeState>, GossipError> {
        let guard = self.network.lock().await;
        let network = guard.as_ref().ok_or(GossipError::NoNetwork)?;
        Ok(Arc::clone(&network.node(index)?.state))
    }

    /// Node tasks that have not exited yet.
    pub async fn live_tasks(&self) -> usize {
        self.network.lock().await.as_ref().map_or(0, |network| {
            network
                .nodes
                .iter()
                .filter(|node| !node.task.is_finished())
                .count()
        })
    }

    /// Spawn over a caller-provided topology, replacing any running network.
    pub async fn spawn_with_topology(
        &self,
        topology: NetworkTopology,
        kind: NodeKind,
    ) -> Result<(), GossipError> {
        if topology.is_empty() {
            return Err(GossipError::InvalidNetworkSize(0));
        }
        let config = self.spawn_config()?;
        self.install(topology, kind, &config).await;
        Ok(())
    }

    /// Spawn over a raw adjacency list, validating every neighbor list.
    pub async fn spawn_with_adjacency(
        &self,
        adjacency: Vec<Vec<NodeIndex>>,
        kind: NodeKind,
    ) -> Result<(), GossipError> {
        let topology = NetworkTopology::from_adjacency(adjacency)?;
        self.spawn_with_topology(topology, kind).await
    }

    /// Rebuild the running network with its current size and kind under
    /// the current configuration.
    pub async fn respawn(&self) -> Result<(), GossipError> {
        let (size, kind) = {
            let guard = self.network.lock().await;
            let network = guard.as_ref().ok_or(GossipError::NoNetwork)?;
            (network.len(), network.kind)
        };
        self.spawn_network(size, kind).await
    }

    /// Zero the gossip counters. Nodes keep their versions and the version
    /// sequence continues, so the next round still carries a newer version.
    pub async fn reset(&self) -> Result<(), GossipError> {
        let guard = self.network.lock().await;
        if guard.is_none() {
            return Err(GossipError::NoNetwork);
        }
        self.convergence.reset();
        info!(version = self.current_version(), "Gossip counters reset");
        Ok(())
    }

    /// Configuration for a new generation. A zero pull bound would spin the
    /// pull timer, so it is refused here as well as in the mutator.
    fn spawn_config(&self) -> Result<SimulationConfig, GossipError> {
        let config = self.config();
        if config.pull_interval_bound.is_zero() {
            return Err(GossipError::InvalidPullInterval(config.pull_interval_bound));
        }
        Ok(config)
    }

    fn build_topology(&self, size: usize, config: &SimulationConfig) -> NetworkTopology {
        let builder = TopologyBuilder::new(config.neighbor_policy);
        match config.topology_seed {
            Some(seed) => builder.build(size, &mut StdRng::seed_from_u64(seed)),
            None => builder.build(size, &mut rand::thread_rng()),
        }
    }

    /// Tear down whatever is running, then launch a generation over
    /// `topology`.
    async fn install(&self, topology: NetworkTopology, kind: NodeKind, config: &SimulationConfig) {
        let mut guard = self.network.lock().await;
        if let Some(previous) = guard.take() {
            previous.shut_down().await;
        }
        self.version.store(0, Ordering::Release);
        self.convergence.reset();

        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let size = topology.len();
        let capacity = config.mailbox_capacity(size);

        let (mailboxes, inboxes): (Vec<_>, Vec<_>) =
            (0..size).map(|_| Mailbox::channel(capacity)).unzip();
        let directory: Arc<[Mailbox]> = mailboxes.clone().into();

        let nodes = topology
            .into_adjacency()
            .into_iter()
            .zip(inboxes)
            .zip(mailboxes)
            .enumerate()
            .map(|(id, ((neighbors, inbox), mailbox))| {
                let state = Arc::new(NodeState::new());
                let agent = NodeAgent {
                    id,
                    kind,
                    neighbors,
                    own: mailbox.clone(),
                    inbox,
                    directory: Arc::clone(&directory),
                    state: Arc::clone(&state),
                    convergence: Arc::clone(&self.convergence),
                    latency: Arc::clone(&self.latency),
                    pull_interval_bound: config.pull_interval_bound,
                };
                let task =
                    tokio::spawn(agent.run().instrument(info_span!("node", generation, id)));
                NodeSlot {
                    mailbox,
                    state,
                    task,
                }
            })
            .collect();

        info!(
            generation,
            size,
            kind = %kind,
            mailbox_capacity = capacity,
            "Network spawned"
        );

        *guard = Some(Network {
            generation,
            kind,
            nodes,
        });
    }
}

#[async_trait]
impl<L: LatencyModel> GossipNetworkApi for GossipNetworkService<L> {
    async fn spawn_network(&self, size: usize, kind: NodeKind) -> Result<(), GossipError> {
        if size == 0 {
            return Err(GossipError::InvalidNetworkSize(size));
        }
        let config = self.spawn_config()?;
        let topology = self.build_topology(size, &config);
        self.install(topology, kind, &config).await;
        Ok(())
    }

    async fn teardown_network(&self) -> bool {
        let mut guard = self.network.lock().await;
        let Some(network) = guard.take() else {
            return false;
        };

        let generation = network.generation;
        network.shut_down().await;
        self.version.store(0, Ordering::Release);
        self.convergence.reset();
        info!(generation, "Network torn down");
        true
    }

    async fn broadcast(&self) -> Result<Version, GossipError> {
        let guard = self.network.lock().await;
        let network = guard.as_ref().ok_or(GossipError::NoNetwork)?;
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;

        for node in &network.nodes {
            self.convergence.message_sent();
            if !node.mailbox.push(PushMessage::Version(version)).await {
                self.convergence.message_consumed();
            }
        }

        info!(version, nodes = network.len(), "Broadcast delivered");
        Ok(version)
    }

    async fn unicast(&self, node: NodeIndex) -> Result<UnicastReport, GossipError> {
        let guard = self.network.lock().await;
        let network = guard.as_ref().ok_or(GossipError::NoNetwork)?;
        let target = network.node(node)?;
        let (deadline, poll_interval) = {
            let config = self.config.read();
            (config.convergence_deadline, config.poll_interval)
        };

        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        let baseline = self.convergence.consensus_events();

        self.convergence.message_sent();
        if !target.mailbox.push(PushMessage::Version(version)).await {
            self.convergence.message_consumed();
        }

        let convergence = self
            .convergence
            .wait_for_convergence_from(baseline, network.len(), deadline, poll_interval)
            .await;

        info!(
            version,
            target = node,
            consensus_reached = convergence.consensus_reached,
            consensus_ms = convergence.time_to_consensus.map(|t| t.as_millis() as u64),
            quiescence_ms = convergence.time_to_quiescence.as_millis() as u64,
            timed_out = convergence.timed_out,
            "Unicast round finished"
        );

        Ok(UnicastReport {
            version,
            target: node,
            convergence,
        })
    }

    async fn status(&self) -> Result<StatusReport, GossipError> {
        let guard = self.network.lock().await;
        let network = guard.as_ref().ok_or(GossipError::NoNetwork)?;

        Ok(StatusReport::from_nodes(
            network
                .nodes
                .iter()
                .map(|node| (node.state.version(), node.state.updates())),
        ))
    }

    fn update_neighbor_policy(&self, policy: NeighborPolicy) {
        self.config.write().neighbor_policy = policy;
        info!(?policy, "Neighbor policy updated");
    }

    fn update_pull_interval(&self, bound: Duration) -> Result<(), GossipError> {
        if bound.is_zero() {
            return Err(GossipError::InvalidPullInterval(bound));
        }
        self.config.write().pull_interval_bound = bound;
        info!(bound_ms = bound.as_millis() as u64, "Pull interval updated");
        Ok(())
    }
}
