//! Value objects for simulation configuration and reporting.

use std::collections::BTreeMap;
use std::time::Duration;

use super::{NodeIndex, Version};

/// How many neighbors each node receives at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborPolicy {
    /// A fixed neighbor count, independent of network size.
    Flat(usize),
    /// A percentage of the network size.
    Percent(u8),
}

impl NeighborPolicy {
    /// Flat policy, floored at one neighbor.
    pub fn flat(count: i64) -> Self {
        NeighborPolicy::Flat(count.max(1) as usize)
    }

    /// Percentage policy, clamped to `1..=100`.
    pub fn percent(pct: i64) -> Self {
        NeighborPolicy::Percent(pct.clamp(1, 100) as u8)
    }

    /// Resolve to a neighbor count for a network of `network_size` nodes.
    ///
    /// Never returns less than one. May exceed `network_size` for flat
    /// policies; the topology builder caps it.
    pub fn resolve(self, network_size: usize) -> usize {
        let count = match self {
            NeighborPolicy::Flat(count) => count,
            NeighborPolicy::Percent(pct) => usize::from(pct) * network_size / 100,
        };
        count.max(1)
    }
}

impl Default for NeighborPolicy {
    fn default() -> Self {
        NeighborPolicy::Flat(10)
    }
}

/// Simulation configuration consumed at spawn time.
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Neighbor list sizing.
    pub neighbor_policy: NeighborPolicy,
    /// Pull timers fire after a delay drawn from `[0, pull_interval_bound)`.
    pub pull_interval_bound: Duration,
    /// Give up waiting for quiescence after this long.
    pub convergence_deadline: Duration,
    /// Tick of the convergence wait loop.
    pub poll_interval: Duration,
    /// Mailbox capacity multiplier over the network size (at least 1).
    pub mailbox_headroom: usize,
    /// Seed for topology generation; `None` draws from OS entropy.
    pub topology_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            neighbor_policy: NeighborPolicy::default(),
            pull_interval_bound: Duration::from_secs(45),
            convergence_deadline: Duration::from_secs(90),
            poll_interval: Duration::from_millis(1),
            mailbox_headroom: 2,
            topology_seed: None,
        }
    }
}

impl SimulationConfig {
    /// Capacity of each node's mailboxes for a network of `network_size` nodes.
    ///
    /// Always at least `network_size`, the worst-case fan-out one broadcast
    /// can direct at a single node.
    pub fn mailbox_capacity(&self, network_size: usize) -> usize {
        network_size.max(1) * self.mailbox_headroom.max(1)
    }
}

/// Number of nodes holding a given version.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VersionBucket {
    pub version: Version,
    pub count: usize,
}

/// Aggregate network status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusReport {
    /// One bucket per distinct version present, ascending by version.
    pub buckets: Vec<VersionBucket>,
    /// Sum of all per-node update counters.
    pub total_messages: u64,
}

impl StatusReport {
    /// Build a report from per-node `(version, updates)` pairs.
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (Version, u64)>,
    {
        let mut counts: BTreeMap<Version, usize> = BTreeMap::new();
        let mut total_messages = 0u64;
        for (version, updates) in nodes {
            *counts.entry(version).or_insert(0) += 1;
            total_messages += updates;
        }

        Self {
            buckets: counts
                .into_iter()
                .map(|(version, count)| VersionBucket { version, count })
                .collect(),
            total_messages,
        }
    }

    /// Number of nodes at `version`.
    pub fn count_at(&self, version: Version) -> usize {
        self.buckets
            .iter()
            .find(|b| b.version == version)
            .map_or(0, |b| b.count)
    }

    /// Total nodes covered by the report.
    pub fn node_count(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Highest version present in the network.
    pub fn highest_version(&self) -> Option<Version> {
        self.buckets.last().map(|b| b.version)
    }

    /// Every node holds the same version.
    pub fn is_converged(&self) -> bool {
        self.buckets.len() == 1
    }
}

/// Outcome of waiting for a dissemination round to finish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConvergenceReport {
    /// The consensus event counter reached the node count.
    pub consensus_reached: bool,
    /// Elapsed time when the consensus counter first reached the node count.
    pub time_to_consensus: Option<Duration>,
    /// Elapsed time until quiescence, or until the wait was abandoned.
    pub time_to_quiescence: Duration,
    /// The deadline expired before quiescence.
    pub timed_out: bool,
}

/// Result of a unicast dissemination round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnicastReport {
    pub version: Version,
    pub target: NodeIndex,
    pub convergence: ConvergenceReport,
}
