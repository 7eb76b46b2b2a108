//! Random directed topology generation.
//!
//! Each node draws its neighbor list uniformly without replacement from all
//! node indices: a random permutation truncated to the desired length. The
//! result is a random directed graph. It may contain self-references and is
//! not guaranteed to be strongly connected for small sizes; both are accepted
//! properties of uniform sampling, not defects.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::Rng;

use super::{check_neighbor_list, InvariantViolation, NeighborPolicy, NodeIndex};

/// Adjacency list, one neighbor list per node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NetworkTopology {
    adjacency: Vec<Vec<NodeIndex>>,
}

impl NetworkTopology {
    /// Build a topology from explicit neighbor lists.
    ///
    /// Every list must be non-empty, in range and free of duplicates.
    pub fn from_adjacency(adjacency: Vec<Vec<NodeIndex>>) -> Result<Self, InvariantViolation> {
        let size = adjacency.len();
        for neighbors in &adjacency {
            check_neighbor_list(neighbors, size)?;
        }
        Ok(Self { adjacency })
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Neighbor indices of `node`. Empty for an unknown node.
    pub fn neighbors(&self, node: NodeIndex) -> &[NodeIndex] {
        self.adjacency.get(node).map_or(&[], Vec::as_slice)
    }

    /// Iterate neighbor lists in node order.
    pub fn iter(&self) -> impl Iterator<Item = &[NodeIndex]> {
        self.adjacency.iter().map(Vec::as_slice)
    }

    /// Number of nodes reachable from `start` along directed edges, including `start`.
    pub fn reachable_from(&self, start: NodeIndex) -> usize {
        if start >= self.len() {
            return 0;
        }

        let mut visited = vec![false; self.len()];
        let mut queue = VecDeque::from([start]);
        visited[start] = true;
        let mut reached = 1;

        while let Some(node) = queue.pop_front() {
            for &next in self.neighbors(node) {
                if !visited[next] {
                    visited[next] = true;
                    reached += 1;
                    queue.push_back(next);
                }
            }
        }
        reached
    }

    /// Every node can reach every other node.
    pub fn is_strongly_connected(&self) -> bool {
        (0..self.len()).all(|node| self.reachable_from(node) == self.len())
    }

    pub(crate) fn into_adjacency(self) -> Vec<Vec<NodeIndex>> {
        self.adjacency
    }
}

/// Produces random neighbor assignments for a node set.
#[derive(Clone, Copy, Debug)]
pub struct TopologyBuilder {
    policy: NeighborPolicy,
}

impl TopologyBuilder {
    pub fn new(policy: NeighborPolicy) -> Self {
        Self { policy }
    }

    /// Neighbor list length for a network of `network_size` nodes.
    pub fn list_size(&self, network_size: usize) -> usize {
        self.policy.resolve(network_size).min(network_size)
    }

    /// Generate a topology for `network_size` nodes.
    pub fn build<R: Rng + ?Sized>(&self, network_size: usize, rng: &mut R) -> NetworkTopology {
        let list_size = self.list_size(network_size);
        let mut indices: Vec<NodeIndex> = (0..network_size).collect();

        let adjacency = (0..network_size)
            .map(|_| {
                let (chosen, _) = indices.partial_shuffle(rng, list_size);
                chosen.to_vec()
            })
            .collect();

        NetworkTopology { adjacency }
    }
}
