//! Dissemination invariants.

use std::collections::HashSet;

use thiserror::Error;

use super::{NodeIndex, Version};

/// INVARIANT-1: Duplicate suppression.
/// A pushed version is applied and forwarded only if strictly newer than the
/// version held immediately before.
pub fn should_forward(incoming: Version, current: Version) -> bool {
    incoming > current
}

/// INVARIANT-2: Pull replies.
/// A reply is sent only when the requester is strictly behind the responder.
pub fn should_reply(requester: Version, responder: Version) -> bool {
    requester < responder
}

/// Neighbor-list violation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("empty neighbor list")]
    EmptyNeighborList,

    #[error("neighbor {0} listed twice")]
    DuplicateNeighbor(NodeIndex),

    #[error("neighbor {index} out of range for {size} nodes")]
    NeighborOutOfRange { index: NodeIndex, size: usize },
}

/// INVARIANT-3: Neighbor lists.
/// Length in `[1, network_size]`, every index in range, no duplicates.
pub fn check_neighbor_list(
    neighbors: &[NodeIndex],
    network_size: usize,
) -> Result<(), InvariantViolation> {
    if neighbors.is_empty() {
        return Err(InvariantViolation::EmptyNeighborList);
    }

    let mut seen = HashSet::with_capacity(neighbors.len());
    for &index in neighbors {
        if index >= network_size {
            return Err(InvariantViolation::NeighborOutOfRange {
                index,
                size: network_size,
            });
        }
        if !seen.insert(index) {
            return Err(InvariantViolation::DuplicateNeighbor(index));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_only_strictly_newer() {
        assert!(should_forward(2, 1));
        assert!(!should_forward(1, 1));
        assert!(!should_forward(0, 1));
        assert!(should_forward(1, 0));
    }

    #[test]
    fn test_reply_only_when_requester_behind() {
        assert!(should_reply(0, 1));
        assert!(!should_reply(1, 1));
        assert!(!should_reply(3, 1));
    }

    #[test]
    fn test_neighbor_list_checks() {
        assert!(check_neighbor_list(&[0, 2, 1], 3).is_ok());
        // Self-references are allowed
        assert!(check_neighbor_list(&[0], 1).is_ok());

        assert_eq!(
            check_neighbor_list(&[], 3),
            Err(InvariantViolation::EmptyNeighborList)
        );
        assert_eq!(
            check_neighbor_list(&[1, 1], 3),
            Err(InvariantViolation::DuplicateNeighbor(1))
        );
        assert_eq!(
            check_neighbor_list(&[5], 3),
            Err(InvariantViolation::NeighborOutOfRange { index: 5, size: 3 })
        );
    }

    #[test]
    fn test_violation_messages() {
        assert_eq!(
            InvariantViolation::DuplicateNeighbor(4).to_string(),
            "neighbor 4 listed twice"
        );
        assert_eq!(
            InvariantViolation::NeighborOutOfRange { index: 5, size: 3 }.to_string(),
            "neighbor 5 out of range for 3 nodes"
        );
    }
}
