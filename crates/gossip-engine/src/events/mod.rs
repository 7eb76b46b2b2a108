//! Error types for the gossip engine.
//!
//! Every variant describes an operation that had no effect. None of them
//! leave the network in a partially modified state.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{InvariantViolation, NodeIndex};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GossipError {
    #[error("No network spawned")]
    NoNetwork,

    #[error("Network size must be at least 1 (got {0})")]
    InvalidNetworkSize(usize),

    #[error("Node index {index} out of range for {size} nodes")]
    NodeIndexOutOfRange { index: NodeIndex, size: usize },

    #[error("Pull interval bound must be non-zero (got {0:?})")]
    InvalidPullInterval(Duration),

    #[error("Invalid topology: {0}")]
    InvalidTopology(InvariantViolation),
}

impl From<InvariantViolation> for GossipError {
    fn from(violation: InvariantViolation) -> Self {
        GossipError::InvalidTopology(violation)
    }
}
