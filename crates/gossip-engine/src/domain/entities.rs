//! # Core Domain Entities
//!
//! ## Entities
//!
//! - [`NodeKind`]: Which dissemination protocol a node runs
//! - [`NodeState`]: Version and update counter of one node, shared between
//!   the node's task (sole writer) and the controller (reader)

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;

/// Version value disseminated through the network. `0` means "nothing yet".
pub type Version = u64;

/// Index of a node in the controller's node arena. Stable for the node's lifetime.
pub type NodeIndex = usize;

/// Dissemination protocol run by a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Forwards newer versions to neighbors, never asks for them.
    Push,
    /// Push plus a randomized pull timer (anti-entropy).
    PushPull,
}

impl NodeKind {
    /// Whether nodes of this kind run the pull timer.
    pub fn pulls(self) -> bool {
        matches!(self, NodeKind::PushPull)
    }

    /// Textual form used by the command layer.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Push => "PUSH",
            NodeKind::PushPull => "PUSH&PULL",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown node kind.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown node kind '{0}' (expected PUSH or PUSH&PULL)")]
pub struct UnknownNodeKind(pub String);

impl FromStr for NodeKind {
    type Err = UnknownNodeKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PUSH" => Ok(NodeKind::Push),
            "PUSH&PULL" => Ok(NodeKind::PushPull),
            other => Err(UnknownNodeKind(other.to_string())),
        }
    }
}

/// Observable state of a single node.
///
/// The node's own task is the only writer; the controller reads it to build
/// status reports while the network is running. Reads are not synchronized
/// with each other, so a status snapshot across nodes is best-effort.
#[derive(Debug, Default)]
pub struct NodeState {
    version: AtomicU64,
    updates: AtomicU64,
}

impl NodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current version held by the node.
    pub fn version(&self) -> Version {
        self.version.load(Ordering::Acquire)
    }

    /// Messages this node sent because of a version change or a pull reply.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    /// Raise the version to `version` if it is strictly newer.
    ///
    /// Returns `true` when the version changed. The stored value never decreases.
    pub(crate) fn advance_to(&self, version: Version) -> bool {
        self.version.fetch_max(version, Ordering::AcqRel) < version
    }

    pub(crate) fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}
