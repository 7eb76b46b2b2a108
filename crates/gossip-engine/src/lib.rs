//! # Gossip Engine
//!
//! Simulates epidemic dissemination of a monotonically increasing version
//! across a synthetic network of independently scheduled nodes, measuring
//! propagation latency and message volume.
//!
//! ## Architecture Role
//!
//! ```text
//! [Command layer] ──spawn/broadcast/unicast/status──→ [GossipNetworkService]
//!                                                          │
//!                                     TopologyBuilder ─────┤
//!                                                          ↓ one task per node
//!                                                ┌─────────┴─────────┐
//!                                                ↓                   ↓
//!                                           [NodeAgent 0] ⇄ ... ⇄ [NodeAgent n]
//!                                                │  push / pull      │
//!                                                └──────→ ConvergenceState ←┘
//! ```
//!
//! ## Protocols
//!
//! - **Push**: a node that learns a strictly newer version forwards it to
//!   every neighbor.
//! - **Push-pull**: additionally, each node periodically asks its neighbors
//!   for anything newer than what it holds (anti-entropy).
//!
//! Coordination between tasks is purely counter based and best-effort; see
//! [`ConvergenceState`] for the quiescence/consensus detector.

pub mod adapters;
pub mod domain;
pub mod events;
pub mod mailbox;
pub mod ports;
pub mod service;

mod agent;

pub use adapters::{FixedLatency, UniformLatency};
pub use domain::*;
pub use events::GossipError;
pub use mailbox::{Mailbox, PullRequest, PushMessage};
pub use ports::inbound::GossipNetworkApi;
pub use ports::outbound::LatencyModel;
pub use service::GossipNetworkService;
