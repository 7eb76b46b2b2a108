//! Hexagonal ports for the gossip engine.

pub mod inbound;
pub mod outbound;
