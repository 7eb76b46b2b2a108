//! # Domain Layer for the Gossip Engine
//!
//! Pure simulation logic with no task or channel dependencies.
//!
//! ## Contents
//!
//! - **entities**: Node identity, kind and shared per-node state (`NodeKind`, `NodeState`)
//! - **value_objects**: Configuration and reports (`SimulationConfig`, `NeighborPolicy`, `StatusReport`)
//! - **topology**: Random directed neighbor assignment (`TopologyBuilder`, `NetworkTopology`)
//! - **convergence**: Process-wide gossip counters and the convergence wait (`ConvergenceState`)
//! - **invariants**: Forwarding, reply and neighbor-list rules

mod convergence;
mod entities;
mod invariants;
mod topology;
mod value_objects;

pub use convergence::*;
pub use entities::*;
pub use invariants::*;
pub use topology::*;
pub use value_objects::*;
