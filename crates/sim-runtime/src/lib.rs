//! # Simulator Runtime
//!
//! Command layer for the gossip engine.
//!
//! ## Modules
//!
//! - `config/` - Command-line and environment configuration
//! - `command/` - Command grammar
//! - `source/` - Commands file, then standard input
//! - `interpreter/` - Drives the network controller, one command at a time
//! - `results/` - Results file writer
//! - `report/` - Results file parsing and aggregation
//!
//! ## Session Flow
//!
//! ```text
//! commands.txt ──┐
//!                ├──→ CommandSource ──→ Interpreter ──→ GossipNetworkService
//! stdin ─────────┘                          │
//!                                           ├──→ stdout ([COMPLETE] / [ERROR])
//!                                           └──→ results.txt ──→ gossip-report
//! ```

pub mod command;
pub mod config;
pub mod interpreter;
pub mod report;
pub mod results;
pub mod source;

pub use command::{Command, CommandParseError, SizingMode};
pub use config::RuntimeConfig;
pub use interpreter::{Interpreter, NeighborSizing};
pub use report::{
    aggregate, load_results, parse_results, render_table, GroupSummary, ReportError, RunRecord,
};
pub use results::{ResultsLog, RoundHeader};
pub use source::CommandSource;
