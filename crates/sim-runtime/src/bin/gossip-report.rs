//! # Gossip-Report
//!
//! Aggregates a results file written by `gossip-sim` per node count and
//! neighbor list size.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use sim_runtime::{aggregate, load_results, render_table};

/// Gossip-Report: summarize simulation results
#[derive(Parser, Debug)]
#[command(name = "gossip-report", version)]
#[command(about = "Aggregate gossip-sim results per network size and neighbour list size")]
struct Args {
    /// Results file to read
    #[arg(default_value = "results.txt")]
    results: PathBuf,

    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let records = load_results(&args.results)
        .with_context(|| format!("Failed to process {}", args.results.display()))?;
    let summaries = aggregate(&records);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print!("{}", render_table(&summaries));
        println!("Processed {} results", records.len());
    }

    Ok(())
}
