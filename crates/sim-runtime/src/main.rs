//! # Gossip-Sim
//!
//! Runs the commands file, then interactive commands from standard input,
//! against a fresh gossip network controller. Results of every unicast
//! round and STATUS command are written to the results file.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use gossip_engine::GossipNetworkService;
use sim_runtime::{CommandSource, Interpreter, ResultsLog, RuntimeConfig};
use sim_telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::parse();
    let _telemetry = init_telemetry(TelemetryConfig::from_env())?;

    info!(
        commands = %config.commands.display(),
        results = %config.results.display(),
        pull_interval_secs = config.pull_interval_secs,
        deadline_secs = config.deadline_secs,
        "Starting gossip simulator"
    );

    let service =
        GossipNetworkService::with_latency(config.simulation_config(), config.latency());
    let results = ResultsLog::create(&config.results)
        .with_context(|| format!("Failed to create {}", config.results.display()))?;
    let mut source = CommandSource::open(&config.commands, !config.no_stdin)
        .await
        .with_context(|| format!("Failed to read {}", config.commands.display()))?;

    let mut interpreter = Interpreter::new(service, results, io::stdout());
    let executed = interpreter
        .run(&mut source)
        .await
        .context("Failed to write simulation output")?;
    interpreter.finish().await?;

    info!(executed, "Simulation finished");
    Ok(())
}
