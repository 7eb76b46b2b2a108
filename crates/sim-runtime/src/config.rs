//! Runtime configuration from command-line arguments and environment.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use gossip_engine::{SimulationConfig, UniformLatency};

/// Gossip-Sim: epidemic dissemination simulator
#[derive(Parser, Debug, Clone)]
#[command(name = "gossip-sim", version)]
#[command(about = "Simulate push and push-pull gossip over randomized topologies")]
pub struct RuntimeConfig {
    /// Commands executed before reading standard input (missing file is fine)
    #[arg(long, env = "SIM_COMMANDS_FILE", default_value = "commands.txt")]
    pub commands: PathBuf,

    /// Results file, truncated at startup
    #[arg(long, env = "SIM_RESULTS_FILE", default_value = "results.txt")]
    pub results: PathBuf,

    /// Upper bound of the random pull delay, in seconds
    #[arg(
        long,
        env = "SIM_PULL_INTERVAL_SECS",
        default_value_t = 45,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub pull_interval_secs: u64,

    /// Give up waiting for a unicast round to settle after this many seconds
    #[arg(long, env = "SIM_DEADLINE_SECS", default_value_t = 90)]
    pub deadline_secs: u64,

    /// Lower bound of the simulated processing delay, in milliseconds
    #[arg(long, env = "SIM_LATENCY_MIN_MS", default_value_t = 40)]
    pub latency_min_ms: u64,

    /// Upper bound of the simulated processing delay, in milliseconds
    #[arg(long, env = "SIM_LATENCY_MAX_MS", default_value_t = 600)]
    pub latency_max_ms: u64,

    /// Seed for topology generation
    #[arg(long, env = "SIM_SEED")]
    pub seed: Option<u64>,

    /// Stop after the commands file instead of reading standard input
    #[arg(long, env = "SIM_NO_STDIN")]
    pub no_stdin: bool,
}

impl RuntimeConfig {
    /// Engine configuration derived from the arguments.
    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            pull_interval_bound: Duration::from_secs(self.pull_interval_secs),
            convergence_deadline: Duration::from_secs(self.deadline_secs),
            topology_seed: self.seed,
            ..SimulationConfig::default()
        }
    }

    pub fn latency(&self) -> UniformLatency {
        UniformLatency::from_millis(self.latency_min_ms, self.latency_max_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::try_parse_from(["gossip-sim"]).unwrap();

        assert_eq!(config.commands, PathBuf::from("commands.txt"));
        assert_eq!(config.results, PathBuf::from("results.txt"));
        assert!(!config.no_stdin);

        let simulation = config.simulation_config();
        assert_eq!(simulation.pull_interval_bound, Duration::from_secs(45));
        assert_eq!(simulation.convergence_deadline, Duration::from_secs(90));
        assert_eq!(simulation.topology_seed, None);
        assert_eq!(
            config.latency().bounds(),
            (Duration::from_millis(40), Duration::from_millis(600))
        );
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::try_parse_from([
            "gossip-sim",
            "--commands",
            "batch.txt",
            "--pull-interval-secs",
            "5",
            "--deadline-secs",
            "30",
            "--seed",
            "9",
            "--no-stdin",
        ])
        .unwrap();

        assert_eq!(config.commands, PathBuf::from("batch.txt"));
        assert!(config.no_stdin);

        let simulation = config.simulation_config();
        assert_eq!(simulation.pull_interval_bound, Duration::from_secs(5));
        assert_eq!(simulation.convergence_deadline, Duration::from_secs(30));
        assert_eq!(simulation.topology_seed, Some(9));
    }

    #[test]
    fn test_zero_pull_interval_rejected() {
        assert!(RuntimeConfig::try_parse_from(["gossip-sim", "--pull-interval-secs", "0"]).is_err());
    }

    #[test]
    fn test_command_definition() {
        use clap::CommandFactory;
        RuntimeConfig::command().debug_assert();
    }
}
