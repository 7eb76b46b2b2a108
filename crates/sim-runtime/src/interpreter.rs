//! Command interpreter.
//!
//! Maps each [`Command`] onto the network controller, echoes progress to the
//! console and appends unicast rounds and STATUS output to the results log.
//! Operations that have no effect are reported as `[ERROR]` lines and never
//! stop the session.

use std::io::{self, Write};
use std::time::Duration;

use gossip_engine::{
    GossipError, GossipNetworkApi, GossipNetworkService, LatencyModel, NeighborPolicy, NodeIndex,
    TopologyBuilder,
};
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

use crate::command::{Command, CommandParseError, SizingMode};
use crate::results::{status_lines, ResultsLog, RoundHeader, SESSION_BANNER};
use crate::source::CommandSource;

/// Both neighbor sizing values; `mode` picks the one used at spawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NeighborSizing {
    pub flat: NeighborPolicy,
    pub percent: NeighborPolicy,
    pub mode: SizingMode,
}

impl Default for NeighborSizing {
    fn default() -> Self {
        Self {
            flat: NeighborPolicy::Flat(10),
            percent: NeighborPolicy::Percent(5),
            mode: SizingMode::Flat,
        }
    }
}

impl NeighborSizing {
    pub fn policy(&self) -> NeighborPolicy {
        match self.mode {
            SizingMode::Flat => self.flat,
            SizingMode::Percent => self.percent,
        }
    }
}

pub struct Interpreter<L: LatencyModel, W: Write, O: Write> {
    service: GossipNetworkService<L>,
    results: ResultsLog<W>,
    console: O,
    sizing: NeighborSizing,
    /// Sizing in effect when the running network was spawned.
    spawned_policy: Option<NeighborPolicy>,
}

impl<L: LatencyModel, W: Write, O: Write> Interpreter<L, W, O> {
    pub fn new(service: GossipNetworkService<L>, results: ResultsLog<W>, console: O) -> Self {
        let sizing = NeighborSizing::default();
        service.update_neighbor_policy(sizing.policy());

        Self {
            service,
            results,
            console,
            sizing,
            spawned_policy: None,
        }
    }

    pub fn service(&self) -> &GossipNetworkService<L> {
        &self.service
    }

    pub fn sizing(&self) -> NeighborSizing {
        self.sizing
    }

    /// Execute every command from `source`. Returns the number of commands
    /// executed; unparseable lines are logged and skipped.
    pub async fn run<R: AsyncBufRead + Unpin>(
        &mut self,
        source: &mut CommandSource<R>,
    ) -> io::Result<usize> {
        self.results.begin_session()?;
        writeln!(self.console, "{SESSION_BANNER}")?;

        let mut executed = 0;
        while let Some(line) = source.next_line().await {
            match line.parse::<Command>() {
                Ok(command) => {
                    self.execute(command).await?;
                    executed += 1;
                }
                Err(CommandParseError::Empty) => {}
                Err(e) => warn!(line = %line.trim(), error = %e, "Ignoring command"),
            }
        }

        Ok(executed)
    }

    pub async fn execute(&mut self, command: Command) -> io::Result<()> {
        match command {
            Command::Spawn { size, kind } => {
                match self.service.spawn_network(size, kind).await {
                    Ok(()) => {
                        self.spawned_policy = Some(self.sizing.policy());
                        self.complete(command)
                    }
                    Err(e) => self.failed(command, &e),
                }
            }

            Command::Broadcast => match self.service.broadcast().await {
                Ok(version) => {
                    info!(version, "Broadcast sent");
                    self.complete(command)
                }
                Err(e) => self.failed(command, &e),
            },

            Command::Unicast { node } => self.unicast(node).await,

            Command::Kill => {
                if self.service.teardown_network().await {
                    self.spawned_policy = None;
                    self.complete(command)
                } else {
                    self.failed(command, &GossipError::NoNetwork)
                }
            }

            Command::Status => match self.service.status().await {
                Ok(status) => {
                    for line in status_lines(&status) {
                        writeln!(self.console, "{line}")?;
                    }
                    self.results.status(&status)?;
                    self.complete(command)
                }
                Err(e) => self.failed(command, &e),
            },

            Command::Routines => {
                let live = self.service.live_tasks().await;
                writeln!(self.console, "Current number of node tasks running is: {live}")?;
                self.complete(command)
            }

            Command::UpdateListPercent(pct) => {
                self.sizing.percent = NeighborPolicy::percent(pct);
                self.apply_sizing();
                self.complete(command)
            }

            Command::UpdateListSize(count) => {
                self.sizing.flat = NeighborPolicy::flat(count);
                self.apply_sizing();
                self.complete(command)
            }

            Command::UpdateListType(mode) => {
                self.sizing.mode = mode;
                self.apply_sizing();
                self.complete(command)
            }

            Command::Reset => match self.service.reset().await {
                Ok(()) => self.complete(command),
                Err(e) => self.failed(command, &e),
            },

            Command::UpdateIntervalTime(secs) => {
                match self.service.update_pull_interval(Duration::from_secs(secs)) {
                    Ok(()) => self.complete(command),
                    Err(e) => self.failed(command, &e),
                }
            }
        }
    }

    /// Tear down any running network and hand back the writers.
    pub async fn finish(mut self) -> io::Result<(W, O)> {
        self.service.teardown_network().await;
        self.console.flush()?;
        Ok((self.results.into_inner(), self.console))
    }

    async fn unicast(&mut self, node: NodeIndex) -> io::Result<()> {
        let command = Command::Unicast { node };
        let nodes = self.service.network_size().await;
        let Some(policy) = self.spawned_policy.filter(|_| nodes > 0) else {
            return self.failed(command, &GossipError::NoNetwork);
        };
        if node >= nodes {
            let error = GossipError::NodeIndexOutOfRange { index: node, size: nodes };
            return self.failed(command, &error);
        }

        let header = RoundHeader {
            nodes,
            policy,
            list_size: TopologyBuilder::new(policy).list_size(nodes),
        };
        writeln!(self.console, "{}", header.start_line())?;
        self.results.round_started(&header)?;

        match self.service.unicast(node).await {
            Ok(report) => {
                self.results.round_finished(&report.convergence)?;
                self.complete(command)
            }
            Err(e) => self.failed(command, &e),
        }
    }

    fn apply_sizing(&self) {
        self.service.update_neighbor_policy(self.sizing.policy());
    }

    fn complete(&mut self, command: Command) -> io::Result<()> {
        info!(command = command.name(), "Command complete");
        writeln!(self.console, "[COMPLETE] {}", command.name())
    }

    fn failed(&mut self, command: Command, error: &GossipError) -> io::Result<()> {
        warn!(command = command.name(), error = %error, "Command had no effect");
        writeln!(self.console, "[ERROR] {} - {}", command.name(), error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gossip_engine::{FixedLatency, SimulationConfig};
    use tokio::io::BufReader;

    type TestInterpreter = Interpreter<FixedLatency, Vec<u8>, Vec<u8>>;

    fn create_test_interpreter() -> TestInterpreter {
        let config = SimulationConfig {
            pull_interval_bound: Duration::from_secs(1),
            topology_seed: Some(3),
            ..SimulationConfig::default()
        };
        let service =
            GossipNetworkService::with_latency(config, FixedLatency(Duration::from_millis(25)));
        Interpreter::new(service, ResultsLog::new(Vec::new()), Vec::new())
    }

    async fn run_script(lines: &[&str]) -> (String, String) {
        let mut interpreter = create_test_interpreter();
        let mut source: CommandSource<BufReader<&[u8]>> =
            CommandSource::new(lines.iter().map(|l| l.to_string()), None);

        interpreter.run(&mut source).await.unwrap();
        let (results, console) = interpreter.finish().await.unwrap();
        (
            String::from_utf8(results).unwrap(),
            String::from_utf8(console).unwrap(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_unicast_session() {
        let (results, console) =
            run_script(&["SPAWN 10 PUSH", "UNICAST 0", "STATUS", "ROUTINES", "KILL"]).await;

        assert!(console.contains("[COMPLETE] SPAWN"));
        assert!(console.contains("[START] 10 Neighbours"));
        assert!(console.contains("[COMPLETE] UNICAST"));
        assert!(console.contains("Version: 1 Count: 10"));
        assert!(console.contains("Total Messages Sent Is: 90"));
        assert!(console.contains("Current number of node tasks running is: 10"));
        assert!(console.contains("[COMPLETE] KILL"));

        let lines: Vec<&str> = results.lines().collect();
        assert_eq!(lines[0], "Starting gossip simulation");
        assert_eq!(lines[1], "[START] 10 Neighbours");
        assert_eq!(lines[2], "Beginning Gossip for: 10 nodes");
        assert_eq!(lines[3], "NeighbourList Size: 10");
        assert!(lines[4].starts_with("Time for consensus in Milliseconds: "));
        assert!(lines[5].starts_with("Time for gossip to end in Milliseconds: "));
        assert_eq!(lines[6], "[END]");
        assert_eq!(lines[7], "Version: 1 Count: 10");
        assert_eq!(lines[8], "Total Messages Sent Is: 90");
    }

    #[tokio::test(start_paused = true)]
    async fn test_operations_without_network_report_errors() {
        let (results, console) =
            run_script(&["BROADCAST", "UNICAST 0", "STATUS", "KILL", "RESET"]).await;

        assert!(console.contains("[ERROR] BROADCAST - No network spawned"));
        assert!(console.contains("[ERROR] UNICAST - No network spawned"));
        assert!(console.contains("[ERROR] STATUS - No network spawned"));
        assert!(console.contains("[ERROR] KILL - No network spawned"));
        assert!(console.contains("[ERROR] RESET - No network spawned"));
        assert!(!console.contains("[COMPLETE]"));
        assert_eq!(results, "Starting gossip simulation\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_out_of_range_unicast_writes_no_record() {
        let (results, console) = run_script(&["SPAWN 4 PUSH", "UNICAST 4"]).await;

        assert!(console.contains("[ERROR] UNICAST - Node index 4 out of range for 4 nodes"));
        assert!(!results.contains("[START]"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_percent_sizing_header() {
        let (results, _) = run_script(&[
            "UPDATENLISTPERCENT 250",
            "UPDATENLISTTYPE Percent",
            "SPAWN 20 PUSH&PULL",
            "UNICAST 3",
        ])
        .await;

        assert!(results.contains("[START] 100 %\n"));
        assert!(results.contains("Beginning Gossip for: 20 nodes\n"));
        assert!(results.contains("NeighbourList Percentage: 100 %\n"));
        assert!(results.contains("NeighbourList Size: 20\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_header_uses_sizing_at_spawn() {
        let (results, _) = run_script(&["SPAWN 6 PUSH", "UPDATENLISTSIZE 2", "UNICAST 0"]).await;

        assert!(results.contains("[START] 10 Neighbours\n"));
        assert!(results.contains("NeighbourList Size: 6\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sizing_updates_are_clamped() {
        let mut interpreter = create_test_interpreter();

        interpreter.execute(Command::UpdateListSize(-7)).await.unwrap();
        interpreter.execute(Command::UpdateListPercent(0)).await.unwrap();

        assert_eq!(interpreter.sizing().flat, NeighborPolicy::Flat(1));
        assert_eq!(interpreter.sizing().percent, NeighborPolicy::Percent(1));
        assert_eq!(
            interpreter.service().config().neighbor_policy,
            NeighborPolicy::Flat(1)
        );

        interpreter
            .execute(Command::UpdateListType(SizingMode::Percent))
            .await
            .unwrap();
        assert_eq!(
            interpreter.service().config().neighbor_policy,
            NeighborPolicy::Percent(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_update() {
        let (_, console) = run_script(&["UPDATEINTERVALTIME 0", "UPDATEINTERVALTIME 7"]).await;

        assert!(console.contains("[ERROR] UPDATEINTERVALTIME - Pull interval bound must be non-zero"));
        assert!(console.contains("[COMPLETE] UPDATEINTERVALTIME"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_lines_are_skipped() {
        let mut interpreter = create_test_interpreter();
        let lines = ["", "BOGUS", "SPAWN ten PUSH", "SPAWN 2 PUSH"];
        let mut source: CommandSource<BufReader<&[u8]>> =
            CommandSource::new(lines.iter().map(|l| l.to_string()), None);

        let executed = interpreter.run(&mut source).await.unwrap();

        assert_eq!(executed, 1);
        assert_eq!(interpreter.service().network_size().await, 2);
    }
}
