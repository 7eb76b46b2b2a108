//! Results file writer.
//!
//! Line-oriented, one record per unicast round, optionally followed by the
//! output of a STATUS command:
//!
//! ```text
//! Starting gossip simulation
//! [START] 10 Neighbours
//! Beginning Gossip for: 100 nodes
//! NeighbourList Size: 10
//! Time for consensus in Milliseconds: 1840
//! Time for gossip to end in Milliseconds: 2311
//! [END]
//! Version: 1 Count: 100
//! Total Messages Sent Is: 990
//! ```
//!
//! Percent-sized runs write `[START] <p> %` and an extra
//! `NeighbourList Percentage: <p> %` line before the list size.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use gossip_engine::{ConvergenceReport, NeighborPolicy, StatusReport};

pub const SESSION_BANNER: &str = "Starting gossip simulation";
pub const START: &str = "[START]";
pub const END: &str = "[END]";
pub const BEGINNING: &str = "Beginning Gossip for:";
pub const LIST_PERCENTAGE: &str = "NeighbourList Percentage:";
pub const LIST_SIZE: &str = "NeighbourList Size:";
pub const CONSENSUS_TIME: &str = "Time for consensus in Milliseconds:";
pub const CONSENSUS_MISSED: &str = "Time for consensus: Not Reached";
pub const GOSSIP_TIME: &str = "Time for gossip to end in Milliseconds:";
pub const VERSION: &str = "Version:";
pub const TOTAL_MESSAGES: &str = "Total Messages Sent Is:";

/// Parameters of a unicast round, written before it starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundHeader {
    pub nodes: usize,
    pub policy: NeighborPolicy,
    /// Neighbor list length actually used by the topology.
    pub list_size: usize,
}

impl RoundHeader {
    /// `[START] ...` line, also echoed to the console.
    pub fn start_line(&self) -> String {
        match self.policy {
            NeighborPolicy::Flat(count) => format!("{START} {count} Neighbours"),
            NeighborPolicy::Percent(pct) => format!("{START} {pct} %"),
        }
    }
}

pub struct ResultsLog<W: Write> {
    writer: W,
}

impl ResultsLog<BufWriter<File>> {
    /// Create (or truncate) the results file.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> ResultsLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn begin_session(&mut self) -> io::Result<()> {
        writeln!(self.writer, "{SESSION_BANNER}")?;
        self.writer.flush()
    }

    pub fn round_started(&mut self, header: &RoundHeader) -> io::Result<()> {
        writeln!(self.writer, "{}", header.start_line())?;
        writeln!(self.writer, "{BEGINNING} {} nodes", header.nodes)?;
        if let NeighborPolicy::Percent(pct) = header.policy {
            writeln!(self.writer, "{LIST_PERCENTAGE} {pct} %")?;
        }
        writeln!(self.writer, "{LIST_SIZE} {}", header.list_size)?;
        self.writer.flush()
    }

    pub fn round_finished(&mut self, report: &ConvergenceReport) -> io::Result<()> {
        match report.time_to_consensus {
            Some(elapsed) => writeln!(self.writer, "{CONSENSUS_TIME} {}", elapsed.as_millis())?,
            None => writeln!(self.writer, "{CONSENSUS_MISSED}")?,
        }
        writeln!(
            self.writer,
            "{GOSSIP_TIME} {}",
            report.time_to_quiescence.as_millis()
        )?;
        writeln!(self.writer, "{END}")?;
        self.writer.flush()
    }

    pub fn status(&mut self, status: &StatusReport) -> io::Result<()> {
        for line in status_lines(status) {
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// STATUS output, shared by the console and the results file.
pub fn status_lines(status: &StatusReport) -> Vec<String> {
    status
        .buckets
        .iter()
        .map(|bucket| format!("{VERSION} {} Count: {}", bucket.version, bucket.count))
        .chain(std::iter::once(format!(
            "{TOTAL_MESSAGES} {}",
            status.total_messages
        )))
        .collect()
}
