//! Results file parsing and aggregation.
//!
//! Reads the records written by [`ResultsLog`](crate::results::ResultsLog)
//! and summarizes them per (node count, neighbor list size).

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::iter::Peekable;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

use crate::results::{
    BEGINNING, CONSENSUS_MISSED, CONSENSUS_TIME, END, GOSSIP_TIME, LIST_PERCENTAGE, LIST_SIZE,
    START, TOTAL_MESSAGES, VERSION,
};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read results: {0}")]
    Io(#[from] std::io::Error),

    #[error("Line {line}: expected {expected:?}, found {found:?}")]
    Unexpected {
        line: usize,
        expected: &'static str,
        found: String,
    },

    #[error("Line {line}: invalid number in {content:?}")]
    InvalidNumber { line: usize, content: String },

    #[error("Results end inside a record (expected {expected:?})")]
    Truncated { expected: &'static str },
}

/// One unicast round as recorded in the results file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunRecord {
    pub nodes: usize,
    pub list_size: usize,
    pub percentage: Option<u8>,
    /// `None` if consensus was not reached.
    pub consensus_ms: Option<u64>,
    pub gossip_ms: u64,
    /// `(version, count)` pairs from the STATUS block that followed, if any.
    pub buckets: Vec<(u64, usize)>,
    pub total_messages: Option<u64>,
}

impl RunRecord {
    /// Nodes holding the highest reported version. Without a STATUS block,
    /// every node when consensus was reached and none otherwise.
    pub fn nodes_reached(&self) -> usize {
        match self.buckets.iter().max_by_key(|(version, _)| *version) {
            Some(&(_, count)) => count,
            None if self.consensus_ms.is_some() => self.nodes,
            None => 0,
        }
    }

    pub fn nodes_not_reached(&self) -> usize {
        self.nodes.saturating_sub(self.nodes_reached())
    }
}

fn number<T: FromStr>(line: usize, content: &str, value: &str) -> Result<T, ReportError> {
    value.trim().parse().map_err(|_| ReportError::InvalidNumber {
        line,
        content: content.to_string(),
    })
}

fn expect<'a, I>(
    lines: &mut I,
    prefix: &'static str,
) -> Result<(usize, &'a str, &'a str), ReportError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (line, content) = lines.next().ok_or(ReportError::Truncated { expected: prefix })?;
    let rest = content
        .strip_prefix(prefix)
        .ok_or_else(|| ReportError::Unexpected {
            line,
            expected: prefix,
            found: content.to_string(),
        })?;
    Ok((line, content, rest))
}

fn parse_record<'a, I>(lines: &mut Peekable<I>) -> Result<RunRecord, ReportError>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (line, content, rest) = expect(lines, BEGINNING)?;
    let nodes = number(line, content, rest.trim().trim_end_matches("nodes"))?;

    let percentage = match lines.peek() {
        Some((_, next)) if next.starts_with(LIST_PERCENTAGE) => {
            let (line, content, rest) = expect(lines, LIST_PERCENTAGE)?;
            Some(number(line, content, rest.trim().trim_end_matches('%'))?)
        }
        _ => None,
    };

    let (line, content, rest) = expect(lines, LIST_SIZE)?;
    let list_size = number(line, content, rest)?;

    let consensus_ms = match lines.peek() {
        Some((_, next)) if *next == CONSENSUS_MISSED => {
            lines.next();
            None
        }
        _ => {
            let (line, content, rest) = expect(lines, CONSENSUS_TIME)?;
            Some(number(line, content, rest)?)
        }
    };

    let (line, content, rest) = expect(lines, GOSSIP_TIME)?;
    let gossip_ms = number(line, content, rest)?;

    if matches!(lines.peek(), Some((_, next)) if *next == END) {
        lines.next();
    }

    Ok(RunRecord {
        nodes,
        list_size,
        percentage,
        consensus_ms,
        gossip_ms,
        buckets: Vec::new(),
        total_messages: None,
    })
}

/// Parse every record in a results file.
///
/// A STATUS block is attached to the closest preceding record that does not
/// have one yet. Other lines (the session banner, duplicate STATUS blocks)
/// are ignored.
pub fn parse_results(text: &str) -> Result<Vec<RunRecord>, ReportError> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(index, content)| (index + 1, content.trim()))
        .filter(|(_, content)| !content.is_empty())
        .peekable();

    let mut records: Vec<RunRecord> = Vec::new();
    while let Some((line, content)) = lines.next() {
        if content.starts_with(START) {
            records.push(parse_record(&mut lines)?);
        } else if let Some(rest) = content.strip_prefix(VERSION) {
            let (version, count) = rest.split_once("Count:").ok_or_else(|| {
                ReportError::Unexpected {
                    line,
                    expected: "Count:",
                    found: content.to_string(),
                }
            })?;
            let bucket = (number(line, content, version)?, number(line, content, count)?);
            if let Some(record) = records.last_mut().filter(|r| r.total_messages.is_none()) {
                record.buckets.push(bucket);
            }
        } else if let Some(rest) = content.strip_prefix(TOTAL_MESSAGES) {
            let total = number(line, content, rest)?;
            if let Some(record) = records.last_mut().filter(|r| r.total_messages.is_none()) {
                record.total_messages = Some(total);
            }
        }
    }

    Ok(records)
}

/// Read and parse a results file.
pub fn load_results(path: &Path) -> Result<Vec<RunRecord>, ReportError> {
    parse_results(&std::fs::read_to_string(path)?)
}

/// Averages over every record sharing a node count and list size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupSummary {
    pub nodes: usize,
    pub list_size: usize,
    pub quantity: usize,
    pub consensus_hit_rate: f64,
    pub consensus_miss_rate: f64,
    /// Over rounds that reached consensus only.
    pub avg_consensus_ms: Option<f64>,
    pub avg_gossip_ms: f64,
    pub avg_nodes_reached: f64,
    pub avg_nodes_not_reached: f64,
    /// Over rounds followed by a STATUS block only.
    pub avg_messages_sent: Option<f64>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

pub fn aggregate(records: &[RunRecord]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<(usize, usize), Vec<&RunRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.nodes, record.list_size))
            .or_default()
            .push(record);
    }

    groups
        .into_iter()
        .map(|((nodes, list_size), group)| {
            let quantity = group.len();
            let hits = group.iter().filter(|r| r.consensus_ms.is_some()).count();
            let hit_rate = hits as f64 / quantity as f64;

            GroupSummary {
                nodes,
                list_size,
                quantity,
                consensus_hit_rate: hit_rate,
                consensus_miss_rate: 1.0 - hit_rate,
                avg_consensus_ms: mean(
                    group
                        .iter()
                        .filter_map(|r| r.consensus_ms)
                        .map(|ms| ms as f64),
                ),
                avg_gossip_ms: mean(group.iter().map(|r| r.gossip_ms as f64)).unwrap_or(0.0),
                avg_nodes_reached: mean(group.iter().map(|r| r.nodes_reached() as f64))
                    .unwrap_or(0.0),
                avg_nodes_not_reached: mean(group.iter().map(|r| r.nodes_not_reached() as f64))
                    .unwrap_or(0.0),
                avg_messages_sent: mean(
                    group
                        .iter()
                        .filter_map(|r| r.total_messages)
                        .map(|m| m as f64),
                ),
            }
        })
        .collect()
}

fn optional(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

/// Aligned text table, one row per group.
pub fn render_table(summaries: &[GroupSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>7} {:>10} {:>5} {:>7} {:>7} {:>14} {:>12} {:>9} {:>13} {:>12}",
        "Nodes",
        "Neighbours",
        "Qty",
        "Hit",
        "Miss",
        "Consensus ms",
        "Gossip ms",
        "Reached",
        "Not Reached",
        "Messages"
    );
    for s in summaries {
        let _ = writeln!(
            out,
            "{:>7} {:>10} {:>5} {:>7.3} {:>7.3} {:>14} {:>12.1} {:>9.1} {:>13.1} {:>12}",
            s.nodes,
            s.list_size,
            s.quantity,
            s.consensus_hit_rate,
            s.consensus_miss_rate,
            optional(s.avg_consensus_ms),
            s.avg_gossip_ms,
            s.avg_nodes_reached,
            s.avg_nodes_not_reached,
            optional(s.avg_messages_sent)
        );
    }
    out
}
