//! Gossip activity counters and the convergence wait.
//!
//! Three counters are shared by every node task and the controller:
//!
//! - `active_gossip`: nodes currently processing a push
//! - `backlog`: messages sent but not yet fully consumed, including fan-out
//!   forwards and pull replies
//! - `consensus`: cumulative count of version-increase events. This is an
//!   event counter, not a count of distinct converged nodes; it can exceed
//!   the node count when a node updates more than once.
//!
//! Updates are lock-free and snapshots are best-effort, not serializable.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::ConvergenceReport;

/// Shortest tick the wait loop will use.
const MIN_POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Point-in-time copy of the counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvergenceSnapshot {
    pub active_gossip: i64,
    pub backlog: i64,
    pub consensus: i64,
}

impl ConvergenceSnapshot {
    /// No node is processing and no message is in flight.
    pub fn is_quiescent(&self) -> bool {
        self.active_gossip == 0 && self.backlog == 0
    }
}

/// Shared gossip counters. One value per controller, passed to every node
/// task by `Arc`.
#[derive(Debug, Default)]
pub struct ConvergenceState {
    active_gossip: AtomicI64,
    backlog: AtomicI64,
    consensus: AtomicI64,
}

impl ConvergenceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A node started processing a push.
    pub fn gossip_started(&self) {
        self.active_gossip.fetch_add(1, Ordering::AcqRel);
    }

    /// A node finished processing a push.
    pub fn gossip_finished(&self) {
        self.active_gossip.fetch_sub(1, Ordering::AcqRel);
    }

    /// A message was put in flight.
    pub fn message_sent(&self) {
        self.backlog.fetch_add(1, Ordering::AcqRel);
    }

    /// A message was fully consumed (or could not be delivered).
    pub fn message_consumed(&self) {
        self.backlog.fetch_sub(1, Ordering::AcqRel);
    }

    /// A node raised its version.
    pub fn record_version_bump(&self) {
        self.consensus.fetch_add(1, Ordering::AcqRel);
    }

    /// Cumulative version-increase events since the last reset.
    pub fn consensus_events(&self) -> i64 {
        self.consensus.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> ConvergenceSnapshot {
        ConvergenceSnapshot {
            active_gossip: self.active_gossip.load(Ordering::Acquire),
            backlog: self.backlog.load(Ordering::Acquire),
            consensus: self.consensus.load(Ordering::Acquire),
        }
    }

    pub fn is_quiescent(&self) -> bool {
        self.snapshot().is_quiescent()
    }

    /// Zero all counters. Called at teardown and on explicit reset only.
    pub fn reset(&self) {
        self.active_gossip.store(0, Ordering::Release);
        self.backlog.store(0, Ordering::Release);
        self.consensus.store(0, Ordering::Release);
    }

    /// Wait until gossip activity stops, counting consensus events from the
    /// current counter value.
    pub async fn wait_for_convergence(
        &self,
        node_count: usize,
        deadline: Duration,
        poll_interval: Duration,
    ) -> ConvergenceReport {
        let baseline = self.consensus_events();
        self.wait_for_convergence_from(baseline, node_count, deadline, poll_interval)
            .await
    }

    /// Wait until gossip activity stops.
    ///
    /// Polls every `poll_interval`. Consensus is recorded at the first poll
    /// that sees at least `node_count` version-bump events since `baseline`.
    /// Several nodes can bump between two polls, so the count may overshoot
    /// the target. Polling continues until quiescence. Gives up once more than
    /// `deadline` has elapsed, reporting the round as timed out.
    pub async fn wait_for_convergence_from(
        &self,
        baseline: i64,
        node_count: usize,
        deadline: Duration,
        poll_interval: Duration,
    ) -> ConvergenceReport {
        let start = Instant::now();
        let target = i64::try_from(node_count).unwrap_or(i64::MAX);
        let mut ticker = tokio::time::interval(poll_interval.max(MIN_POLL_INTERVAL));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut time_to_consensus = None;
        loop {
            ticker.tick().await;
            let snapshot = self.snapshot();
            let elapsed = start.elapsed();

            if time_to_consensus.is_none() && snapshot.consensus - baseline >= target {
                debug!(elapsed_ms = elapsed.as_millis() as u64, "Consensus reached");
                time_to_consensus = Some(elapsed);
            }

            if snapshot.is_quiescent() {
                return ConvergenceReport {
                    consensus_reached: time_to_consensus.is_some(),
                    time_to_consensus,
                    time_to_quiescence: elapsed,
                    timed_out: false,
                };
            }

            if elapsed > deadline {
                warn!(
                    active_gossip = snapshot.active_gossip,
                    backlog = snapshot.backlog,
                    deadline_ms = deadline.as_millis() as u64,
                    "Gave up waiting for quiescence"
                );
                return ConvergenceReport {
                    consensus_reached: time_to_consensus.is_some(),
                    time_to_consensus,
                    time_to_quiescence: elapsed,
                    timed_out: true,
                };
            }
        }
    }
}
