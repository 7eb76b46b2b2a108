//! # Node Agent
//!
//! One task per node. The task parks on whichever input becomes ready first:
//! the push mailbox, the pull timer (push-pull nodes only) or the pull-request
//! mailbox. Readiness races are resolved by `tokio::select!` at random.
//!
//! ```text
//!            ┌──────────── RUNNING ─────────────┐
//!  push ───→ │ sleep(latency) → apply → fan-out │ ──Poison──→ TERMINATED
//!  timer ──→ │ pull request to every neighbor   │
//!  request → │ sleep(latency) → reply if newer  │
//!            └──────────────────────────────────┘
//! ```
//!
//! Latency sleeps are not interruptible; a poison pill is only seen at the
//! next wait point.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, trace};

use crate::domain::{
    should_forward, should_reply, ConvergenceState, NodeIndex, NodeKind, NodeState, Version,
};
use crate::mailbox::{Inbox, Mailbox, PullRequest, PushMessage};
use crate::ports::outbound::LatencyModel;

pub(crate) struct NodeAgent<L: LatencyModel> {
    pub(crate) id: NodeIndex,
    pub(crate) kind: NodeKind,
    pub(crate) neighbors: Vec<NodeIndex>,
    /// This node's own mailbox: identity check and pull reply path.
    pub(crate) own: Mailbox,
    pub(crate) inbox: Inbox,
    /// Mailboxes of every node in the generation, by arena index.
    pub(crate) directory: Arc<[Mailbox]>,
    pub(crate) state: Arc<NodeState>,
    pub(crate) convergence: Arc<ConvergenceState>,
    pub(crate) latency: Arc<L>,
    pub(crate) pull_interval_bound: Duration,
}

impl<L: LatencyModel> NodeAgent<L> {
    pub(crate) async fn run(mut self) {
        loop {
            let pull_delay = self.next_pull_delay();

            tokio::select! {
                message = self.inbox.push.recv() => {
                    let Some(message) = message else { break };
                    if self.handle_push(message).await.is_break() {
                        break;
                    }
                }
                () = tokio::time::sleep(pull_delay), if self.kind.pulls() => {
                    self.request_pull();
                }
                Some(request) = self.inbox.pull.recv() => {
                    self.handle_pull_request(request).await;
                }
            }
        }

        debug!(
            node = self.id,
            version = self.state.version(),
            updates = self.state.updates(),
            "Node terminated"
        );
    }

    /// Delay before the next pull, uniform in `[0, bound)`. Re-drawn every
    /// time the node returns to its wait point.
    fn next_pull_delay(&self) -> Duration {
        if !self.kind.pulls() || self.pull_interval_bound.is_zero() {
            return Duration::ZERO;
        }
        rand::thread_rng().gen_range(Duration::ZERO..self.pull_interval_bound)
    }

    async fn handle_push(&self, message: PushMessage) -> ControlFlow<()> {
        self.convergence.gossip_started();

        let version = match message {
            PushMessage::Poison => {
                self.convergence.gossip_finished();
                return ControlFlow::Break(());
            }
            PushMessage::Version(version) => version,
        };

        if version > 0 {
            tokio::time::sleep(self.latency.sample()).await;

            let previous = self.state.version();
            if should_forward(version, previous) && self.state.advance_to(version) {
                self.convergence.record_version_bump();
                debug!(node = self.id, from = previous, to = version, "Version applied");
                self.fan_out(version).await;
            }
        }

        self.convergence.message_consumed();
        self.convergence.gossip_finished();
        ControlFlow::Continue(())
    }

    async fn fan_out(&self, version: Version) {
        for &index in &self.neighbors {
            let Some(neighbor) = self.directory.get(index) else {
                continue;
            };
            // Uniform sampling may list the node itself
            if neighbor.same_node(&self.own) {
                continue;
            }

            self.convergence.message_sent();
            if neighbor.push(PushMessage::Version(version)).await {
                self.state.record_update();
            } else {
                self.convergence.message_consumed();
            }
        }
    }

    fn request_pull(&self) {
        let version = self.state.version();

        for &index in &self.neighbors {
            let Some(neighbor) = self.directory.get(index) else {
                continue;
            };
            if neighbor.same_node(&self.own) {
                continue;
            }

            let request = PullRequest {
                version,
                reply_to: self.own.clone(),
            };
            if let Err(e) = neighbor.try_pull(request) {
                trace!(node = self.id, neighbor = index, error = %e, "Pull request dropped");
            }
        }
    }

    async fn handle_pull_request(&self, request: PullRequest) {
        tokio::time::sleep(self.latency.sample()).await;

        let current = self.state.version();
        if !should_reply(request.version, current) {
            return;
        }

        self.convergence.message_sent();
        if request.reply_to.push(PushMessage::Version(current)).await {
            self.state.record_update();
        } else {
            self.convergence.message_consumed();
        }
    }
}
