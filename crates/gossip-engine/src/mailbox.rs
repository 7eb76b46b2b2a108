//! Per-node bounded mailboxes.
//!
//! Every node owns two inbound queues: pushes (version values and the poison
//! pill) and pull requests. Delivery is FIFO per mailbox, fire-and-forget,
//! with no acknowledgement.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::Version;

/// Message delivered to a node's push mailbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PushMessage {
    /// A version offered to the node. `Version(0)` is a no-op.
    Version(Version),
    /// Terminate the node task; anything still queued is discarded.
    Poison,
}

/// Anti-entropy request: "send me your version if it is newer than mine".
#[derive(Clone, Debug)]
pub struct PullRequest {
    /// Requester's version when the request was produced.
    pub version: Version,
    /// Requester's mailbox, used for the reply.
    pub reply_to: Mailbox,
}

/// Sending half of a node's mailboxes.
#[derive(Clone, Debug)]
pub struct Mailbox {
    push: mpsc::Sender<PushMessage>,
    pull: mpsc::Sender<PullRequest>,
}

/// Receiving half, owned by the node task.
#[derive(Debug)]
pub(crate) struct Inbox {
    pub(crate) push: mpsc::Receiver<PushMessage>,
    pub(crate) pull: mpsc::Receiver<PullRequest>,
}

impl Mailbox {
    pub(crate) fn channel(capacity: usize) -> (Mailbox, Inbox) {
        let (push_tx, push_rx) = mpsc::channel(capacity);
        let (pull_tx, pull_rx) = mpsc::channel(capacity);
        (
            Mailbox {
                push: push_tx,
                pull: pull_tx,
            },
            Inbox {
                push: push_rx,
                pull: pull_rx,
            },
        )
    }

    /// Enqueue a push, waiting for room if the mailbox is full.
    ///
    /// Returns `false` if the node has terminated.
    pub async fn push(&self, message: PushMessage) -> bool {
        self.push.send(message).await.is_ok()
    }

    /// Enqueue a pull request without waiting.
    pub fn try_pull(&self, request: PullRequest) -> Result<(), TrySendError<PullRequest>> {
        self.pull.try_send(request)
    }

    /// Both handles address the same node.
    pub fn same_node(&self, other: &Mailbox) -> bool {
        self.push.same_channel(&other.push)
    }

    /// The owning node has terminated.
    pub fn is_closed(&self) -> bool {
        self.push.is_closed()
    }
}
