//! Completion delegate contract
//!
//! A sending controller reports the outcome of its flow exactly once through
//! a [`CompletionHandle`]. The handle forwards to the host's
//! [`SendingCompletionDelegate`]; the host's shared implementation is
//! [`CompletionHub`], which turns notifications into [`CompletionEvent`]s on
//! a channel the host drains on its own task.

use crate::channel::Channel;
use crate::errors::SendError;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How a send attempt ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The invite went out to `recipients` contacts
    Sent { recipients: usize },
    /// The user backed out; not an error
    Canceled,
    /// The channel could not deliver the invite
    Failed(SendError),
}

impl SendOutcome {
    /// Only `Failed` counts as an error; cancellation never does
    pub fn is_error(&self) -> bool {
        matches!(self, SendOutcome::Failed(_))
    }

    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }
}

impl fmt::Display for SendOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOutcome::Sent { recipients } => write!(f, "sent to {} recipient(s)", recipients),
            SendOutcome::Canceled => write!(f, "canceled"),
            SendOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

/// Receiver of send outcomes
///
/// Implementations must not block; they run on whatever task finished the
/// sending flow.
pub trait SendingCompletionDelegate: Send + Sync {
    fn invite_sending_completed(&self, channel: &Channel, outcome: SendOutcome);
}

/// Single-fire link from one sending controller to the delegate
///
/// Consumed by [`complete`](Self::complete). If the controller is dropped
/// without resolving it, the delegate receives `Canceled`.
pub struct CompletionHandle {
    channel: Channel,
    delegate: Option<Arc<dyn SendingCompletionDelegate>>,
}

impl CompletionHandle {
    pub fn new(channel: Channel, delegate: Arc<dyn SendingCompletionDelegate>) -> Self {
        Self {
            channel,
            delegate: Some(delegate),
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Report the outcome of the send flow
    pub fn complete(mut self, outcome: SendOutcome) {
        self.fire(outcome);
    }

    fn fire(&mut self, outcome: SendOutcome) {
        if let Some(delegate) = self.delegate.take() {
            debug!(channel = %self.channel, outcome = %outcome, "Send flow completed");
            delegate.invite_sending_completed(&self.channel, outcome);
        }
    }
}

impl Drop for CompletionHandle {
    fn drop(&mut self) {
        if self.delegate.is_some() {
            warn!(channel = %self.channel, "Sending flow dismissed without an outcome");
            self.fire(SendOutcome::Canceled);
        }
    }
}

impl fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("channel", &self.channel)
            .field("resolved", &self.delegate.is_none())
            .finish()
    }
}

/// One send outcome as seen by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionEvent {
    pub channel: Channel,
    pub outcome: SendOutcome,
}

/// Shared delegate that queues outcomes for the host
#[derive(Debug, Clone)]
pub struct CompletionHub {
    tx: mpsc::UnboundedSender<CompletionEvent>,
}

impl CompletionHub {
    pub fn new() -> (Self, CompletionEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, CompletionEvents { rx })
    }
}

impl SendingCompletionDelegate for CompletionHub {
    fn invite_sending_completed(&self, channel: &Channel, outcome: SendOutcome) {
        match &outcome {
            SendOutcome::Failed(e) => warn!(channel = %channel, error = %e, "Invite send failed"),
            _ => info!(channel = %channel, outcome = %outcome, "Invite send finished"),
        }

        let event = CompletionEvent {
            channel: channel.clone(),
            outcome,
        };
        if self.tx.send(event).is_err() {
            debug!(channel = %channel, "No host listening for completion events");
        }
    }
}

/// Host side of a [`CompletionHub`]
#[derive(Debug)]
pub struct CompletionEvents {
    rx: mpsc::UnboundedReceiver<CompletionEvent>,
}

impl CompletionEvents {
    /// Wait for the next outcome; `None` once every hub clone is gone
    pub async fn next(&mut self) -> Option<CompletionEvent> {
        self.rx.recv().await
    }

    /// Take an outcome if one is already queued
    pub fn try_next(&mut self) -> Option<CompletionEvent> {
        self.rx.try_recv().ok()
    }
}
