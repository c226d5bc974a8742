//! One-shot load callback
//!
//! [`LoadCallback`] is what a provider receives in
//! [`load_contacts`](crate::provider::InviteContactProvider::load_contacts).
//! Resolving it consumes it, so it cannot fire twice. Dropping it unresolved
//! fires [`LoadError::Abandoned`], so it cannot fire zero times either.
//!
//! ```text
//! host                                  provider task
//!  |  LoadCallback::new() -> (cb, pending)   |
//!  |---------------- cb -------------------->|
//!  |  pending.await                          |  ... slow work ...
//!  |<----------- cb.complete(status) --------|
//! ```

use crate::channel::Channel;
use crate::errors::LoadError;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Outcome of one load attempt
pub type LoadStatus = Result<(), LoadError>;

enum Sink {
    Pending(oneshot::Sender<LoadStatus>),
    Function(Box<dyn FnOnce(LoadStatus) + Send>),
}

/// Single-fire completion handle for one `load_contacts` call
pub struct LoadCallback {
    channel: Channel,
    sink: Option<Sink>,
}

impl LoadCallback {
    /// Create a callback paired with a future that resolves when it fires
    pub fn new(channel: Channel) -> (Self, PendingLoad) {
        let (tx, rx) = oneshot::channel();
        let callback = Self {
            channel,
            sink: Some(Sink::Pending(tx)),
        };
        (callback, PendingLoad { rx })
    }

    /// Create a callback that runs `f` when it fires
    pub fn from_fn<F>(channel: Channel, f: F) -> Self
    where
        F: FnOnce(LoadStatus) + Send + 'static,
    {
        Self {
            channel,
            sink: Some(Sink::Function(Box::new(f))),
        }
    }

    /// Channel of the provider this callback was issued to
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Resolve the load
    pub fn complete(mut self, status: LoadStatus) {
        self.fire(status);
    }

    pub fn succeed(self) {
        self.complete(Ok(()));
    }

    pub fn fail(self, error: LoadError) {
        self.complete(Err(error));
    }

    fn fire(&mut self, status: LoadStatus) {
        match self.sink.take() {
            Some(Sink::Pending(tx)) => {
                if tx.send(status).is_err() {
                    debug!(channel = %self.channel, "Load result dropped, host stopped waiting");
                }
            }
            Some(Sink::Function(f)) => f(status),
            None => {}
        }
    }
}

impl Drop for LoadCallback {
    fn drop(&mut self) {
        if self.sink.is_some() {
            warn!(channel = %self.channel, "Load callback dropped unresolved");
            self.fire(Err(LoadError::Abandoned));
        }
    }
}

impl std::fmt::Debug for LoadCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadCallback")
            .field("channel", &self.channel)
            .field("resolved", &self.sink.is_none())
            .finish()
    }
}

/// Host side of a [`LoadCallback`]
#[derive(Debug)]
pub struct PendingLoad {
    rx: oneshot::Receiver<LoadStatus>,
}

impl Future for PendingLoad {
    type Output = LoadStatus;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.unwrap_or(Err(LoadError::Abandoned)))
    }
}
