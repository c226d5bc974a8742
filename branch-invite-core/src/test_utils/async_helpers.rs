//! Async test helpers
//!
//! Deadlines around loads and completion events so a broken provider fails
//! a test instead of hanging it.

use crate::callback::{LoadCallback, LoadStatus};
use crate::completion::{CompletionEvent, CompletionEvents};
use crate::provider::InviteContactProvider;
use std::future::Future;
use tokio::time::{timeout, Duration};

/// Default timeout duration for tests (5 seconds)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Short timeout for tests that expect nothing to arrive (100ms)
pub const SHORT_TEST_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvTimeoutError {
    Timeout,
    Closed,
}

impl std::fmt::Display for RecvTimeoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecvTimeoutError::Timeout => write!(f, "receive operation timed out"),
            RecvTimeoutError::Closed => write!(f, "channel closed"),
        }
    }
}

impl std::error::Error for RecvTimeoutError {}

/// Wait for the next completion event
pub async fn recv_event_timeout(
    events: &mut CompletionEvents,
    duration: Duration,
) -> Result<CompletionEvent, RecvTimeoutError> {
    timeout(duration, events.next())
        .await
        .map_err(|_| RecvTimeoutError::Timeout)?
        .ok_or(RecvTimeoutError::Closed)
}

/// Assert that no further completion event arrives within `duration`
pub async fn assert_no_more_events(events: &mut CompletionEvents, duration: Duration) {
    if let Ok(event) = recv_event_timeout(events, duration).await {
        panic!("Expected no further completion, got {:?}", event);
    }
}

/// Run one load of `provider` and wait for its callback
pub async fn load_with_timeout<P>(provider: &P, duration: Duration) -> LoadStatus
where
    P: InviteContactProvider + ?Sized,
{
    let (callback, pending) = LoadCallback::new(provider.channel());
    provider.load_contacts(callback);
    assert_completes_within(duration, pending).await
}

/// Helper to assert a future completes within duration
pub async fn assert_completes_within<F, T>(duration: Duration, future: F) -> T
where
    F: Future<Output = T>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => panic!("Future did not complete within {:?}", duration),
    }
}
