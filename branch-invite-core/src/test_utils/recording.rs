//! Completion delegate that records every notification

use crate::channel::Channel;
use crate::completion::{SendOutcome, SendingCompletionDelegate};
use parking_lot::Mutex;

/// Delegate keeping every (channel, outcome) it receives, in order
#[derive(Debug, Default)]
pub struct RecordingDelegate {
    calls: Mutex<Vec<(Channel, SendOutcome)>>,
}

impl RecordingDelegate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<(Channel, SendOutcome)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// The only recorded call; panics unless exactly one happened
    pub fn single(&self) -> (Channel, SendOutcome) {
        let calls = self.calls.lock();
        match calls.as_slice() {
            [only] => only.clone(),
            other => panic!("Expected exactly one completion, got {}", other.len()),
        }
    }
}

impl SendingCompletionDelegate for RecordingDelegate {
    fn invite_sending_completed(&self, channel: &Channel, outcome: SendOutcome) {
        self.calls.lock().push((channel.clone(), outcome));
    }
}
