//! Load state shared by provider implementations
//!
//! [`ProviderState`] keeps the snapshot and the failure message of one
//! provider. A load is started with [`ProviderState::begin_load`], which
//! returns a [`LoadTicket`] owning the host's callback. Resolving the ticket
//! updates the state first and fires the callback second, so a host that
//! reads `contacts()` after its callback always sees the new snapshot.
//!
//! Overlapping loads: every ticket fires its own callback, but only the most
//! recently started one may update the state. Older tickets are stale.

use crate::callback::LoadCallback;
use crate::channel::Channel;
use crate::contact::Contact;
use crate::errors::LoadError;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

const ABANDONED_MESSAGE: &str = "Contacts could not be loaded.";

/// Position of a provider in its load lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
    LoadFailed,
}

impl LoadState {
    /// Whether the last load attempt has finished
    pub fn is_settled(&self) -> bool {
        matches!(self, LoadState::Loaded | LoadState::LoadFailed)
    }
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadState::NotLoaded => "not_loaded",
            LoadState::Loading => "loading",
            LoadState::Loaded => "loaded",
            LoadState::LoadFailed => "load_failed",
        };
        f.write_str(s)
    }
}

/// Failed load: message for the user plus payload for the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub message: String,
    pub error: LoadError,
}

impl LoadFailure {
    pub fn new(message: impl Into<String>, error: LoadError) -> Self {
        Self {
            message: message.into(),
            error,
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(message, LoadError::PermissionDenied)
    }
}

#[derive(Debug)]
struct Inner {
    state: LoadState,
    contacts: Vec<Contact>,
    failure_message: Option<String>,
    generation: u64,
}

/// Snapshot and failure state of one provider
///
/// Cheap to clone; clones share the same state. Reads never wait on a load.
#[derive(Debug, Clone)]
pub struct ProviderState {
    channel: Channel,
    inner: Arc<RwLock<Inner>>,
}

impl ProviderState {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            inner: Arc::new(RwLock::new(Inner {
                state: LoadState::NotLoaded,
                contacts: Vec::new(),
                failure_message: None,
                generation: 0,
            })),
        }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Enter `Loading` and take ownership of the load callback
    ///
    /// The previous snapshot stays readable until the ticket resolves.
    pub fn begin_load(&self, callback: LoadCallback) -> LoadTicket {
        let generation = {
            let mut inner = self.inner.write();
            if inner.state == LoadState::Loading {
                debug!(channel = %self.channel, "Load started while another is pending");
            }
            inner.generation += 1;
            inner.state = LoadState::Loading;
            inner.generation
        };

        debug!(channel = %self.channel, generation, "Load started");

        LoadTicket {
            state: self.clone(),
            generation,
            callback: Some(callback),
        }
    }

    pub fn state(&self) -> LoadState {
        self.inner.read().state
    }

    pub fn contacts(&self) -> Vec<Contact> {
        self.inner.read().contacts.clone()
    }

    pub fn failure_message(&self) -> Option<String> {
        self.inner.read().failure_message.clone()
    }

    /// Whether `contact` is part of the current snapshot
    pub fn contains(&self, contact: &Contact) -> bool {
        self.inner.read().contacts.iter().any(|c| c == contact)
    }

    /// Size of the stored snapshot, or `None` if `generation` is stale
    fn apply(
        &self,
        generation: u64,
        result: &Result<Vec<Contact>, LoadFailure>,
    ) -> Option<usize> {
        let mut inner = self.inner.write();
        if generation != inner.generation {
            return None;
        }

        match result {
            Ok(contacts) => {
                inner.contacts = dedup_by_handle(contacts);
                inner.failure_message = None;
                inner.state = LoadState::Loaded;
            }
            Err(failure) => {
                inner.contacts.clear();
                inner.failure_message = Some(failure.message.clone());
                inner.state = LoadState::LoadFailed;
            }
        }
        Some(inner.contacts.len())
    }
}

fn dedup_by_handle(contacts: &[Contact]) -> Vec<Contact> {
    let mut seen = HashSet::with_capacity(contacts.len());
    contacts
        .iter()
        .filter(|c| seen.insert(c.handle().clone()))
        .cloned()
        .collect()
}

/// One in-flight load of a [`ProviderState`]
///
/// Dropping an unresolved ticket records a failure and fires the callback
/// with [`LoadError::Abandoned`].
pub struct LoadTicket {
    state: ProviderState,
    generation: u64,
    callback: Option<LoadCallback>,
}

impl LoadTicket {
    pub fn succeed(mut self, contacts: Vec<Contact>) {
        self.finish(Ok(contacts));
    }

    pub fn fail(mut self, failure: LoadFailure) {
        self.finish(Err(failure));
    }

    pub fn resolve(mut self, result: Result<Vec<Contact>, LoadFailure>) {
        self.finish(result);
    }

    fn finish(&mut self, result: Result<Vec<Contact>, LoadFailure>) {
        let Some(callback) = self.callback.take() else {
            return;
        };
        let channel = self.state.channel();

        if let Some(count) = self.state.apply(self.generation, &result) {
            match &result {
                Ok(_) => info!(channel = %channel, count, "Contacts loaded"),
                Err(failure) => {
                    warn!(channel = %channel, error = %failure.error, "Contact load failed")
                }
            }
        } else {
            debug!(
                channel = %channel,
                generation = self.generation,
                "Stale load finished, state left untouched"
            );
        }

        callback.complete(result.map(|_| ()).map_err(|failure| failure.error));
    }
}

impl Drop for LoadTicket {
    fn drop(&mut self) {
        if self.callback.is_some() {
            self.finish(Err(LoadFailure::new(ABANDONED_MESSAGE, LoadError::Abandoned)));
        }
    }
}

impl fmt::Debug for LoadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadTicket")
            .field("channel", self.state.channel())
            .field("generation", &self.generation)
            .finish()
    }
}
