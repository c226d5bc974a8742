//! Provider Registry - host loop for one invite session
//!
//! Owns the providers of a session keyed by channel, loads them, turns their
//! state into [`Segment`]s and wires their sending controllers to one shared
//! completion path.
//!
//! # Responsibilities
//!
//! - **Registration**: channels are unique per session
//! - **Loading**: all providers load concurrently; each load races a deadline
//!   and a missed deadline fails that provider only
//! - **Rendering**: one segment per provider, in registration order
//! - **Hand-off**: checks a selection against the latest snapshot before
//!   asking the provider for its sending controller
//!
//! ```text
//! ┌──────────────────┐   load_contacts    ┌──────────────┐
//! │ ProviderRegistry │ ─────────────────► │ provider (n) │
//! │                  │ ◄── LoadCallback ─ │              │
//! └───┬──────────────┘                    └──────┬───────┘
//!     │ CompletionEvents                         │ controller.present()
//!     ▼                                          ▼
//!   host  ◄───────────── CompletionHub ◄── CompletionHandle
//! ```

mod segment;

pub use segment::{Segment, SegmentBody};

use crate::callback::{LoadCallback, LoadStatus};
use crate::channel::Channel;
use crate::completion::{CompletionEvents, CompletionHandle, CompletionHub};
use crate::config::LoadConfig;
use crate::contact::{Contact, ContactHandle};
use crate::errors::{InviteError, InviteResult, LoadError};
use crate::provider::{InviteContactProvider, InviteSendingController};
use futures::future::join_all;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

/// Result of one provider load as observed by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub channel: Channel,
    pub status: LoadStatus,
    /// Contacts in the snapshot after the load (0 on failure)
    pub contact_count: usize,
    pub elapsed: Duration,
}

/// Host-side view of a provider's most recent load
#[derive(Debug, Clone, PartialEq, Eq)]
enum HostView {
    NotLoaded,
    Loading,
    Loaded,
    Failed(LoadError),
}

struct Entry {
    provider: Arc<dyn InviteContactProvider>,
    view: HostView,
    /// Bumped by every load the registry starts
    generation: u64,
}

#[derive(Default)]
struct Entries {
    order: Vec<Channel>,
    by_channel: HashMap<Channel, Entry>,
}

/// Registry of the providers taking part in one invite session
pub struct ProviderRegistry {
    session_id: Uuid,
    config: LoadConfig,
    entries: RwLock<Entries>,
    hub: CompletionHub,
    events: Mutex<Option<CompletionEvents>>,
}

impl ProviderRegistry {
    /// Start a new session
    pub fn new(config: LoadConfig) -> Self {
        let session_id = Uuid::new_v4();
        let (hub, events) = CompletionHub::new();

        info!(session = %session_id, "Creating ProviderRegistry");

        Self {
            session_id,
            config,
            entries: RwLock::new(Entries::default()),
            hub,
            events: Mutex::new(Some(events)),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &LoadConfig {
        &self.config
    }

    /// Add a provider to the session
    ///
    /// Fails if another provider already uses the same channel.
    pub fn register(&self, provider: Arc<dyn InviteContactProvider>) -> InviteResult<Channel> {
        let channel = provider.channel();
        let mut entries = self.entries.write();

        if entries.by_channel.contains_key(&channel) {
            warn!(session = %self.session_id, channel = %channel, "Duplicate channel rejected");
            return Err(InviteError::DuplicateChannel(channel));
        }

        info!(
            session = %self.session_id,
            channel = %channel,
            title = %provider.segment_title(),
            "Provider registered"
        );

        entries.order.push(channel.clone());
        entries.by_channel.insert(
            channel.clone(),
            Entry {
                provider,
                view: HostView::NotLoaded,
                generation: 0,
            },
        );
        Ok(channel)
    }

    /// Channels in registration order
    pub fn channels(&self) -> Vec<Channel> {
        self.entries.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn provider(&self, channel: &str) -> Option<Arc<dyn InviteContactProvider>> {
        self.entries
            .read()
            .by_channel
            .get(channel)
            .map(|entry| entry.provider.clone())
    }

    /// Load every registered provider concurrently
    ///
    /// Returns one report per provider in registration order.
    pub async fn load_all(&self) -> Vec<LoadReport> {
        let channels = self.channels();
        info!(
            session = %self.session_id,
            providers = channels.len(),
            "Loading all providers"
        );

        let loads = channels.iter().filter_map(|channel| {
            let (provider, generation) = self.mark_loading(channel)?;
            Some(self.run_load(channel.clone(), provider, generation))
        });

        join_all(loads).await
    }

    /// Reload a single provider
    pub async fn reload(&self, channel: &str) -> InviteResult<LoadReport> {
        let channel = self.resolve(channel)?;
        let (provider, generation) = self
            .mark_loading(&channel)
            .ok_or_else(|| InviteError::UnknownChannel(channel.to_string()))?;

        info!(session = %self.session_id, channel = %channel, "Reloading provider");
        Ok(self.run_load(channel, provider, generation).await)
    }

    fn mark_loading(&self, channel: &Channel) -> Option<(Arc<dyn InviteContactProvider>, u64)> {
        let mut entries = self.entries.write();
        let entry = entries.by_channel.get_mut(channel)?;
        entry.generation += 1;
        entry.view = HostView::Loading;
        Some((entry.provider.clone(), entry.generation))
    }

    async fn run_load(
        &self,
        channel: Channel,
        provider: Arc<dyn InviteContactProvider>,
        generation: u64,
    ) -> LoadReport {
        let span = info_span!(
            "load",
            session = %self.session_id,
            channel = %channel,
            generation
        );

        async move {
            let started = Instant::now();
            let (callback, pending) = LoadCallback::new(channel.clone());
            provider.load_contacts(callback);

            let status = match tokio::time::timeout(self.config.timeout, pending).await {
                Ok(status) => status,
                Err(_) => {
                    warn!(timeout = ?self.config.timeout, "Provider missed load deadline");
                    Err(LoadError::TimedOut)
                }
            };

            let contact_count = match &status {
                Ok(()) => provider.contacts().len(),
                Err(_) => 0,
            };
            self.settle(&channel, generation, &status);

            let elapsed = started.elapsed();
            debug!(?elapsed, contact_count, ok = status.is_ok(), "Load settled");

            LoadReport {
                channel,
                status,
                contact_count,
                elapsed,
            }
        }
        .instrument(span)
        .await
    }

    /// Record a load outcome unless a newer load has started since
    fn settle(&self, channel: &Channel, generation: u64, status: &LoadStatus) {
        let mut entries = self.entries.write();
        let Some(entry) = entries.by_channel.get_mut(channel) else {
            return;
        };
        if entry.generation != generation {
            debug!(
                current = entry.generation,
                "Superseded load finished, host view left untouched"
            );
            return;
        }
        entry.view = match status {
            Ok(()) => HostView::Loaded,
            Err(e) => HostView::Failed(e.clone()),
        };
    }

    /// Render every provider, in registration order
    pub fn segments(&self) -> Vec<Segment> {
        let entries = self.entries.read();
        entries
            .order
            .iter()
            .filter_map(|channel| entries.by_channel.get(channel).map(|e| (channel, e)))
            .map(|(channel, entry)| self.render(channel, entry))
            .collect()
    }

    /// Render one provider
    pub fn segment(&self, channel: &str) -> InviteResult<Segment> {
        let channel = self.resolve(channel)?;
        let entries = self.entries.read();
        let entry = entries
            .by_channel
            .get(&channel)
            .ok_or_else(|| InviteError::UnknownChannel(channel.to_string()))?;
        Ok(self.render(&channel, entry))
    }

    fn render(&self, channel: &Channel, entry: &Entry) -> Segment {
        let provider = &entry.provider;
        let body = match &entry.view {
            HostView::NotLoaded => SegmentBody::NotLoaded,
            HostView::Loading => SegmentBody::Loading,
            HostView::Loaded => {
                let contacts = provider.contacts();
                if contacts.is_empty() {
                    SegmentBody::Empty {
                        message: provider.empty_list_message(),
                    }
                } else {
                    SegmentBody::Contacts { contacts }
                }
            }
            HostView::Failed(LoadError::TimedOut) => SegmentBody::Failed {
                message: self.config.timeout_message.clone(),
            },
            HostView::Failed(error) => SegmentBody::Failed {
                message: provider
                    .load_failure_message()
                    .unwrap_or_else(|| error.to_string()),
            },
        };

        Segment {
            channel: channel.clone(),
            title: provider.segment_title(),
            body,
        }
    }

    /// Build the sending UI for `selection` through `channel`
    ///
    /// The provider must have completed a successful load observed by this
    /// registry, and every selected contact must be in its current snapshot.
    /// The returned controller reports to [`completion_events`](Self::completion_events).
    pub fn sending_controller(
        &self,
        channel: &str,
        selection: &[Contact],
        invite_url: &str,
    ) -> InviteResult<Box<dyn InviteSendingController>> {
        let channel = self.resolve(channel)?;
        let provider = {
            let entries = self.entries.read();
            let entry = entries
                .by_channel
                .get(&channel)
                .ok_or_else(|| InviteError::UnknownChannel(channel.to_string()))?;
            if entry.view != HostView::Loaded {
                return Err(InviteError::NotLoaded(channel));
            }
            entry.provider.clone()
        };

        if selection.is_empty() {
            return Err(InviteError::EmptySelection(channel));
        }
        if selection.len() > self.config.max_selection {
            return Err(InviteError::SelectionTooLarge {
                channel,
                count: selection.len(),
                limit: self.config.max_selection,
            });
        }

        let snapshot: HashSet<ContactHandle> = provider
            .contacts()
            .into_iter()
            .map(|c| c.handle().clone())
            .collect();
        if let Some(stranger) = selection.iter().find(|c| !snapshot.contains(c.handle())) {
            return Err(InviteError::ContactNotInSnapshot {
                channel,
                handle: stranger.handle().to_string(),
            });
        }

        validate_invite_url(invite_url)?;

        info!(
            session = %self.session_id,
            channel = %channel,
            recipients = selection.len(),
            "Creating sending controller"
        );

        let completion = CompletionHandle::new(channel, Arc::new(self.hub.clone()));
        Ok(provider.invite_sending_controller(selection, invite_url, completion))
    }

    /// Take the stream of send outcomes for this session
    ///
    /// Can only be taken once.
    pub fn completion_events(&self) -> InviteResult<CompletionEvents> {
        self.events.lock().take().ok_or(InviteError::EventsAlreadyTaken)
    }

    fn resolve(&self, channel: &str) -> InviteResult<Channel> {
        self.entries
            .read()
            .by_channel
            .get_key_value(channel)
            .map(|(c, _)| c.clone())
            .ok_or_else(|| InviteError::UnknownChannel(channel.to_string()))
    }
}

fn validate_invite_url(invite_url: &str) -> InviteResult<()> {
    let url = Url::parse(invite_url)
        .map_err(|e| InviteError::InvalidInviteUrl(format!("{}: {}", invite_url, e)))?;
    if url.cannot_be_a_base() {
        return Err(InviteError::InvalidInviteUrl(invite_url.to_string()));
    }
    Ok(())
}
