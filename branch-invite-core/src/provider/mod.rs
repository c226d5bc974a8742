//! InviteContactProvider - contract every invite channel implements
//!
//! A provider owns one source of invitable people (address book, social
//! graph, messaging app) and knows how to build the UI that sends an invite
//! through that source.
//!
//! # Lifecycle
//!
//! ```text
//! NotLoaded --load_contacts--> Loading --+--> Loaded
//!                                 ^      |
//!                                 |      +--> LoadFailed
//!                                 |             |
//!                                 +---reload----+
//! ```
//!
//! # Architecture
//!
//! ```text
//! ProviderRegistry
//!       |
//!       v
//! InviteContactProvider (trait)
//!       |
//!       +---> StaticProvider (in-memory source)
//!       |
//!       +---> address book / social / SMS providers (host supplied)
//! ```
//!
//! Implementations normally embed a [`ProviderState`] and resolve loads
//! through its [`LoadTicket`], which keeps the snapshot, the failure message
//! and the callback consistent.

use crate::callback::LoadCallback;
use crate::channel::Channel;
use crate::completion::CompletionHandle;
use crate::contact::Contact;
use futures::future::BoxFuture;

pub mod state;
pub mod static_provider;

pub use state::{LoadFailure, LoadState, LoadTicket, ProviderState};
pub use static_provider::{InviteMessage, SendAction, StaticProvider, StaticSource};

/// Opaque, presentable sending UI returned by a provider
///
/// The host presents it without knowing its internals. The controller owns
/// the whole send flow and resolves its [`CompletionHandle`] exactly once.
pub trait InviteSendingController: Send {
    /// Channel this controller sends through
    fn channel(&self) -> &Channel;

    /// Number of contacts the invite is addressed to
    fn recipient_count(&self) -> usize;

    /// Hand control to the sending flow and run it to its end
    ///
    /// Consumes the controller so it cannot be presented twice.
    fn present(self: Box<Self>) -> BoxFuture<'static, ()>;
}

/// Uniform access to one invite channel
///
/// None of these methods may block the caller. Fallible work happens behind
/// [`load_contacts`](Self::load_contacts) and is reported through its callback.
pub trait InviteContactProvider: Send + Sync {
    /// Start populating the contact list
    ///
    /// Returns immediately. `callback` is resolved exactly once: `Ok(())`
    /// after the snapshot has been replaced, or `Err` after the failure
    /// message has been set and the snapshot cleared. Permission denial and
    /// unreachable sources are failures, not panics.
    fn load_contacts(&self, callback: LoadCallback);

    /// Human-readable reason for the most recent failed load
    ///
    /// `None` before the first load and after a successful one.
    fn load_failure_message(&self) -> Option<String>;

    /// User-facing label for this channel's segment
    fn segment_title(&self) -> String;

    /// Stable key of this channel, unique within a session
    fn channel(&self) -> Channel;

    /// Snapshot of the most recent completed load
    ///
    /// Empty if never loaded or if the last load failed.
    fn contacts(&self) -> Vec<Contact>;

    /// Where this provider is in its load lifecycle
    fn load_state(&self) -> LoadState;

    /// Build the sending UI for `selected_contacts`
    ///
    /// `selected_contacts` is a non-empty subset of the latest
    /// [`contacts`](Self::contacts) snapshot; contacts from another load
    /// cycle are not guarded against. Neither input may be modified.
    fn invite_sending_controller(
        &self,
        selected_contacts: &[Contact],
        invite_url: &str,
        completion: CompletionHandle,
    ) -> Box<dyn InviteSendingController>;

    /// Text for the empty state of a successful load with no contacts
    fn empty_list_message(&self) -> Option<String> {
        None
    }
}
