//! In-memory provider
//!
//! [`StaticProvider`] serves a fixed contact list (or a fixed failure) after
//! an optional latency. Its sending controller composes one
//! [`InviteMessage`] per send and plays back a scripted [`SendAction`] in
//! place of a user. Hosts use it for demos and fixtures; tests use it to
//! drive every branch of the contract.

use super::state::{LoadFailure, LoadState, LoadTicket, ProviderState};
use super::{InviteContactProvider, InviteSendingController};
use crate::callback::LoadCallback;
use crate::channel::Channel;
use crate::completion::{CompletionHandle, SendOutcome};
use crate::contact::{Contact, ContactHandle};
use crate::errors::SendError;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::debug;

/// What a [`StaticProvider`] answers when loaded
#[derive(Debug, Clone)]
pub enum StaticSource {
    Contacts(Vec<Contact>),
    Failure(LoadFailure),
    /// Never answers
    ///
    /// The load is abandoned when a newer load starts or the runtime shuts
    /// down, so at most one such task is parked per provider.
    Unresponsive,
}

/// Scripted user behaviour inside the sending controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendAction {
    /// Compose and dispatch the invite
    Send,
    /// Back out of the composer
    Cancel,
    /// The channel refuses the message
    Fail(SendError),
    /// Close the UI without reporting anything
    Dismiss,
}

/// Invite composed by a [`StaticProvider`] controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteMessage {
    pub channel: Channel,
    pub recipients: Vec<ContactHandle>,
    pub body: String,
}

/// Provider backed by an in-memory source
pub struct StaticProvider {
    title: String,
    state: ProviderState,
    source: RwLock<StaticSource>,
    latency: Duration,
    empty_message: Option<String>,
    send_action: RwLock<SendAction>,
    outbox: Arc<Mutex<Vec<InviteMessage>>>,
    /// Dropping the sender releases the most recent load
    parked: Mutex<Option<oneshot::Sender<()>>>,
}

impl StaticProvider {
    pub fn new(channel: Channel, title: impl Into<String>, source: StaticSource) -> Self {
        Self {
            title: title.into(),
            state: ProviderState::new(channel),
            source: RwLock::new(source),
            latency: Duration::ZERO,
            empty_message: None,
            send_action: RwLock::new(SendAction::Send),
            outbox: Arc::new(Mutex::new(Vec::new())),
            parked: Mutex::new(None),
        }
    }

    /// Provider that loads `contacts`
    pub fn with_contacts(channel: Channel, title: impl Into<String>, contacts: Vec<Contact>) -> Self {
        Self::new(channel, title, StaticSource::Contacts(contacts))
    }

    /// Provider whose loads fail with `failure`
    pub fn failing(channel: Channel, title: impl Into<String>, failure: LoadFailure) -> Self {
        Self::new(channel, title, StaticSource::Failure(failure))
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_empty_message(mut self, message: impl Into<String>) -> Self {
        self.empty_message = Some(message.into());
        self
    }

    pub fn with_send_action(self, action: SendAction) -> Self {
        *self.send_action.write() = action;
        self
    }

    /// Replace the source used by the next load
    pub fn set_source(&self, source: StaticSource) {
        *self.source.write() = source;
    }

    /// Replace the behaviour of controllers created from now on
    pub fn set_send_action(&self, action: SendAction) {
        *self.send_action.write() = action;
    }

    /// Invites dispatched by this provider's controllers so far
    pub fn sent_messages(&self) -> Vec<InviteMessage> {
        self.outbox.lock().clone()
    }
}

impl InviteContactProvider for StaticProvider {
    fn load_contacts(&self, callback: LoadCallback) {
        let ticket = self.state.begin_load(callback);
        let source = self.source.read().clone();
        let (release_tx, release) = oneshot::channel();
        if self.parked.lock().replace(release_tx).is_some() {
            debug!(channel = %self.state.channel(), "Releasing previous load");
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(serve(ticket, source, self.latency, release));
            }
            Err(_) => {
                debug!(channel = %self.state.channel(), "No runtime, resolving load inline");
                serve(ticket, source, Duration::ZERO, release).now_or_never();
            }
        }
    }

    fn load_failure_message(&self) -> Option<String> {
        self.state.failure_message()
    }

    fn segment_title(&self) -> String {
        self.title.clone()
    }

    fn channel(&self) -> Channel {
        self.state.channel().clone()
    }

    fn contacts(&self) -> Vec<Contact> {
        self.state.contacts()
    }

    fn load_state(&self) -> LoadState {
        self.state.state()
    }

    fn invite_sending_controller(
        &self,
        selected_contacts: &[Contact],
        invite_url: &str,
        completion: CompletionHandle,
    ) -> Box<dyn InviteSendingController> {
        let message = InviteMessage {
            channel: self.state.channel().clone(),
            recipients: selected_contacts.iter().map(|c| c.handle().clone()).collect(),
            body: compose_body(selected_contacts, invite_url),
        };

        Box::new(StaticSendingController {
            message,
            action: self.send_action.read().clone(),
            outbox: self.outbox.clone(),
            completion,
        })
    }

    fn empty_list_message(&self) -> Option<String> {
        self.empty_message.clone()
    }
}

async fn serve(
    ticket: LoadTicket,
    source: StaticSource,
    latency: Duration,
    release: oneshot::Receiver<()>,
) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
    match source {
        StaticSource::Contacts(contacts) => ticket.succeed(contacts),
        StaticSource::Failure(failure) => ticket.fail(failure),
        StaticSource::Unresponsive => {
            // Resolves only once the sender is replaced or dropped
            let _ = release.await;
            drop(ticket);
        }
    }
}

fn compose_body(recipients: &[Contact], invite_url: &str) -> String {
    match recipients {
        [only] => format!("Hey {}, join me here: {}", only.display_name(), invite_url),
        _ => format!("Join me here: {}", invite_url),
    }
}

struct StaticSendingController {
    message: InviteMessage,
    action: SendAction,
    outbox: Arc<Mutex<Vec<InviteMessage>>>,
    completion: CompletionHandle,
}

impl InviteSendingController for StaticSendingController {
    fn channel(&self) -> &Channel {
        &self.message.channel
    }

    fn recipient_count(&self) -> usize {
        self.message.recipients.len()
    }

    fn present(self: Box<Self>) -> BoxFuture<'static, ()> {
        async move {
            let StaticSendingController {
                message,
                action,
                outbox,
                completion,
            } = *self;

            match action {
                SendAction::Send => {
                    let recipients = message.recipients.len();
                    outbox.lock().push(message);
                    completion.complete(SendOutcome::Sent { recipients });
                }
                SendAction::Cancel => completion.complete(SendOutcome::Canceled),
                SendAction::Fail(error) => completion.complete(SendOutcome::Failed(error)),
                SendAction::Dismiss => drop(completion),
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionEvent, CompletionHub};
    use crate::errors::LoadError;

    fn channel() -> Channel {
        Channel::new("sms").unwrap()
    }

    fn people() -> Vec<Contact> {
        vec![
            Contact::new("Ada", "+15550100"),
            Contact::new("Grace", "+15550101"),
            Contact::new("Linus", "+15550102"),
        ]
    }

    async fn load(provider: &StaticProvider) -> Result<(), LoadError> {
        let (callback, pending) = LoadCallback::new(provider.channel());
        provider.load_contacts(callback);
        pending.await
    }

    #[tokio::test]
    async fn test_load_contacts() {
        let provider = StaticProvider::with_contacts(channel(), "Messages", people());
        assert!(provider.contacts().is_empty());

        assert_eq!(load(&provider).await, Ok(()));
        assert_eq!(provider.contacts().len(), 3);
        assert_eq!(provider.load_state(), LoadState::Loaded);
    }

    #[tokio::test]
    async fn test_load_failure() {
        let provider = StaticProvider::failing(
            channel(),
            "Messages",
            LoadFailure::permission_denied("permission denied"),
        );

        assert_eq!(load(&provider).await, Err(LoadError::PermissionDenied));
        assert_eq!(provider.load_failure_message().as_deref(), Some("permission denied"));
        assert!(provider.contacts().is_empty());
    }

    #[tokio::test]
    async fn test_newer_load_releases_unresponsive_one() {
        let provider = StaticProvider::new(channel(), "Messages", StaticSource::Unresponsive);

        let (first_cb, first) = LoadCallback::new(provider.channel());
        provider.load_contacts(first_cb);
        let (second_cb, second) = LoadCallback::new(provider.channel());
        provider.load_contacts(second_cb);

        assert_eq!(first.await, Err(LoadError::Abandoned));
        assert_eq!(provider.load_state(), LoadState::Loading);

        provider.set_source(StaticSource::Contacts(people()));
        let (third_cb, third) = LoadCallback::new(provider.channel());
        provider.load_contacts(third_cb);

        assert_eq!(second.await, Err(LoadError::Abandoned));
        assert_eq!(third.await, Ok(()));
        assert_eq!(provider.load_state(), LoadState::Loaded);
        assert_eq!(provider.contacts().len(), 3);
    }

    #[test]
    fn test_load_without_runtime_resolves_inline() {
        let provider = StaticProvider::with_contacts(channel(), "Messages", people());
        let (callback, pending) = LoadCallback::new(provider.channel());

        provider.load_contacts(callback);

        assert_eq!(pending.now_or_never(), Some(Ok(())));
        assert_eq!(provider.contacts().len(), 3);
    }

    #[tokio::test]
    async fn test_controller_sends_invite() {
        let provider = StaticProvider::with_contacts(channel(), "Messages", people());
        load(&provider).await.unwrap();
        let (hub, mut events) = CompletionHub::new();

        let selection = &provider.contacts()[..2];
        let controller = provider.invite_sending_controller(
            selection,
            "https://bnc.lt/abc",
            CompletionHandle::new(channel(), Arc::new(hub)),
        );
        assert_eq!(controller.recipient_count(), 2);
        controller.present().await;

        assert_eq!(
            events.try_next(),
            Some(CompletionEvent {
                channel: channel(),
                outcome: SendOutcome::Sent { recipients: 2 },
            })
        );
        let sent = provider.sent_messages();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].body.contains("https://bnc.lt/abc"));
    }

    #[tokio::test]
    async fn test_dismiss_reports_canceled() {
        let provider = StaticProvider::with_contacts(channel(), "Messages", people())
            .with_send_action(SendAction::Dismiss);
        load(&provider).await.unwrap();
        let (hub, mut events) = CompletionHub::new();

        provider
            .invite_sending_controller(
                &provider.contacts()[..1],
                "https://bnc.lt/abc",
                CompletionHandle::new(channel(), Arc::new(hub)),
            )
            .present()
            .await;

        assert_eq!(events.try_next().unwrap().outcome, SendOutcome::Canceled);
        assert!(events.try_next().is_none());
        assert!(provider.sent_messages().is_empty());
    }

    #[test]
    fn test_single_recipient_body_is_personal() {
        let body = compose_body(&[Contact::new("Ada", "ada")], "https://bnc.lt/x");
        assert_eq!(body, "Hey Ada, join me here: https://bnc.lt/x");
    }
}
