//! Error types for the invite provider layer
//!
//! Three families live here:
//! - [`LoadError`]: machine-readable payload delivered with a failed load
//! - [`SendError`]: payload of a failed send, carried inside a completion outcome
//! - [`InviteError`]: host-side misuse caught by the registry before a provider is called

use crate::channel::Channel;
use thiserror::Error;

/// Result type for registry operations
pub type InviteResult<T> = Result<T, InviteError>;

/// Why a provider could not produce a contact list
///
/// This is distinct from the provider's human-readable failure message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The user denied access to the backing source
    #[error("permission denied")]
    PermissionDenied,

    /// The backing source could not be reached
    #[error("source unreachable: {0}")]
    Unreachable(String),

    /// The backing source answered with something unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The host deadline elapsed before the provider answered
    #[error("load timed out")]
    TimedOut,

    /// The provider dropped its callback without resolving it
    #[error("load abandoned by provider")]
    Abandoned,
}

/// Why a send attempt failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    /// The channel refused the message (bad recipient, quota, ...)
    #[error("send rejected: {0}")]
    Rejected(String),

    /// The message could not be handed to the channel
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors raised by the host loop
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InviteError {
    /// A provider with this channel is already registered
    #[error("Channel already registered: {0}")]
    DuplicateChannel(Channel),

    /// No provider is registered under this channel
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    /// The provider has not completed a successful load
    #[error("Provider {0} has no successful load")]
    NotLoaded(Channel),

    /// A sending controller was requested with no recipients
    #[error("Selection for {0} is empty")]
    EmptySelection(Channel),

    /// Selection exceeds the configured per-send limit
    #[error("Selection for {channel} has {count} contacts, limit is {limit}")]
    SelectionTooLarge {
        channel: Channel,
        count: usize,
        limit: usize,
    },

    /// A selected contact is not part of the provider's current snapshot
    #[error("Contact {handle} is not in the current snapshot of {channel}")]
    ContactNotInSnapshot { channel: Channel, handle: String },

    /// The invite URL is not an absolute URL
    #[error("Invalid invite URL: {0}")]
    InvalidInviteUrl(String),

    /// A channel identifier failed validation
    #[error("Invalid channel identifier: {0:?}")]
    InvalidChannel(String),

    /// The completion event receiver was already handed out
    #[error("Completion events already taken")]
    EventsAlreadyTaken,
}
