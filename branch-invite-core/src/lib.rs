//! Branch Invite - pluggable invite-channel providers
//!
//! Each [`InviteContactProvider`] knows how to load the people a user can
//! invite from one source and how to build the UI that sends them the
//! invite. A host drives any number of providers through the
//! [`ProviderRegistry`], renders one [`Segment`] per provider, and receives
//! the outcome of every send through a [`SendingCompletionDelegate`].
//!
//! Both asynchronous edges of the contract, the load callback and the send
//! completion, are one-shot handles consumed on use: they fire exactly once,
//! including when the implementation forgets them.

pub mod callback;
pub mod channel;
pub mod completion;
pub mod config;
pub mod contact;
pub mod errors;
pub mod logging;
pub mod provider;
pub mod registry;
pub mod test_utils;

pub use callback::{LoadCallback, LoadStatus, PendingLoad};
pub use channel::Channel;
pub use completion::{
    CompletionEvent, CompletionEvents, CompletionHandle, CompletionHub, SendOutcome,
    SendingCompletionDelegate,
};
pub use config::Config;
pub use contact::{Contact, ContactHandle};
pub use errors::{InviteError, InviteResult, LoadError, SendError};
pub use logging::{init_logging, LogFormat, LogLevel};
pub use provider::{
    InviteContactProvider, InviteSendingController, LoadFailure, LoadState, ProviderState,
    StaticProvider,
};
pub use registry::{LoadReport, ProviderRegistry, Segment, SegmentBody};
