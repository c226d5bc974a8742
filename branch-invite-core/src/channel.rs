//! Channel identifiers

use crate::errors::{InviteError, InviteResult};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable machine-readable key of one invite channel ("contacts", "facebook", ...)
///
/// Unique across the providers of a session. Never empty and never contains
/// whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Channel(String);

impl Channel {
    /// Create a validated channel identifier
    pub fn new(id: impl Into<String>) -> InviteResult<Self> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(InviteError::InvalidChannel(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Channel {
    type Error = InviteError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Channel::new(value)
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}

impl Borrow<str> for Channel {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Channel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
