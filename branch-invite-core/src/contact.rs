//! Contact value object
//!
//! A [`Contact`] is one invitable person as produced by a provider during a
//! load. It is never mutated after construction; identity is the opaque
//! [`ContactHandle`], not the display name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Provider-defined address of a person (phone number, user id, email, ...)
///
/// Stable for the lifetime of one load cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactHandle(String);

impl ContactHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ContactHandle {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// One invitable person
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    display_name: String,
    handle: ContactHandle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl Contact {
    /// Create a contact with a display name and an addressing handle
    pub fn new(display_name: impl Into<String>, handle: impl Into<ContactHandle>) -> Self {
        Self {
            display_name: display_name.into(),
            handle: handle.into(),
            detail: None,
        }
    }

    /// Attach a secondary label shown under the name (e.g. "mobile")
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn handle(&self) -> &ContactHandle {
        &self.handle
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl PartialEq for Contact {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for Contact {}

impl Hash for Contact {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) => write!(f, "{} <{}> ({})", self.display_name, self.handle, detail),
            None => write!(f, "{} <{}>", self.display_name, self.handle),
        }
    }
}
