//! Segment render model
//!
//! What the host shows for each provider. Loading, an empty successful load
//! and a failed load are three different bodies and must never be rendered
//! the same way.

use crate::channel::Channel;
use crate::contact::Contact;
use serde::Serialize;

/// One provider's section of the invite screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub channel: Channel,
    pub title: String,
    pub body: SegmentBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SegmentBody {
    /// Registered but never loaded
    NotLoaded,
    Loading,
    Contacts { contacts: Vec<Contact> },
    /// Successful load with no contacts
    Empty { message: Option<String> },
    Failed { message: String },
}

impl SegmentBody {
    pub fn is_failed(&self) -> bool {
        matches!(self, SegmentBody::Failed { .. })
    }

    /// Contacts shown in this segment (none unless loaded)
    pub fn contacts(&self) -> &[Contact] {
        match self {
            SegmentBody::Contacts { contacts } => contacts,
            _ => &[],
        }
    }
}
