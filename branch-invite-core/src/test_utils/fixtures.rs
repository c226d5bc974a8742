//! Test fixtures for contacts, channels and providers

use crate::channel::Channel;
use crate::contact::Contact;
use crate::provider::StaticProvider;

const FIRST_NAMES: [&str; 8] = [
    "Ada", "Grace", "Linus", "Margaret", "Dennis", "Barbara", "Ken", "Frances",
];

/// Build a channel, panicking on an invalid id
pub fn channel(id: &str) -> Channel {
    Channel::new(id).unwrap_or_else(|e| panic!("invalid test channel {:?}: {}", id, e))
}

/// `n` contacts with distinct phone-number handles
pub fn sample_contacts(n: usize) -> Vec<Contact> {
    (0..n)
        .map(|i| {
            let name = FIRST_NAMES[i % FIRST_NAMES.len()];
            Contact::new(format!("{} {}", name, i), format!("+1555{:07}", i)).with_detail("mobile")
        })
        .collect()
}

/// Provider serving `contacts` with its channel id as title
pub fn static_provider(id: &str, contacts: Vec<Contact>) -> StaticProvider {
    StaticProvider::with_contacts(channel(id), id.to_uppercase(), contacts)
}
