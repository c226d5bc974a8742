//! JSON fixtures describing demo providers

use anyhow::{Context, Result};
use branch_invite_core::provider::StaticSource;
use branch_invite_core::{Channel, Contact, LoadError, LoadFailure, StaticProvider};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// One provider entry in a fixture file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderFixture {
    pub channel: Channel,
    pub title: String,
    #[serde(default)]
    pub contacts: Vec<Contact>,
    #[serde(default)]
    pub failure: Option<FailureFixture>,
    /// Never answer the load
    #[serde(default)]
    pub unresponsive: bool,
    #[serde(default)]
    pub latency_ms: u64,
    #[serde(default)]
    pub empty_message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FailureFixture {
    pub message: String,
    #[serde(default)]
    pub reason: FailureReason,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    PermissionDenied,
    #[default]
    Unreachable,
    InvalidResponse,
}

impl FailureFixture {
    fn to_failure(&self) -> LoadFailure {
        let error = match self.reason {
            FailureReason::PermissionDenied => LoadError::PermissionDenied,
            FailureReason::Unreachable => LoadError::Unreachable(self.message.clone()),
            FailureReason::InvalidResponse => LoadError::InvalidResponse(self.message.clone()),
        };
        LoadFailure::new(self.message.clone(), error)
    }
}

impl ProviderFixture {
    pub fn into_provider(self) -> StaticProvider {
        let source = match (&self.failure, self.unresponsive) {
            (_, true) => StaticSource::Unresponsive,
            (Some(failure), false) => StaticSource::Failure(failure.to_failure()),
            (None, false) => StaticSource::Contacts(self.contacts),
        };

        let provider = StaticProvider::new(self.channel, self.title, source)
            .with_latency(Duration::from_millis(self.latency_ms));
        match self.empty_message {
            Some(message) => provider.with_empty_message(message),
            None => provider,
        }
    }
}

/// Parse a fixture document
pub fn parse(json: &str) -> Result<Vec<ProviderFixture>> {
    let fixtures: Vec<ProviderFixture> =
        serde_json::from_str(json).context("Invalid provider fixture")?;
    Ok(fixtures)
}

/// Read and parse a fixture file
pub fn load(path: &Path) -> Result<Vec<ProviderFixture>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fixture {}", path.display()))?;
    parse(&json).with_context(|| format!("In fixture {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use branch_invite_core::{InviteContactProvider, LoadCallback, LoadState};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FIXTURE: &str = r#"[
        {
            "channel": "sms",
            "title": "Messages",
            "contacts": [
                { "display_name": "Ada", "handle": "+15550100", "detail": "mobile" },
                { "display_name": "Grace", "handle": "+15550101" }
            ]
        },
        {
            "channel": "address_book",
            "title": "Contacts",
            "failure": { "message": "permission denied", "reason": "permission_denied" }
        },
        {
            "channel": "facebook",
            "title": "Facebook",
            "empty_message": "None of your friends are here yet",
            "latency_ms": 20
        }
    ]"#;

    #[test]
    fn test_parse_fixture() {
        let fixtures = parse(FIXTURE).unwrap();

        assert_eq!(fixtures.len(), 3);
        assert_eq!(fixtures[0].contacts.len(), 2);
        assert_eq!(fixtures[0].contacts[0].detail(), Some("mobile"));
        assert_eq!(
            fixtures[1].failure.as_ref().unwrap().reason,
            FailureReason::PermissionDenied
        );
        assert_eq!(fixtures[2].latency_ms, 20);
    }

    #[test]
    fn test_parse_rejects_bad_channel() {
        assert!(parse(r#"[{ "channel": "address book", "title": "x" }]"#).is_err());
        assert!(parse(r#"[{ "channel": "sms", "title": "x", "colour": "red" }]"#).is_err());
    }

    #[test]
    fn test_failure_reason_defaults_to_unreachable() {
        let fixtures =
            parse(r#"[{ "channel": "sms", "title": "x", "failure": { "message": "down" } }]"#)
                .unwrap();
        let failure = fixtures[0].failure.as_ref().unwrap().to_failure();

        assert_eq!(failure.error, LoadError::Unreachable("down".to_string()));
    }

    #[tokio::test]
    async fn test_failing_fixture_loads_as_failure() {
        let mut fixtures = parse(FIXTURE).unwrap();
        let provider = fixtures.remove(1).into_provider();
        let (callback, pending) = LoadCallback::new(provider.channel());

        provider.load_contacts(callback);

        assert_eq!(pending.await, Err(LoadError::PermissionDenied));
        assert_eq!(provider.load_state(), LoadState::LoadFailed);
        assert_eq!(provider.load_failure_message().as_deref(), Some("permission denied"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let fixtures = load(file.path()).unwrap();
        assert_eq!(fixtures[2].empty_message.as_deref(), Some("None of your friends are here yet"));

        assert!(load(Path::new("/nonexistent/fixture.json")).is_err());
    }
}
