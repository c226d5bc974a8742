//! Property tests for the load and completion contracts
//!
//! - every load callback fires exactly once, whether the provider succeeds,
//!   fails, or never answers
//! - a settled provider never reports contacts and a failure message together
//! - every presented controller completes exactly once
//! - registration keeps channels unique

use branch_invite_core::provider::{SendAction, StaticSource};
use branch_invite_core::test_utils::{channel, sample_contacts, RecordingDelegate};
use branch_invite_core::{
    config::LoadConfig, CompletionHandle, InviteContactProvider, InviteError, LoadCallback,
    LoadError, LoadFailure, LoadState, ProviderRegistry, SendError, StaticProvider,
};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scenario {
    Succeed { contacts: usize, latency_ms: u64 },
    Fail { latency_ms: u64 },
    Hang,
}

fn scenario() -> impl Strategy<Value = Scenario> {
    prop_oneof![
        (0..6usize, 0..50u64).prop_map(|(contacts, latency_ms)| Scenario::Succeed {
            contacts,
            latency_ms
        }),
        (0..50u64).prop_map(|latency_ms| Scenario::Fail { latency_ms }),
        Just(Scenario::Hang),
    ]
}

fn provider_for(index: usize, scenario: &Scenario) -> StaticProvider {
    let id = channel(&format!("provider-{}", index));
    match scenario {
        Scenario::Succeed {
            contacts,
            latency_ms,
        } => StaticProvider::with_contacts(id, "Friends", sample_contacts(*contacts))
            .with_latency(Duration::from_millis(*latency_ms)),
        Scenario::Fail { latency_ms } => StaticProvider::failing(
            id,
            "Friends",
            LoadFailure::new("offline", LoadError::Unreachable("no route".to_string())),
        )
        .with_latency(Duration::from_millis(*latency_ms)),
        Scenario::Hang => StaticProvider::new(id, "Friends", StaticSource::Unresponsive),
    }
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_load_callback_fires_exactly_once(
        scenarios in prop::collection::vec(scenario(), 100),
    ) {
        let rt = paused_runtime();
        let providers: Vec<_> = scenarios
            .iter()
            .enumerate()
            .map(|(i, s)| provider_for(i, s))
            .collect();
        let counters: Vec<_> = (0..providers.len())
            .map(|_| Arc::new(AtomicUsize::new(0)))
            .collect();

        rt.block_on(async {
            for (provider, counter) in providers.iter().zip(&counters) {
                let counter = counter.clone();
                provider.load_contacts(LoadCallback::from_fn(provider.channel(), move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                }));
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        for ((provider, counter), scenario) in providers.iter().zip(&counters).zip(&scenarios) {
            let contacts = provider.contacts();
            let message = provider.load_failure_message();
            prop_assert!(contacts.is_empty() || message.is_none());

            match scenario {
                Scenario::Succeed { contacts: n, .. } => {
                    prop_assert_eq!(provider.load_state(), LoadState::Loaded);
                    prop_assert_eq!(contacts.len(), *n);
                    prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
                }
                Scenario::Fail { .. } => {
                    prop_assert_eq!(provider.load_state(), LoadState::LoadFailed);
                    prop_assert!(contacts.is_empty());
                    prop_assert_eq!(message.as_deref(), Some("offline"));
                    prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
                }
                Scenario::Hang => {
                    prop_assert_eq!(provider.load_state(), LoadState::Loading);
                    prop_assert_eq!(counter.load(Ordering::SeqCst), 0);
                }
            }
        }

        // Shutting the runtime down releases the hung loads
        drop(rt);
        for counter in &counters {
            prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn prop_registry_reports_every_provider_once(
        scenarios in prop::collection::vec(scenario(), 1..12),
    ) {
        let rt = paused_runtime();
        let reports = rt.block_on(async {
            let registry = ProviderRegistry::new(LoadConfig {
                timeout: Duration::from_millis(200),
                ..Default::default()
            });
            for (i, s) in scenarios.iter().enumerate() {
                registry.register(Arc::new(provider_for(i, s))).unwrap();
            }
            registry.load_all().await
        });

        prop_assert_eq!(reports.len(), scenarios.len());
        for (report, scenario) in reports.iter().zip(&scenarios) {
            match scenario {
                Scenario::Succeed { contacts, .. } => {
                    prop_assert_eq!(&report.status, &Ok(()));
                    prop_assert_eq!(report.contact_count, *contacts);
                }
                Scenario::Fail { .. } => {
                    prop_assert!(matches!(report.status, Err(LoadError::Unreachable(_))));
                }
                Scenario::Hang => prop_assert_eq!(&report.status, &Err(LoadError::TimedOut)),
            }
        }
    }

    #[test]
    fn prop_controller_completes_exactly_once(
        action in prop_oneof![
            Just(SendAction::Send),
            Just(SendAction::Cancel),
            Just(SendAction::Dismiss),
            Just(SendAction::Fail(SendError::Transport("offline".to_string()))),
        ],
        total in 1..8usize,
        picked in 1..8usize,
    ) {
        let picked = picked.min(total);
        let rt = paused_runtime();
        let delegate = Arc::new(RecordingDelegate::new());

        rt.block_on(async {
            let provider = StaticProvider::with_contacts(channel("sms"), "SMS", sample_contacts(total))
                .with_send_action(action.clone());
            let (callback, pending) = LoadCallback::new(provider.channel());
            provider.load_contacts(callback);
            pending.await.unwrap();

            provider
                .invite_sending_controller(
                    &provider.contacts()[..picked],
                    "https://bnc.lt/i/prop",
                    CompletionHandle::new(provider.channel(), delegate.clone()),
                )
                .present()
                .await;
        });

        prop_assert_eq!(delegate.call_count(), 1);
        let (_, outcome) = delegate.single();
        prop_assert_eq!(outcome.is_sent(), action == SendAction::Send);
    }

    #[test]
    fn prop_registered_channels_are_unique(
        ids in prop::collection::vec("[a-d]{1,2}", 1..20),
    ) {
        let registry = ProviderRegistry::new(LoadConfig::default());
        let mut expected = HashSet::new();

        for id in &ids {
            let result = registry.register(Arc::new(StaticProvider::with_contacts(
                channel(id),
                id.as_str(),
                Vec::new(),
            )));
            if expected.insert(id.clone()) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result, Err(InviteError::DuplicateChannel(channel(id))));
            }
        }

        let channels = registry.channels();
        let unique: HashSet<_> = channels.iter().collect();
        prop_assert_eq!(unique.len(), channels.len());
        prop_assert_eq!(channels.len(), expected.len());
    }
}
