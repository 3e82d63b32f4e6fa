use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use winkdrops_core::{
    ChannelAdapter, ChannelState, ContactMethod, DeviceApiError, DeviceContactRecord,
    DeviceContactsApi, DirectoryConfig, DirectorySession, DirectoryStore, DuplicatePolicy,
    FixedClock, HandleInput, IdAllocator, InMemoryDirectoryStore, ManualEntryError,
    MockSocialAdapter, RawContact, SyncChannel, SyncError, SyncEvent, SyncFailure,
    SyncOrchestrator, SyncRequestError,
};

const NOW: i64 = 1_700_000_000_000;

fn session(policy: DuplicatePolicy) -> DirectorySession {
    let config = DirectoryConfig {
        duplicate_policy: policy,
        ..DirectoryConfig::default()
    };
    DirectorySession::builder(Arc::new(config))
        .clock(Arc::new(FixedClock(NOW)))
        .build()
        .expect("session should build")
}

/// Device API replaying scripted responses in order.
struct ScriptedDeviceContacts {
    responses: Mutex<VecDeque<Result<Vec<DeviceContactRecord>, DeviceApiError>>>,
}

impl ScriptedDeviceContacts {
    fn new(responses: Vec<Result<Vec<DeviceContactRecord>, DeviceApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl DeviceContactsApi for ScriptedDeviceContacts {
    async fn request_contacts(&self) -> Result<Vec<DeviceContactRecord>, DeviceApiError> {
        tokio::task::yield_now().await;
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(DeviceApiError::Unavailable("script exhausted".to_string())))
    }
}

/// Adapter that blocks until released, to observe the `Syncing` state.
struct GatedAdapter {
    channel: SyncChannel,
    gate: Arc<Notify>,
    calls: AtomicUsize,
    seeds: Vec<RawContact>,
}

#[async_trait]
impl ChannelAdapter for GatedAdapter {
    fn channel(&self) -> SyncChannel {
        self.channel
    }

    fn source_tag(&self) -> &'static str {
        "mock"
    }

    async fn fetch_contacts(&self) -> Result<Vec<RawContact>, SyncError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(self.seeds.clone())
    }
}

#[tokio::test]
async fn instagram_sync_adds_two_contacts_with_batch_ids() {
    let session = session(DuplicatePolicy::Dedupe);

    let report = session
        .sync_channel(SyncChannel::Instagram)
        .await
        .expect("instagram sync should succeed");

    assert_eq!(report.fetched, 2);
    assert_eq!(
        report.added,
        vec![
            format!("mock-instagram-{NOW}-0"),
            format!("mock-instagram-{NOW}-1"),
        ]
    );
    assert_eq!(report.summary(), "Added 2 contact(s) from Instagram.");

    let contacts = session.contacts();
    assert_eq!(contacts.len(), 2);
    assert!(contacts
        .iter()
        .all(|contact| contact.method == ContactMethod::Instagram));
    assert_eq!(contacts[0].handle, "@insta_friend_1");
    assert_eq!(
        session.sync().channel_state(SyncChannel::Instagram),
        Some(ChannelState::Idle)
    );
}

#[tokio::test]
async fn repeated_sync_dedupes_and_reports_skips() {
    let session = session(DuplicatePolicy::Dedupe);

    session
        .sync_channel(SyncChannel::Instagram)
        .await
        .expect("first sync");
    let second = session
        .sync_channel(SyncChannel::Instagram)
        .await
        .expect("second sync");

    assert!(second.added.is_empty());
    assert_eq!(second.skipped_duplicates, 2);
    assert_eq!(session.store().len(), 2);
}

#[tokio::test]
async fn repeated_sync_accumulates_when_duplicates_allowed() {
    let session = session(DuplicatePolicy::AllowDuplicates);

    session
        .sync_channel(SyncChannel::Instagram)
        .await
        .expect("first sync");
    let second = session
        .sync_channel(SyncChannel::Instagram)
        .await
        .expect("second sync");

    assert_eq!(second.skipped_duplicates, 0);
    assert_eq!(
        second.added,
        vec![
            format!("mock-instagram-{}-0", NOW + 1),
            format!("mock-instagram-{}-1", NOW + 1),
        ]
    );
    assert_eq!(session.store().len(), 4);
}

#[tokio::test]
async fn reentrant_sync_is_refused_while_other_channels_proceed() {
    let store = Arc::new(InMemoryDirectoryStore::new(DuplicatePolicy::Dedupe));
    let ids = Arc::new(IdAllocator::new(Arc::new(FixedClock(NOW))));
    let gate = Arc::new(Notify::new());
    let gated = Arc::new(GatedAdapter {
        channel: SyncChannel::Instagram,
        gate: Arc::clone(&gate),
        calls: AtomicUsize::new(0),
        seeds: vec![RawContact::new(
            "Insta Friend 1",
            ContactMethod::Instagram,
            "@insta_friend_1",
        )],
    });

    let config = DirectoryConfig::default();
    let mut orchestrator = SyncOrchestrator::new(
        Arc::clone(&store),
        ids,
        Arc::new(config.country_code_table()),
        config.default_country_code.clone(),
    );
    orchestrator
        .register(gated.clone())
        .expect("register gated adapter");
    orchestrator
        .register(Arc::new(MockSocialAdapter::from_config(
            SyncChannel::X,
            &config,
        )))
        .expect("register x adapter");
    let orchestrator = Arc::new(orchestrator);
    let mut events = orchestrator.subscribe();

    let in_flight = tokio::spawn({
        let orchestrator = Arc::clone(&orchestrator);
        async move { orchestrator.sync(SyncChannel::Instagram).await }
    });
    while !orchestrator.is_syncing(SyncChannel::Instagram) {
        tokio::task::yield_now().await;
    }

    let refused = orchestrator
        .sync(SyncChannel::Instagram)
        .await
        .expect_err("re-entrant sync must be refused");
    assert_eq!(
        refused,
        SyncRequestError::AlreadySyncing(SyncChannel::Instagram)
    );
    assert_eq!(gated.calls.load(Ordering::SeqCst), 1);

    let x_report = orchestrator
        .sync(SyncChannel::X)
        .await
        .expect("x sync should not wait for instagram");
    assert_eq!(x_report.added_count(), 1);
    assert!(orchestrator.is_syncing(SyncChannel::Instagram));

    gate.notify_one();
    let report = in_flight
        .await
        .expect("task should join")
        .expect("instagram sync should succeed");
    assert_eq!(report.added_count(), 1);
    assert_eq!(store.len(), 2);
    assert!(!orchestrator.is_syncing(SyncChannel::Instagram));

    let mut refused_events = 0;
    while let Ok(event) = events.try_recv() {
        if event == SyncEvent::Refused(SyncChannel::Instagram) {
            refused_events += 1;
        }
    }
    assert_eq!(refused_events, 1);
}

#[tokio::test]
async fn concurrent_syncs_on_different_channels_both_contribute() {
    let session = session(DuplicatePolicy::Dedupe);

    let (instagram, snapchat) = tokio::join!(
        session.sync_channel(SyncChannel::Instagram),
        session.sync_channel(SyncChannel::Snapchat)
    );

    assert_eq!(instagram.expect("instagram sync").added_count(), 2);
    assert_eq!(snapchat.expect("snapchat sync").added_count(), 2);
    assert_eq!(session.store().len(), 4);

    let ids: std::collections::HashSet<String> =
        session.contacts().into_iter().map(|c| c.id).collect();
    assert_eq!(ids.len(), 4);
}

#[tokio::test]
async fn device_failure_is_recoverable_and_isolated() {
    let api = ScriptedDeviceContacts::new(vec![
        Err(DeviceApiError::PermissionDenied),
        Ok(vec![
            DeviceContactRecord::phone("Mum", "+44 7700 900001"),
            DeviceContactRecord::phone("", "+44 7700 900002"),
        ]),
    ]);
    let session = DirectorySession::builder(DirectoryConfig::shared_default())
        .clock(Arc::new(FixedClock(NOW)))
        .device_api(Arc::new(api))
        .build()
        .expect("session should build");

    let err = session
        .sync_channel(SyncChannel::Device)
        .await
        .expect_err("permission denied must fail");
    let expected = SyncError::new(SyncChannel::Device, SyncFailure::PermissionDenied);
    assert_eq!(err, SyncRequestError::Sync(expected.clone()));
    assert_eq!(
        session.sync().channel_state(SyncChannel::Device),
        Some(ChannelState::Failed(expected))
    );
    assert!(session.contacts().is_empty());

    session
        .sync_channel(SyncChannel::X)
        .await
        .expect("other channels are unaffected");

    let report = session
        .sync_channel(SyncChannel::Device)
        .await
        .expect("retry after failure should succeed");
    assert_eq!(report.fetched, 2);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.added, vec![format!("device-contacts-{}-0", NOW + 2)]);
    assert_eq!(
        session.sync().channel_state(SyncChannel::Device),
        Some(ChannelState::Idle)
    );

    let mum = session
        .store()
        .find_by_handle(ContactMethod::Phone, "+44 7700 900001")
        .expect("device contact stored");
    assert_eq!(mum.name, "Mum");
}

#[tokio::test]
async fn device_channel_is_absent_without_api() {
    let session = session(DuplicatePolicy::Dedupe);
    let err = session
        .sync_channel(SyncChannel::Device)
        .await
        .expect_err("device is not registered");
    assert_eq!(err, SyncRequestError::NotRegistered(SyncChannel::Device));
}

#[tokio::test]
async fn device_numbers_share_the_manual_phone_form() {
    let api = ScriptedDeviceContacts::new(vec![Ok(vec![
        DeviceContactRecord::phone("Jane (work)", "+44 7700 900123"),
        DeviceContactRecord::phone("Jane (mobile)", "+447700900999"),
        DeviceContactRecord::phone("Prankster", "call me maybe"),
    ])]);
    let session = DirectorySession::builder(DirectoryConfig::shared_default())
        .clock(Arc::new(FixedClock(NOW)))
        .device_api(Arc::new(api))
        .build()
        .expect("session should build");

    session
        .submit("Jane", &HandleInput::phone("+44", "7700 900123"))
        .expect("manual phone should be admitted");

    let report = session
        .sync_channel(SyncChannel::Device)
        .await
        .expect("device sync should succeed");
    assert_eq!(report.fetched, 3);
    assert_eq!(report.skipped_duplicates, 1);
    assert_eq!(report.rejected, 1);
    assert_eq!(report.added, vec![format!("device-contacts-{}-1", NOW + 1)]);

    let handles: Vec<String> = session
        .contacts()
        .into_iter()
        .map(|contact| contact.handle)
        .collect();
    assert_eq!(handles, vec!["+44 7700 900123", "+44 7700900999"]);
}

#[tokio::test]
async fn padded_seed_handle_blocks_manual_duplicate() {
    let mut config = DirectoryConfig::default();
    config.social_seeds.insert(
        SyncChannel::X,
        vec![RawContact::new(" Padded Pal ", ContactMethod::X, " @a ")],
    );
    let session = DirectorySession::builder(Arc::new(config))
        .clock(Arc::new(FixedClock(NOW)))
        .build()
        .expect("session should build");

    session
        .sync_channel(SyncChannel::X)
        .await
        .expect("x sync should succeed");
    let stored = session.contacts();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "Padded Pal");
    assert_eq!(stored[0].handle, "@a");

    let err = session
        .submit("Same Pal", &HandleInput::X("@a".to_string()))
        .expect_err("trimmed seed handle must dedupe");
    assert_eq!(
        err,
        ManualEntryError::Duplicate {
            method: ContactMethod::X,
            handle: "@a".to_string(),
        }
    );
    assert_eq!(session.store().len(), 1);
}
