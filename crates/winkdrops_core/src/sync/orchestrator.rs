//! Per-channel sync coordination.
//!
//! # Responsibility
//! - Hold one adapter per channel and run it on request.
//! - Track `Idle -> Syncing -> (Idle | Failed)` per channel.
//! - Canonicalize fetched records, bind them to ids and admit them to the
//!   directory in one batch.
//!
//! # Invariants
//! - At most one attempt per channel is in flight; re-entrant requests are
//!   refused without calling the adapter.
//! - A failed attempt admits nothing and does not affect other channels.
//! - No retry, timeout or cancellation: an attempt that never resolves keeps
//!   its channel `Syncing`.

use crate::handle::normalizer::normalize_synced;
use crate::model::channel::SyncChannel;
use crate::model::contact::{Contact, ContactId, RawContact};
use crate::model::country::CountryCodeTable;
use crate::repo::directory_store::DirectoryStore;
use crate::sync::adapter::{ChannelAdapter, SyncError, SyncFailure};
use crate::sync::ids::{batch_contact_id, IdAllocator};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use uuid::Uuid;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Sync state of one channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Idle,
    Syncing,
    /// Last attempt failed. A new attempt may be started.
    Failed(SyncError),
}

/// Summary of one successful attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Correlates log lines and events of one attempt.
    pub attempt_id: Uuid,
    pub channel: SyncChannel,
    /// Records returned by the adapter.
    pub fetched: usize,
    pub added: Vec<ContactId>,
    pub skipped_duplicates: usize,
    /// Records dropped for a method foreign to the channel or a handle that
    /// fails canonicalization.
    pub rejected: usize,
}

impl SyncReport {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    /// One-line user-facing result message.
    pub fn summary(&self) -> String {
        let mut message = format!(
            "Added {} contact(s) from {}.",
            self.added_count(),
            self.channel.label()
        );
        if self.skipped_duplicates > 0 {
            message.push_str(&format!(
                " Skipped {} duplicate(s).",
                self.skipped_duplicates
            ));
        }
        message
    }
}

/// Progress notification for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Started {
        channel: SyncChannel,
        attempt_id: Uuid,
    },
    Completed(SyncReport),
    Failed(SyncError),
    /// A request arrived while the channel was already syncing.
    Refused(SyncChannel),
}

/// Adapter registration errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateChannel(SyncChannel),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateChannel(channel) => {
                write!(f, "adapter already registered for channel: {channel}")
            }
        }
    }
}

impl Error for RegistryError {}

/// Why a sync request did not produce a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRequestError {
    NotRegistered(SyncChannel),
    AlreadySyncing(SyncChannel),
    Sync(SyncError),
}

impl Display for SyncRequestError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotRegistered(channel) => write!(f, "no adapter registered for {channel}"),
            Self::AlreadySyncing(channel) => write!(f, "{channel} is already syncing"),
            Self::Sync(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncRequestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sync(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SyncError> for SyncRequestError {
    fn from(value: SyncError) -> Self {
        Self::Sync(value)
    }
}

/// Runs channel adapters and admits their results.
pub struct SyncOrchestrator<S: DirectoryStore> {
    adapters: BTreeMap<SyncChannel, Arc<dyn ChannelAdapter>>,
    states: Mutex<BTreeMap<SyncChannel, ChannelState>>,
    store: Arc<S>,
    ids: Arc<IdAllocator>,
    country_codes: Arc<CountryCodeTable>,
    default_country_code: String,
    events: broadcast::Sender<SyncEvent>,
}

impl<S: DirectoryStore> SyncOrchestrator<S> {
    /// Builds an orchestrator with no adapters.
    ///
    /// `country_codes` and `default_country_code` drive phone canonicalization
    /// of synced records, the same way they drive manual entry.
    pub fn new(
        store: Arc<S>,
        ids: Arc<IdAllocator>,
        country_codes: Arc<CountryCodeTable>,
        default_country_code: impl Into<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            adapters: BTreeMap::new(),
            states: Mutex::new(BTreeMap::new()),
            store,
            ids,
            country_codes,
            default_country_code: default_country_code.into(),
            events,
        }
    }

    /// Registers one adapter under its channel.
    pub fn register(&mut self, adapter: Arc<dyn ChannelAdapter>) -> Result<(), RegistryError> {
        let channel = adapter.channel();
        if self.adapters.contains_key(&channel) {
            return Err(RegistryError::DuplicateChannel(channel));
        }
        self.adapters.insert(channel, adapter);
        self.lock_states().insert(channel, ChannelState::Idle);
        Ok(())
    }

    /// Registered channels in stable order.
    pub fn channels(&self) -> Vec<SyncChannel> {
        self.adapters.keys().copied().collect()
    }

    /// Returns `None` for channels without an adapter.
    pub fn channel_state(&self, channel: SyncChannel) -> Option<ChannelState> {
        self.lock_states().get(&channel).cloned()
    }

    /// Busy flag for disabling the trigger of an in-flight channel.
    pub fn is_syncing(&self, channel: SyncChannel) -> bool {
        matches!(self.channel_state(channel), Some(ChannelState::Syncing))
    }

    /// Receiver for events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs one sync attempt on `channel`.
    ///
    /// # Errors
    /// - `NotRegistered` when no adapter serves `channel`.
    /// - `AlreadySyncing` when an attempt on `channel` is in flight.
    /// - `Sync` when the adapter or admission fails; the channel is left
    ///   `Failed`.
    pub async fn sync(&self, channel: SyncChannel) -> Result<SyncReport, SyncRequestError> {
        let adapter = self
            .adapters
            .get(&channel)
            .cloned()
            .ok_or(SyncRequestError::NotRegistered(channel))?;

        self.begin(channel)?;

        let attempt_id = Uuid::new_v4();
        let stamp = self.ids.next_stamp();
        info!(
            "event=contact_sync module=sync status=started channel={} attempt_id={}",
            channel, attempt_id
        );
        self.emit(SyncEvent::Started {
            channel,
            attempt_id,
        });

        let outcome = match adapter.fetch_contacts().await {
            Ok(raws) => self.admit(channel, adapter.source_tag(), attempt_id, stamp, raws),
            Err(err) => Err(SyncError::new(channel, err.cause)),
        };

        match outcome {
            Ok(report) => {
                self.set_state(channel, ChannelState::Idle);
                info!(
                    "event=contact_sync module=sync status=ok channel={} attempt_id={} fetched={} added={} skipped={} rejected={} duplicate_policy={:?}",
                    channel,
                    attempt_id,
                    report.fetched,
                    report.added_count(),
                    report.skipped_duplicates,
                    report.rejected,
                    self.store.duplicate_policy()
                );
                self.emit(SyncEvent::Completed(report.clone()));
                Ok(report)
            }
            Err(err) => {
                self.set_state(channel, ChannelState::Failed(err.clone()));
                warn!(
                    "event=contact_sync module=sync status=error channel={} attempt_id={} code={}",
                    channel,
                    attempt_id,
                    err.code()
                );
                self.emit(SyncEvent::Failed(err.clone()));
                Err(SyncRequestError::Sync(err))
            }
        }
    }

    fn begin(&self, channel: SyncChannel) -> Result<(), SyncRequestError> {
        {
            let mut states = self.lock_states();
            let state = states.entry(channel).or_default();
            if *state != ChannelState::Syncing {
                *state = ChannelState::Syncing;
                return Ok(());
            }
        }

        info!(
            "event=contact_sync module=sync status=refused channel={} reason=already_syncing",
            channel
        );
        self.emit(SyncEvent::Refused(channel));
        Err(SyncRequestError::AlreadySyncing(channel))
    }

    fn admit(
        &self,
        channel: SyncChannel,
        source_tag: &str,
        attempt_id: Uuid,
        stamp: i64,
        raws: Vec<RawContact>,
    ) -> Result<SyncReport, SyncError> {
        let fetched = raws.len();
        let mut rejected = 0;
        let mut contacts: Vec<Contact> = Vec::with_capacity(fetched);

        for (index, raw) in raws.iter().enumerate() {
            if channel.method().is_some_and(|method| method != raw.method) {
                rejected += 1;
                continue;
            }
            match normalize_synced(raw, &self.country_codes, &self.default_country_code) {
                Ok(clean) => {
                    let id = batch_contact_id(source_tag, channel.id_segment(), stamp, index);
                    contacts.push(clean.bind(id));
                }
                Err(err) => {
                    debug!(
                        "event=contact_sync_rejected module=sync channel={} attempt_id={} index={} field={}",
                        channel,
                        attempt_id,
                        index,
                        err.field().as_str()
                    );
                    rejected += 1;
                }
            }
        }

        if rejected > 0 {
            warn!(
                "event=contact_sync_rejected module=sync status=partial channel={} attempt_id={} rejected={}",
                channel, attempt_id, rejected
            );
        }

        let outcome = self.store.add(contacts).map_err(|err| {
            SyncError::new(channel, SyncFailure::Admission(err.to_string()))
        })?;

        Ok(SyncReport {
            attempt_id,
            channel,
            fetched,
            added: outcome.added,
            skipped_duplicates: outcome.skipped_duplicates,
            rejected,
        })
    }

    fn set_state(&self, channel: SyncChannel, state: ChannelState) {
        self.lock_states().insert(channel, state);
    }

    fn emit(&self, event: SyncEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn lock_states(&self) -> MutexGuard<'_, BTreeMap<SyncChannel, ChannelState>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
