//! Directory session wiring.
//!
//! # Responsibility
//! - Build the roster, id allocator, sync orchestrator and manual entry
//!   service from one validated config.
//!
//! # Invariants
//! - All components of one session share one store and one id allocator.
//! - Every social channel gets a mock adapter; the device channel is only
//!   registered when a contacts API is supplied.

use crate::config::{ConfigError, DirectoryConfig};
use crate::handle::normalizer::HandleInput;
use crate::model::channel::SyncChannel;
use crate::model::contact::Contact;
use crate::repo::directory_store::{DirectoryStore, InMemoryDirectoryStore};
use crate::service::manual_entry::{ContactDraft, ManualEntryError, ManualEntryService};
use crate::sync::adapter::ChannelAdapter;
use crate::sync::device_adapter::{DeviceAdapter, DeviceContactsApi};
use crate::sync::ids::{Clock, IdAllocator, SystemClock};
use crate::sync::mock_adapter::MockSocialAdapter;
use crate::sync::orchestrator::{SyncOrchestrator, SyncReport, SyncRequestError};
use log::info;
use std::sync::Arc;

/// Builder for a [`DirectorySession`].
pub struct DirectorySessionBuilder {
    config: Arc<DirectoryConfig>,
    clock: Arc<dyn Clock>,
    device_api: Option<Arc<dyn DeviceContactsApi>>,
}

impl DirectorySessionBuilder {
    /// Starts from the system clock and no device access.
    pub fn new(config: Arc<DirectoryConfig>) -> Self {
        Self {
            config,
            clock: Arc::new(SystemClock),
            device_api: None,
        }
    }

    /// Overrides the id clock, e.g. with a `FixedClock` in tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Registers the device channel backed by `api`.
    pub fn device_api(mut self, api: Arc<dyn DeviceContactsApi>) -> Self {
        self.device_api = Some(api);
        self
    }

    /// Validates the config and wires the session.
    pub fn build(self) -> Result<DirectorySession, ConfigError> {
        self.config.validate()?;

        let store = Arc::new(InMemoryDirectoryStore::new(self.config.duplicate_policy));
        let ids = Arc::new(IdAllocator::new(self.clock));
        let country_codes = Arc::new(self.config.country_code_table());
        let manual = ManualEntryService::new(
            Arc::clone(&store),
            Arc::clone(&ids),
            Arc::clone(&country_codes),
        );

        let mut sync = SyncOrchestrator::new(
            Arc::clone(&store),
            ids,
            country_codes,
            self.config.default_country_code.clone(),
        );
        let mut adapters: Vec<Arc<dyn ChannelAdapter>> = Vec::new();
        if let Some(api) = self.device_api {
            adapters.push(Arc::new(DeviceAdapter::new(api)));
        }
        for adapter in MockSocialAdapter::all_from_config(&self.config) {
            adapters.push(Arc::new(adapter));
        }
        for adapter in adapters {
            sync.register(adapter).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        }

        info!(
            "event=directory_session_start module=session status=ok channels={} duplicate_policy={:?}",
            sync.channels().len(),
            self.config.duplicate_policy
        );

        Ok(DirectorySession {
            config: self.config,
            store,
            manual,
            sync,
        })
    }
}

/// One user's in-memory directory for the life of the app session.
pub struct DirectorySession {
    config: Arc<DirectoryConfig>,
    store: Arc<InMemoryDirectoryStore>,
    manual: ManualEntryService<InMemoryDirectoryStore>,
    sync: SyncOrchestrator<InMemoryDirectoryStore>,
}

impl DirectorySession {
    pub fn builder(config: Arc<DirectoryConfig>) -> DirectorySessionBuilder {
        DirectorySessionBuilder::new(config)
    }

    /// Session over the built-in config with no device access.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::builder(DirectoryConfig::shared_default()).build()
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    pub fn store(&self) -> &InMemoryDirectoryStore {
        &self.store
    }

    pub fn sync(&self) -> &SyncOrchestrator<InMemoryDirectoryStore> {
        &self.sync
    }

    pub fn manual(&self) -> &ManualEntryService<InMemoryDirectoryStore> {
        &self.manual
    }

    /// Fresh entry draft with the configured default country code.
    pub fn new_draft(&self) -> ContactDraft {
        ContactDraft::new(self.config.default_country_code.clone())
    }

    /// Shortcut for [`ManualEntryService::submit`].
    pub fn submit(&self, name: &str, input: &HandleInput) -> Result<Contact, ManualEntryError> {
        self.manual.submit(name, input)
    }

    /// Runs one attempt on `channel`.
    ///
    /// # Contract
    /// - Attempts on different channels may run concurrently.
    /// - A second request for an in-flight channel is refused with
    ///   `AlreadySyncing`.
    pub async fn sync_channel(&self, channel: SyncChannel) -> Result<SyncReport, SyncRequestError> {
        self.sync.sync(channel).await
    }

    /// Current roster in insertion order.
    pub fn contacts(&self) -> Vec<Contact> {
        self.store.all()
    }
}

#[cfg(test)]
mod tests {
    use super::DirectorySession;
    use crate::config::DirectoryConfig;
    use crate::model::channel::SyncChannel;
    use crate::sync::device_adapter::UnsupportedDeviceContacts;
    use std::sync::Arc;

    #[test]
    fn default_session_registers_social_channels_only() {
        let session = DirectorySession::with_defaults().expect("default session");
        assert_eq!(session.sync().channels(), SyncChannel::SOCIAL.to_vec());
        assert!(session.contacts().is_empty());
        assert_eq!(session.new_draft().country_code(), "+1");
    }

    #[test]
    fn device_channel_registered_when_api_supplied() {
        let session = DirectorySession::builder(DirectoryConfig::shared_default())
            .device_api(Arc::new(UnsupportedDeviceContacts))
            .build()
            .expect("session with device");
        assert_eq!(session.sync().channels().first(), Some(&SyncChannel::Device));
        assert_eq!(session.sync().channels().len(), 5);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = DirectoryConfig {
            country_codes: Vec::new(),
            ..DirectoryConfig::default()
        };
        assert!(DirectorySession::builder(Arc::new(config)).build().is_err());
    }
}
