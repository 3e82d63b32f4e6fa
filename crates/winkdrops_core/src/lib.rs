//! Contact directory and multi-channel sync engine for WinkDrops.
//! This crate is the single source of truth for roster invariants.

pub mod config;
pub mod handle;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod session;
pub mod sync;

pub use config::{ConfigError, DirectoryConfig, DuplicatePolicy};
pub use handle::normalizer::{normalize, Field, HandleInput, ValidationError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::channel::{parse_sync_channel, SyncChannel};
pub use model::contact::{
    parse_contact_method, Contact, ContactId, ContactMethod, ContactValidationError, RawContact,
};
pub use model::country::{CountryCode, CountryCodeTable};
pub use repo::directory_store::{
    AddOutcome, ContactListQuery, DirectoryStore, InMemoryDirectoryStore, StoreError, StoreResult,
};
pub use service::manual_entry::{ContactDraft, ManualEntryError, ManualEntryService};
pub use session::{DirectorySession, DirectorySessionBuilder};
pub use sync::adapter::{ChannelAdapter, SyncError, SyncFailure};
pub use sync::device_adapter::{
    DeviceAdapter, DeviceApiError, DeviceContactRecord, DeviceContactsApi,
    UnsupportedDeviceContacts,
};
pub use sync::ids::{Clock, FixedClock, IdAllocator, SystemClock};
pub use sync::mock_adapter::MockSocialAdapter;
pub use sync::orchestrator::{
    ChannelState, RegistryError, SyncEvent, SyncOrchestrator, SyncReport, SyncRequestError,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
