//! Channel adapter contract and sync failure types.

use crate::model::channel::SyncChannel;
use crate::model::contact::RawContact;
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Source tag used in ids of device-sourced contacts.
pub const SOURCE_TAG_DEVICE: &str = "device";
/// Source tag used in ids of mock-sourced contacts.
pub const SOURCE_TAG_MOCK: &str = "mock";

/// Source of raw contacts for one channel.
///
/// Implementations must be safe to call repeatedly; the orchestrator
/// guarantees at most one in-flight call per channel.
#[async_trait]
pub trait ChannelAdapter: Send + Sync {
    fn channel(&self) -> SyncChannel;

    /// Leading segment of ids assigned to this adapter's contacts.
    fn source_tag(&self) -> &'static str;

    async fn fetch_contacts(&self) -> Result<Vec<RawContact>, SyncError>;
}

/// Why a sync attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncFailure {
    PermissionDenied,
    AdapterFailure(String),
    /// Fetch succeeded but the directory refused the batch.
    Admission(String),
}

impl Display for SyncFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::AdapterFailure(reason) => write!(f, "adapter failure: {reason}"),
            Self::Admission(reason) => write!(f, "admission rejected: {reason}"),
        }
    }
}

/// Failure of one sync attempt on one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncError {
    pub channel: SyncChannel,
    pub cause: SyncFailure,
}

impl SyncError {
    pub fn new(channel: SyncChannel, cause: SyncFailure) -> Self {
        Self { channel, cause }
    }

    /// User declined or revoked access to the source.
    pub fn permission_denied(channel: SyncChannel) -> Self {
        Self::new(channel, SyncFailure::PermissionDenied)
    }

    /// Source-side failure described by `reason`.
    pub fn adapter_failure(channel: SyncChannel, reason: impl Into<String>) -> Self {
        Self::new(channel, SyncFailure::AdapterFailure(reason.into()))
    }

    /// Stable machine-readable code for logs and presentation.
    pub fn code(&self) -> &'static str {
        match self.cause {
            SyncFailure::PermissionDenied => "permission_denied",
            SyncFailure::AdapterFailure(_) => "adapter_failure",
            SyncFailure::Admission(_) => "admission_rejected",
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "sync from {} failed: {}", self.channel.label(), self.cause)
    }
}

impl Error for SyncError {}
