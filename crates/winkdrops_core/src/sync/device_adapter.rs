//! Device address-book adapter.
//!
//! # Responsibility
//! - Bridge the platform contacts API (permission-gated, async) into raw
//!   directory records.
//!
//! # Invariants
//! - Records default to `ContactMethod::Phone` unless the platform names
//!   another method.
//! - Names and handles are trimmed; blank records are passed through for the
//!   orchestrator to reject and count.

use crate::model::channel::SyncChannel;
use crate::model::contact::{ContactMethod, RawContact};
use crate::sync::adapter::{ChannelAdapter, SyncError, SOURCE_TAG_DEVICE};
use async_trait::async_trait;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// One record returned by the platform contacts API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceContactRecord {
    pub name: String,
    pub phone_or_handle: String,
    /// Set when the platform exposes a non-phone channel for the record.
    pub method: Option<ContactMethod>,
}

impl DeviceContactRecord {
    /// Address-book entry reached by phone, the common case.
    pub fn phone(name: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone_or_handle: number.into(),
            method: None,
        }
    }
}

/// Platform contacts API failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceApiError {
    PermissionDenied,
    Unavailable(String),
}

impl Display for DeviceApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied => write!(f, "contacts permission denied"),
            Self::Unavailable(reason) => write!(f, "contacts api unavailable: {reason}"),
        }
    }
}

impl Error for DeviceApiError {}

/// Platform contacts capability. Implementations show the permission prompt.
#[async_trait]
pub trait DeviceContactsApi: Send + Sync {
    async fn request_contacts(&self) -> Result<Vec<DeviceContactRecord>, DeviceApiError>;
}

/// Contacts API for platforms without address-book access.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedDeviceContacts;

#[async_trait]
impl DeviceContactsApi for UnsupportedDeviceContacts {
    async fn request_contacts(&self) -> Result<Vec<DeviceContactRecord>, DeviceApiError> {
        Err(DeviceApiError::Unavailable(
            "contact picker is not supported on this platform".to_string(),
        ))
    }
}

/// Adapter for `SyncChannel::Device`.
pub struct DeviceAdapter {
    api: Arc<dyn DeviceContactsApi>,
}

impl DeviceAdapter {
    /// Wraps a platform contacts API.
    pub fn new(api: Arc<dyn DeviceContactsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ChannelAdapter for DeviceAdapter {
    fn channel(&self) -> SyncChannel {
        SyncChannel::Device
    }

    fn source_tag(&self) -> &'static str {
        SOURCE_TAG_DEVICE
    }

    async fn fetch_contacts(&self) -> Result<Vec<RawContact>, SyncError> {
        let records = self.api.request_contacts().await.map_err(|err| match err {
            DeviceApiError::PermissionDenied => SyncError::permission_denied(SyncChannel::Device),
            DeviceApiError::Unavailable(reason) => {
                SyncError::adapter_failure(SyncChannel::Device, reason)
            }
        })?;

        debug!(
            "event=device_contacts_fetched module=sync status=ok count={}",
            records.len()
        );

        Ok(records
            .into_iter()
            .map(|record| {
                RawContact::new(
                    record.name.trim(),
                    record.method.unwrap_or(ContactMethod::Phone),
                    record.phone_or_handle.trim(),
                )
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        DeviceAdapter, DeviceApiError, DeviceContactRecord, DeviceContactsApi,
        UnsupportedDeviceContacts,
    };
    use crate::model::channel::SyncChannel;
    use crate::model::contact::{ContactMethod, RawContact};
    use crate::sync::adapter::{ChannelAdapter, SyncFailure};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StaticContacts(Result<Vec<DeviceContactRecord>, DeviceApiError>);

    #[async_trait]
    impl DeviceContactsApi for StaticContacts {
        async fn request_contacts(&self) -> Result<Vec<DeviceContactRecord>, DeviceApiError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn maps_records_to_trimmed_raw_contacts() {
        let adapter = DeviceAdapter::new(Arc::new(StaticContacts(Ok(vec![
            DeviceContactRecord::phone(" Mum ", " +44 7700 900001 "),
            DeviceContactRecord {
                name: "Sam".to_string(),
                phone_or_handle: "sam@x.com".to_string(),
                method: Some(ContactMethod::Email),
            },
        ]))));

        let raws = adapter.fetch_contacts().await.expect("fetch should succeed");
        assert_eq!(
            raws,
            vec![
                RawContact::new("Mum", ContactMethod::Phone, "+44 7700 900001"),
                RawContact::new("Sam", ContactMethod::Email, "sam@x.com"),
            ]
        );
        assert_eq!(adapter.channel(), SyncChannel::Device);
        assert_eq!(adapter.source_tag(), "device");
    }

    #[tokio::test]
    async fn maps_permission_denied() {
        let adapter =
            DeviceAdapter::new(Arc::new(StaticContacts(Err(DeviceApiError::PermissionDenied))));
        let err = adapter.fetch_contacts().await.expect_err("denied must fail");
        assert_eq!(err.channel, SyncChannel::Device);
        assert_eq!(err.cause, SyncFailure::PermissionDenied);
    }

    #[tokio::test]
    async fn unsupported_platform_is_adapter_failure() {
        let adapter = DeviceAdapter::new(Arc::new(UnsupportedDeviceContacts));
        let err = adapter.fetch_contacts().await.expect_err("unsupported must fail");
        assert!(matches!(err.cause, SyncFailure::AdapterFailure(_)));
    }
}
