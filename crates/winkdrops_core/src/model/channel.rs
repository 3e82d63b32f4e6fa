//! Sync channel identifiers.

use crate::model::contact::ContactMethod;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Source a batch of contacts can be synced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncChannel {
    /// Device address book behind a permission prompt.
    Device,
    Instagram,
    X,
    Snapchat,
    TikTok,
}

impl SyncChannel {
    /// Social channels backed by mock adapters.
    pub const SOCIAL: [SyncChannel; 4] = [Self::Instagram, Self::X, Self::Snapchat, Self::TikTok];

    /// Stable lowercase id used in logs and config keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Device => "device",
            Self::Instagram => "instagram",
            Self::X => "x",
            Self::Snapchat => "snapchat",
            Self::TikTok => "tiktok",
        }
    }

    /// User-facing channel label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Device => "Device",
            Self::Instagram => "Instagram",
            Self::X => "X",
            Self::Snapchat => "Snapchat",
            Self::TikTok => "TikTok",
        }
    }

    /// Middle segment of batch contact ids.
    pub fn id_segment(self) -> &'static str {
        match self {
            Self::Device => "contacts",
            other => other.as_str(),
        }
    }

    /// Contact method every record from this channel carries, if fixed.
    pub fn method(self) -> Option<ContactMethod> {
        match self {
            Self::Device => None,
            Self::Instagram => Some(ContactMethod::Instagram),
            Self::X => Some(ContactMethod::X),
            Self::Snapchat => Some(ContactMethod::Snapchat),
            Self::TikTok => Some(ContactMethod::TikTok),
        }
    }
}

impl Display for SyncChannel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one channel from its lowercase id.
pub fn parse_sync_channel(value: &str) -> Option<SyncChannel> {
    match value.trim().to_ascii_lowercase().as_str() {
        "device" => Some(SyncChannel::Device),
        "instagram" => Some(SyncChannel::Instagram),
        "x" => Some(SyncChannel::X),
        "snapchat" => Some(SyncChannel::Snapchat),
        "tiktok" => Some(SyncChannel::TikTok),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_sync_channel, SyncChannel};
    use crate::model::contact::ContactMethod;

    #[test]
    fn social_channels_map_to_their_method() {
        for channel in SyncChannel::SOCIAL {
            let method = channel.method().expect("social channel has a method");
            assert_eq!(method.as_str(), channel.label());
        }
        assert_eq!(SyncChannel::Device.method(), None);
        assert_eq!(SyncChannel::X.method(), Some(ContactMethod::X));
    }

    #[test]
    fn device_uses_contacts_id_segment() {
        assert_eq!(SyncChannel::Device.id_segment(), "contacts");
        assert_eq!(SyncChannel::TikTok.id_segment(), "tiktok");
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(parse_sync_channel(" Instagram "), Some(SyncChannel::Instagram));
        assert_eq!(parse_sync_channel("DEVICE"), Some(SyncChannel::Device));
        assert_eq!(parse_sync_channel("myspace"), None);
    }
}
