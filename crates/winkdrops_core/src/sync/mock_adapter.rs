//! Mock social-platform adapters.
//!
//! Social sync has no real protocol yet; each adapter replays an injected
//! seed table. Fetches still suspend at least once so callers observe the
//! same async behavior as the device adapter.

use crate::config::DirectoryConfig;
use crate::model::channel::SyncChannel;
use crate::model::contact::RawContact;
use crate::sync::adapter::{ChannelAdapter, SyncError, SOURCE_TAG_MOCK};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Seed-replaying adapter for one social channel.
#[derive(Debug, Clone)]
pub struct MockSocialAdapter {
    channel: SyncChannel,
    seeds: Arc<[RawContact]>,
    latency: Duration,
}

impl MockSocialAdapter {
    /// Adapter serving `seeds` as-is on every fetch.
    ///
    /// # Contract
    /// - Every fetch returns the seeds untouched; admission canonicalizes them.
    /// - Fetches never fail.
    pub fn new(channel: SyncChannel, seeds: impl Into<Arc<[RawContact]>>) -> Self {
        Self {
            channel,
            seeds: seeds.into(),
            latency: Duration::ZERO,
        }
    }

    /// Builds an adapter from the configured seed table for `channel`.
    pub fn from_config(channel: SyncChannel, config: &DirectoryConfig) -> Self {
        Self::new(channel, config.seeds_for(channel))
            .with_latency(Duration::from_millis(config.mock_latency_ms))
    }

    /// Builds adapters for every social channel.
    pub fn all_from_config(config: &DirectoryConfig) -> Vec<Self> {
        SyncChannel::SOCIAL
            .into_iter()
            .map(|channel| Self::from_config(channel, config))
            .collect()
    }

    /// Delays every fetch by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

#[async_trait]
impl ChannelAdapter for MockSocialAdapter {
    fn channel(&self) -> SyncChannel {
        self.channel
    }

    fn source_tag(&self) -> &'static str {
        SOURCE_TAG_MOCK
    }

    async fn fetch_contacts(&self) -> Result<Vec<RawContact>, SyncError> {
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.seeds.to_vec())
    }
}
