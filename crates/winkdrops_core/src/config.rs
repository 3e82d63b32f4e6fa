//! Static directory configuration.
//!
//! # Responsibility
//! - Hold the country-code table, mock social seed tables and admission
//!   policy as immutable data loaded once at startup.
//! - Parse and validate JSON overrides.
//!
//! # Invariants
//! - A validated config always has a non-empty country-code table containing
//!   `default_country_code`.
//! - Seed tables only exist for social channels and match their method.
//! - Every seed passes the same canonicalization as synced records.

use crate::handle::normalizer::normalize_synced;
use crate::model::channel::SyncChannel;
use crate::model::contact::{ContactMethod, RawContact};
use crate::model::country::{CountryCode, CountryCodeTable};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;

static COUNTRY_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+[0-9]{1,4}$").expect("valid country code regex"));

static DEFAULT_CONFIG: Lazy<Arc<DirectoryConfig>> = Lazy::new(|| Arc::new(DirectoryConfig::default()));

/// How the directory treats a contact whose `(method, handle)` is already
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep the first-seen contact and report later ones as skipped.
    #[default]
    Dedupe,
    /// Append every contact, including repeats.
    AllowDuplicates,
}

/// Directory configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub country_codes: Vec<CountryCode>,
    pub default_country_code: String,
    pub social_seeds: BTreeMap<SyncChannel, Vec<RawContact>>,
    pub duplicate_policy: DuplicatePolicy,
    /// Artificial delay applied by mock social adapters.
    pub mock_latency_ms: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            country_codes: default_country_codes(),
            default_country_code: "+1".to_string(),
            social_seeds: default_social_seeds(),
            duplicate_policy: DuplicatePolicy::default(),
            mock_latency_ms: 0,
        }
    }
}

impl DirectoryConfig {
    /// Shared built-in configuration.
    pub fn shared_default() -> Arc<DirectoryConfig> {
        Arc::clone(&DEFAULT_CONFIG)
    }

    /// Parses and validates a JSON document. Missing keys take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.display().to_string(),
            source: err,
        })?;
        Self::from_json_str(&raw)
    }

    /// Validates declaration-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.country_codes.is_empty() {
            return Err(ConfigError::Invalid(
                "country_codes must not be empty".to_string(),
            ));
        }

        let mut seen = BTreeSet::new();
        for entry in &self.country_codes {
            if !COUNTRY_CODE_RE.is_match(&entry.code) {
                return Err(ConfigError::Invalid(format!(
                    "country code `{}` must look like `+<digits>`",
                    entry.code
                )));
            }
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "country code `{}` has an empty name",
                    entry.code
                )));
            }
            if !seen.insert(entry.code.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "country code `{}` is listed more than once",
                    entry.code
                )));
            }
        }

        if !seen.contains(self.default_country_code.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "default_country_code `{}` is not in country_codes",
                self.default_country_code
            )));
        }

        let table = self.country_code_table();
        for (channel, seeds) in &self.social_seeds {
            let Some(method) = channel.method() else {
                return Err(ConfigError::Invalid(format!(
                    "seed table is not allowed for channel `{channel}`"
                )));
            };
            for seed in seeds {
                if seed.method != method {
                    return Err(ConfigError::Invalid(format!(
                        "seed for `{channel}` has method `{}`",
                        seed.method
                    )));
                }
                normalize_synced(seed, &table, &self.default_country_code).map_err(|err| {
                    ConfigError::Invalid(format!("seed for `{channel}` is invalid: {err}"))
                })?;
            }
        }

        Ok(())
    }

    /// Country-code table view.
    pub fn country_code_table(&self) -> CountryCodeTable {
        CountryCodeTable::new(self.country_codes.clone())
    }

    /// Seed list for one social channel; empty when none is configured.
    pub fn seeds_for(&self, channel: SyncChannel) -> Vec<RawContact> {
        self.social_seeds.get(&channel).cloned().unwrap_or_default()
    }
}

/// Configuration load/validation errors.
#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: String,
        source: std::io::Error,
    },
    Parse(serde_json::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "failed to read config `{path}`: {source}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

fn default_country_codes() -> Vec<CountryCode> {
    [
        ("+1", "United States/Canada"),
        ("+44", "United Kingdom"),
        ("+61", "Australia"),
        ("+91", "India"),
        ("+49", "Germany"),
        ("+33", "France"),
        ("+81", "Japan"),
        ("+52", "Mexico"),
        ("+55", "Brazil"),
        ("+234", "Nigeria"),
    ]
    .into_iter()
    .map(|(code, name)| CountryCode::new(code, name))
    .collect()
}

fn default_social_seeds() -> BTreeMap<SyncChannel, Vec<RawContact>> {
    let mut seeds = BTreeMap::new();
    seeds.insert(
        SyncChannel::Instagram,
        vec![
            RawContact::new("Insta Friend 1", ContactMethod::Instagram, "@insta_friend_1"),
            RawContact::new("Insta Friend 2", ContactMethod::Instagram, "@insta_friend_2"),
        ],
    );
    seeds.insert(
        SyncChannel::X,
        vec![RawContact::new("X Colleague", ContactMethod::X, "@x_colleague")],
    );
    seeds.insert(
        SyncChannel::Snapchat,
        vec![
            RawContact::new("Snap Pal", ContactMethod::Snapchat, "snap_pal"),
            RawContact::new("Bestie Snap", ContactMethod::Snapchat, "bestie_snap"),
        ],
    );
    seeds.insert(
        SyncChannel::TikTok,
        vec![RawContact::new(
            "TikTok Creator",
            ContactMethod::TikTok,
            "@tiktok_creator",
        )],
    );
    seeds
}
