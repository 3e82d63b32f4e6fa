//! Per-method handle normalizer.
//!
//! # Invariants
//! - Phone handles are stored as `"<countryCode> <localNumber>"`.
//! - Email and platform handles are stored trimmed, otherwise as entered.
//! - Output is never empty on success.
//! - Synced records reach the store through the same rules as manual entry.

use crate::model::contact::{ContactMethod, RawContact};
use crate::model::country::CountryCodeTable;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static LOCAL_NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9 ().\-]*[0-9][0-9 ().\-]*$").expect("valid local number regex")
});

/// Raw handle fields, one variant per contact method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleInput {
    Phone { country_code: String, number: String },
    Email(String),
    Instagram(String),
    X(String),
    Snapchat(String),
    TikTok(String),
    WinkDrops(String),
}

impl HandleInput {
    /// Builds a cleared input for `method`.
    ///
    /// Phone inputs start with `default_country_code` selected.
    pub fn empty(method: ContactMethod, default_country_code: &str) -> Self {
        match method {
            ContactMethod::Phone => Self::Phone {
                country_code: default_country_code.to_string(),
                number: String::new(),
            },
            other => Self::single(other, String::new()),
        }
    }

    /// Builds a non-phone input from one text value.
    ///
    /// For `ContactMethod::Phone` the value is taken as the local number with
    /// no country code selected.
    pub fn single(method: ContactMethod, value: impl Into<String>) -> Self {
        let value = value.into();
        match method {
            ContactMethod::Phone => Self::Phone {
                country_code: String::new(),
                number: value,
            },
            ContactMethod::Email => Self::Email(value),
            ContactMethod::Instagram => Self::Instagram(value),
            ContactMethod::X => Self::X(value),
            ContactMethod::Snapchat => Self::Snapchat(value),
            ContactMethod::TikTok => Self::TikTok(value),
            ContactMethod::WinkDrops => Self::WinkDrops(value),
        }
    }

    /// Builds a phone input from a selected code and a typed local number.
    pub fn phone(country_code: impl Into<String>, number: impl Into<String>) -> Self {
        Self::Phone {
            country_code: country_code.into(),
            number: number.into(),
        }
    }

    /// Method the input was built for.
    pub fn method(&self) -> ContactMethod {
        match self {
            Self::Phone { .. } => ContactMethod::Phone,
            Self::Email(_) => ContactMethod::Email,
            Self::Instagram(_) => ContactMethod::Instagram,
            Self::X(_) => ContactMethod::X,
            Self::Snapchat(_) => ContactMethod::Snapchat,
            Self::TikTok(_) => ContactMethod::TikTok,
            Self::WinkDrops(_) => ContactMethod::WinkDrops,
        }
    }

    /// Whether the user-typed handle part is empty.
    ///
    /// The phone country code is a selection, not typed input, and is ignored.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Phone { number, .. } => number.trim().is_empty(),
            Self::Email(value)
            | Self::Instagram(value)
            | Self::X(value)
            | Self::Snapchat(value)
            | Self::TikTok(value)
            | Self::WinkDrops(value) => value.trim().is_empty(),
        }
    }
}

/// Form field a validation error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    CountryCode,
    LocalNumber,
    Handle,
}

impl Field {
    /// Stable field id used in logs and error text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CountryCode => "country_code",
            Self::LocalNumber => "local_number",
            Self::Handle => "handle",
        }
    }
}

/// Synchronous input validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyField(Field),
    InvalidFormat { field: Field, value: String },
}

impl ValidationError {
    /// Form field to highlight.
    pub fn field(&self) -> Field {
        match self {
            Self::EmptyField(field) | Self::InvalidFormat { field, .. } => *field,
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{} must not be empty", field.as_str()),
            Self::InvalidFormat { field, value } => {
                write!(f, "{} has invalid format: `{value}`", field.as_str())
            }
        }
    }
}

impl Error for ValidationError {}

/// Canonicalizes raw handle fields into the stored handle form.
///
/// # Errors
/// - `EmptyField` when a required field is blank.
/// - `InvalidFormat` for an unknown country code or a malformed local number.
pub fn normalize(
    input: &HandleInput,
    country_codes: &CountryCodeTable,
) -> Result<String, ValidationError> {
    match input {
        HandleInput::Phone {
            country_code,
            number,
        } => normalize_phone(country_code, number, country_codes),
        HandleInput::Email(value)
        | HandleInput::Instagram(value)
        | HandleInput::X(value)
        | HandleInput::Snapchat(value)
        | HandleInput::TikTok(value)
        | HandleInput::WinkDrops(value) => require_trimmed(value, Field::Handle),
    }
}

/// Canonicalizes a record delivered by a sync source.
///
/// # Contract
/// - Name and handle are trimmed for every method; blank ones fail.
/// - A phone handle starting with `+` must start with a listed code, which is
///   split off as the country code. Any other phone handle is taken as a local
///   number under `default_country_code`.
/// - Phone results use the same `"<countryCode> <localNumber>"` form as
///   [`normalize`], so a synced number and a typed one dedupe against each
///   other when spelled alike.
///
/// # Errors
/// - `EmptyField(Name)` or `EmptyField(Handle)` for blank fields.
/// - `InvalidFormat` for an unlisted `+` prefix or a malformed local number.
pub fn normalize_synced(
    raw: &RawContact,
    country_codes: &CountryCodeTable,
    default_country_code: &str,
) -> Result<RawContact, ValidationError> {
    let name = require_trimmed(&raw.name, Field::Name)?;
    let value = require_trimmed(&raw.handle, Field::Handle)?;

    let handle = match raw.method {
        ContactMethod::Phone if value.starts_with('+') => {
            let code = country_codes.match_prefix(&value).ok_or_else(|| {
                ValidationError::InvalidFormat {
                    field: Field::CountryCode,
                    value: value.clone(),
                }
            })?;
            normalize_phone(&code.code, &value[code.code.len()..], country_codes)?
        }
        ContactMethod::Phone => normalize_phone(default_country_code, &value, country_codes)?,
        _ => value,
    };

    Ok(RawContact::new(name, raw.method, handle))
}

fn normalize_phone(
    country_code: &str,
    number: &str,
    country_codes: &CountryCodeTable,
) -> Result<String, ValidationError> {
    let code = require_trimmed(country_code, Field::CountryCode)?;
    if !country_codes.contains(&code) {
        return Err(ValidationError::InvalidFormat {
            field: Field::CountryCode,
            value: code,
        });
    }

    let local = require_trimmed(number, Field::LocalNumber)?;
    if !LOCAL_NUMBER_RE.is_match(&local) {
        return Err(ValidationError::InvalidFormat {
            field: Field::LocalNumber,
            value: local,
        });
    }

    Ok(format!("{code} {local}"))
}

fn require_trimmed(value: &str, field: Field) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}
