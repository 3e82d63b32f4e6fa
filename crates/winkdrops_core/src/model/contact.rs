//! Contact domain model.
//!
//! # Responsibility
//! - Define the canonical record stored by the directory.
//! - Define the unbound record produced by adapters before id assignment.
//!
//! # Invariants
//! - `id`, `name` and `handle` are non-empty for every stored contact.
//! - `handle` is already in canonical form for its `method`.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque session-unique contact identifier.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ContactId = String;

/// Closed set of channels a contact can be reached on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContactMethod {
    Phone,
    Email,
    Instagram,
    X,
    Snapchat,
    TikTok,
    /// In-app identity, not an external channel.
    WinkDrops,
}

impl ContactMethod {
    /// All methods in display order.
    pub const ALL: [ContactMethod; 7] = [
        Self::Phone,
        Self::Email,
        Self::Instagram,
        Self::X,
        Self::Snapchat,
        Self::TikTok,
        Self::WinkDrops,
    ];

    /// Stable wire name, identical to the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Phone => "Phone",
            Self::Email => "Email",
            Self::Instagram => "Instagram",
            Self::X => "X",
            Self::Snapchat => "Snapchat",
            Self::TikTok => "TikTok",
            Self::WinkDrops => "WinkDrops",
        }
    }
}

impl Display for ContactMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses one contact method from its wire name.
pub fn parse_contact_method(value: &str) -> Option<ContactMethod> {
    let normalized = value.trim();
    ContactMethod::ALL
        .into_iter()
        .find(|method| method.as_str() == normalized)
}

/// Contact record produced by a source before it receives an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawContact {
    pub name: String,
    pub method: ContactMethod,
    pub handle: String,
}

impl RawContact {
    /// Builds an unbound record. Fields are stored as given; admission
    /// canonicalizes them.
    pub fn new(name: impl Into<String>, method: ContactMethod, handle: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method,
            handle: handle.into(),
        }
    }

    /// Binds this record to a session id, producing a storable contact.
    pub fn bind(self, id: impl Into<ContactId>) -> Contact {
        Contact {
            id: id.into(),
            name: self.name,
            method: self.method,
            handle: self.handle,
        }
    }
}

/// Canonical directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Session-unique id, e.g. `manual-1700000000000` or
    /// `mock-instagram-1700000000000-0`.
    pub id: ContactId,
    pub name: String,
    pub method: ContactMethod,
    /// Canonical handle for `method`, e.g. `+44 7700 900123`.
    pub handle: String,
}

impl Contact {
    /// Validates stored-contact invariants.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.id.trim().is_empty() {
            return Err(ContactValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ContactValidationError::EmptyName);
        }
        if self.handle.trim().is_empty() {
            return Err(ContactValidationError::EmptyHandle);
        }
        Ok(())
    }

    /// Key used for duplicate detection.
    pub fn dedupe_key(&self) -> (ContactMethod, &str) {
        (self.method, self.handle.as_str())
    }
}

/// Stored-contact invariant violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactValidationError {
    EmptyId,
    EmptyName,
    EmptyHandle,
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "contact id must not be empty"),
            Self::EmptyName => write!(f, "contact name must not be empty"),
            Self::EmptyHandle => write!(f, "contact handle must not be empty"),
        }
    }
}

impl Error for ContactValidationError {}

#[cfg(test)]
mod tests {
    use super::{parse_contact_method, Contact, ContactMethod, ContactValidationError, RawContact};

    #[test]
    fn parses_wire_names_only() {
        assert_eq!(parse_contact_method(" TikTok "), Some(ContactMethod::TikTok));
        assert_eq!(parse_contact_method("X"), Some(ContactMethod::X));
        assert_eq!(parse_contact_method("tiktok"), None);
        assert_eq!(parse_contact_method(""), None);
    }

    #[test]
    fn bind_keeps_fields_and_sets_id() {
        let contact =
            RawContact::new("Snap Pal", ContactMethod::Snapchat, "snap_pal").bind("mock-snapchat-1-0");
        assert_eq!(contact.id, "mock-snapchat-1-0");
        assert_eq!(contact.name, "Snap Pal");
        assert_eq!(contact.method, ContactMethod::Snapchat);
        assert_eq!(contact.handle, "snap_pal");
        contact.validate().expect("bound contact should be valid");
    }

    #[test]
    fn validate_rejects_blank_fields() {
        let base = Contact {
            id: "manual-1".to_string(),
            name: "Jane".to_string(),
            method: ContactMethod::Email,
            handle: "jane@x.com".to_string(),
        };

        let mut blank_id = base.clone();
        blank_id.id = " ".to_string();
        assert_eq!(blank_id.validate(), Err(ContactValidationError::EmptyId));

        let mut blank_name = base.clone();
        blank_name.name = String::new();
        assert_eq!(blank_name.validate(), Err(ContactValidationError::EmptyName));

        let mut blank_handle = base;
        blank_handle.handle = "\t".to_string();
        assert_eq!(
            blank_handle.validate(),
            Err(ContactValidationError::EmptyHandle)
        );
    }
}
