//! Manual contact entry.
//!
//! # Responsibility
//! - Validate and normalize one hand-entered contact.
//! - Admit it to the directory with a `manual-<timestamp>` id.
//! - Hold entry-form state so a method switch never carries a stale handle.
//!
//! # Invariants
//! - Validation failures never mutate the directory.
//! - A contact refused as a duplicate is reported, not dropped silently.

use crate::handle::normalizer::{normalize, Field, HandleInput, ValidationError};
use crate::model::contact::{Contact, ContactMethod, RawContact};
use crate::model::country::CountryCodeTable;
use crate::repo::directory_store::{DirectoryStore, StoreError};
use crate::sync::ids::{manual_contact_id, IdAllocator};
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Manual entry failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualEntryError {
    Validation(ValidationError),
    /// `(method, handle)` is already in the directory.
    Duplicate {
        method: ContactMethod,
        handle: String,
    },
    Store(StoreError),
}

impl Display for ManualEntryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Duplicate { method, handle } => {
                write!(f, "a {method} contact with handle `{handle}` already exists")
            }
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ManualEntryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Duplicate { .. } => None,
        }
    }
}

impl From<ValidationError> for ManualEntryError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<StoreError> for ManualEntryError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Entry-form state for one manual contact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    method: ContactMethod,
    country_code: String,
    handle: String,
    default_country_code: String,
}

impl ContactDraft {
    /// Starts an empty phone draft with `default_country_code` selected.
    pub fn new(default_country_code: impl Into<String>) -> Self {
        let default_country_code = default_country_code.into();
        Self {
            name: String::new(),
            method: ContactMethod::Phone,
            country_code: default_country_code.clone(),
            handle: String::new(),
            default_country_code,
        }
    }

    pub fn method(&self) -> ContactMethod {
        self.method
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Typed handle value; the local number when the method is phone.
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Selects a method. Changing it clears the handle and resets the
    /// country code.
    pub fn set_method(&mut self, method: ContactMethod) {
        if self.method == method {
            return;
        }
        self.method = method;
        self.handle.clear();
        self.country_code.clone_from(&self.default_country_code);
    }

    /// Selects a country code. Only read while the method is `Phone`.
    pub fn set_country_code(&mut self, code: impl Into<String>) {
        self.country_code = code.into();
    }

    /// Replaces the typed handle, the local number for `Phone`.
    pub fn set_handle(&mut self, value: impl Into<String>) {
        self.handle = value.into();
    }

    /// Builds the normalizer input for the current method.
    pub fn to_input(&self) -> HandleInput {
        match self.method {
            ContactMethod::Phone => HandleInput::phone(&self.country_code, &self.handle),
            other => HandleInput::single(other, &self.handle),
        }
    }

    /// Clears typed fields after a successful submit. The method is kept.
    pub fn reset(&mut self) {
        self.name.clear();
        self.handle.clear();
        self.country_code.clone_from(&self.default_country_code);
    }
}

/// Validates hand-entered contacts and admits them to the directory.
pub struct ManualEntryService<S: DirectoryStore> {
    store: Arc<S>,
    ids: Arc<IdAllocator>,
    country_codes: Arc<CountryCodeTable>,
}

impl<S: DirectoryStore> ManualEntryService<S> {
    /// # Contract
    /// - `ids` must be the allocator shared with the sync orchestrator, so
    ///   manual and batch stamps never collide.
    pub fn new(store: Arc<S>, ids: Arc<IdAllocator>, country_codes: Arc<CountryCodeTable>) -> Self {
        Self {
            store,
            ids,
            country_codes,
        }
    }

    /// Validates, normalizes and admits one contact.
    ///
    /// # Errors
    /// - `Validation` for a blank name or an invalid handle.
    /// - `Duplicate` when the directory dedupes and the handle is taken.
    pub fn submit(&self, name: &str, input: &HandleInput) -> Result<Contact, ManualEntryError> {
        let name = name.trim();
        if name.is_empty() {
            debug!("event=manual_entry module=service status=rejected field=name");
            return Err(ValidationError::EmptyField(Field::Name).into());
        }

        let method = input.method();
        let handle = normalize(input, &self.country_codes).map_err(|err| {
            debug!(
                "event=manual_entry module=service status=rejected method={} field={}",
                method,
                err.field().as_str()
            );
            err
        })?;

        let contact = RawContact::new(name, method, handle)
            .bind(manual_contact_id(self.ids.next_stamp()));
        let outcome = self.store.add(vec![contact.clone()])?;
        if outcome.skipped_duplicates > 0 {
            info!(
                "event=manual_entry module=service status=duplicate method={}",
                method
            );
            return Err(ManualEntryError::Duplicate {
                method,
                handle: contact.handle,
            });
        }

        info!(
            "event=manual_entry module=service status=ok method={} id={}",
            method, contact.id
        );
        Ok(contact)
    }

    /// Submits the current draft state.
    pub fn submit_draft(&self, draft: &ContactDraft) -> Result<Contact, ManualEntryError> {
        self.submit(&draft.name, &draft.to_input())
    }
}
