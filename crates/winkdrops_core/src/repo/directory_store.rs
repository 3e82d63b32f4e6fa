//! Directory store contract and in-memory implementation.
//!
//! # Responsibility
//! - Own the session roster and expose batch add plus read queries.
//! - Apply the configured duplicate policy on `(method, handle)`.
//!
//! # Invariants
//! - Contact ids are unique for the life of the store.
//! - Reads return contacts in insertion order.
//! - Under `DuplicatePolicy::Dedupe` no two contacts share `(method, handle)`.

use crate::config::DuplicatePolicy;
use crate::model::contact::{Contact, ContactId, ContactMethod, ContactValidationError};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub type StoreResult<T> = Result<T, StoreError>;

/// Batch admission failure. The batch is not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Invalid {
        id: ContactId,
        source: ContactValidationError,
    },
    DuplicateId(ContactId),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid { id, source } => write!(f, "contact `{id}` is invalid: {source}"),
            Self::DuplicateId(id) => write!(f, "contact id already stored: {id}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Invalid { source, .. } => Some(source),
            Self::DuplicateId(_) => None,
        }
    }
}

/// Result of one batch admission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOutcome {
    /// Ids admitted, in batch order.
    pub added: Vec<ContactId>,
    /// Contacts dropped because their `(method, handle)` was already present.
    pub skipped_duplicates: usize,
}

impl AddOutcome {
    pub fn added_count(&self) -> usize {
        self.added.len()
    }
}

/// Query options for listing contacts.
#[derive(Debug, Clone, Default)]
pub struct ContactListQuery {
    pub method: Option<ContactMethod>,
    /// Case-insensitive substring match on `name`.
    pub name_contains: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// Roster contract shared by sync admission and manual entry.
pub trait DirectoryStore: Send + Sync {
    fn add(&self, contacts: Vec<Contact>) -> StoreResult<AddOutcome>;
    fn all(&self) -> Vec<Contact>;
    fn get(&self, id: &str) -> Option<Contact>;
    fn find_by_handle(&self, method: ContactMethod, handle: &str) -> Option<Contact>;
    fn list(&self, query: &ContactListQuery) -> Vec<Contact>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn duplicate_policy(&self) -> DuplicatePolicy;
}

/// Session-lifetime roster held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectoryStore {
    policy: DuplicatePolicy,
    contacts: Mutex<Vec<Contact>>,
}

impl InMemoryDirectoryStore {
    /// Empty roster applying `policy` to every batch.
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            contacts: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Contact>> {
        // A panic while holding the lock cannot leave a half-applied batch:
        // batches are appended with a single `extend`.
        self.contacts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DirectoryStore for InMemoryDirectoryStore {
    fn add(&self, contacts: Vec<Contact>) -> StoreResult<AddOutcome> {
        let mut stored = self.lock();

        let mut ids: HashSet<&str> = stored.iter().map(|contact| contact.id.as_str()).collect();
        for contact in &contacts {
            contact.validate().map_err(|source| StoreError::Invalid {
                id: contact.id.clone(),
                source,
            })?;
            if !ids.insert(contact.id.as_str()) {
                return Err(StoreError::DuplicateId(contact.id.clone()));
            }
        }

        let mut outcome = AddOutcome::default();
        let mut admitted = Vec::with_capacity(contacts.len());
        match self.policy {
            DuplicatePolicy::AllowDuplicates => {
                outcome.added = contacts.iter().map(|contact| contact.id.clone()).collect();
                admitted = contacts;
            }
            DuplicatePolicy::Dedupe => {
                let mut keys: HashSet<(ContactMethod, String)> = stored
                    .iter()
                    .map(|contact| (contact.method, contact.handle.clone()))
                    .collect();
                for contact in contacts {
                    if keys.insert((contact.method, contact.handle.clone())) {
                        outcome.added.push(contact.id.clone());
                        admitted.push(contact);
                    } else {
                        outcome.skipped_duplicates += 1;
                    }
                }
            }
        }

        stored.extend(admitted);
        Ok(outcome)
    }

    fn all(&self) -> Vec<Contact> {
        self.lock().clone()
    }

    fn get(&self, id: &str) -> Option<Contact> {
        let id = id.trim();
        self.lock().iter().find(|contact| contact.id == id).cloned()
    }

    fn find_by_handle(&self, method: ContactMethod, handle: &str) -> Option<Contact> {
        self.lock()
            .iter()
            .find(|contact| contact.dedupe_key() == (method, handle))
            .cloned()
    }

    fn list(&self, query: &ContactListQuery) -> Vec<Contact> {
        let needle = query
            .name_contains
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_lowercase);

        self.lock()
            .iter()
            .filter(|contact| query.method.map_or(true, |method| contact.method == method))
            .filter(|contact| {
                needle
                    .as_deref()
                    .map_or(true, |needle| contact.name.to_lowercase().contains(needle))
            })
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn duplicate_policy(&self) -> DuplicatePolicy {
        self.policy
    }
}
