//! Directory storage abstractions and the session implementation.
//!
//! # Responsibility
//! - Define the roster contract used by manual entry and sync admission.
//! - Keep duplicate and id-uniqueness policy in one place.
//!
//! # Invariants
//! - Store writes must enforce `Contact::validate()` before admission.
//! - A rejected batch leaves the roster unchanged.

pub mod directory_store;
