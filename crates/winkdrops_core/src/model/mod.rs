//! Directory domain model.
//!
//! # Responsibility
//! - Define canonical contact records shared by manual entry and sync paths.
//! - Define the closed channel sets used to address and source contacts.
//!
//! # Invariants
//! - Stored contacts always carry a non-empty id, name and handle.
//! - Contacts are never mutated after admission to the directory.

pub mod channel;
pub mod contact;
pub mod country;
