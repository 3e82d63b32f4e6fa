//! Directory use-case services.
//!
//! # Responsibility
//! - Turn user input into directory admissions.
//! - Keep presentation layers decoupled from store details.

pub mod manual_entry;
