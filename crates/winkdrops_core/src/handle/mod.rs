//! Handle canonicalization.
//!
//! # Responsibility
//! - Turn raw user-entered handle fields into the stored handle form.
//! - Report field-level validation errors without touching the directory.
//!
//! # Invariants
//! - `normalize` is the only place that knows per-method handle rules.

pub mod normalizer;
