//! Multi-channel contact sync.
//!
//! # Responsibility
//! - Define the adapter contract shared by real and mocked sources.
//! - Coordinate per-channel attempts and admit results into the directory.
//!
//! # Invariants
//! - Every adapter is async, including instantaneous mocks.
//! - Ids are assigned at admission, never by the source.

pub mod adapter;
pub mod device_adapter;
pub mod ids;
pub mod mock_adapter;
pub mod orchestrator;
