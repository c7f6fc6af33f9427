//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-sync`, `provider-file-store`). Host
//! applications can depend on `listing-sync-workspace` and enable the
//! documented features without needing to wire each crate individually.

#[cfg(feature = "engine")]
pub use core_sync;

#[cfg(feature = "file-store")]
pub use provider_file_store;
