//! # Inventory Bridge Traits
//!
//! Contracts between the reconciliation engine and the integration layer that
//! talks to real inventory stores.
//!
//! ## Overview
//!
//! The engine never reads files or calls marketplace APIs itself. Everything
//! that touches the outside world is reached through the traits defined here,
//! implemented by provider crates and registered by the host binary.
//!
//! ## Traits
//!
//! ### Collaborators
//! - [`LocalFetcher`](inventory::LocalFetcher) - Source of the local listing collection
//! - [`RemoteFetcher`](inventory::RemoteFetcher) - Source of the remote listing collection
//! - [`Upserter`](inventory::Upserter) - Create or update a remote listing
//! - [`Deleter`](inventory::Deleter) - Remove a remote listing (optional)
//! - [`Authenticator`](inventory::Authenticator) - Acquire an access token
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Records
//!
//! Listings are exchanged as [`Item`](record::Item) values: insertion-ordered
//! field bags with scalar values. The engine reads identity and timestamp
//! fields from them and otherwise passes them through untouched.
//!
//! ## Error Handling
//!
//! All collaborator traits use [`BridgeError`](error::BridgeError). Provider
//! implementations should convert their own failures into it with an
//! actionable message; the engine records the message text against the item
//! that failed.
//!
//! ## Thread Safety
//!
//! Every trait requires `Send + Sync` so that bound collaborators can be
//! shared across concurrently running apply calls.
//!
//! ## Example
//!
//! ```ignore
//! use async_trait::async_trait;
//! use bridge_traits::{ApplyResult, Item, Upserter};
//! use bridge_traits::error::Result;
//!
//! struct PrintUpserter;
//!
//! #[async_trait]
//! impl Upserter for PrintUpserter {
//!     async fn upsert(&self, local: &Item, _remote: Option<&Item>) -> Result<ApplyResult> {
//!         println!("would push {:?}", local);
//!         Ok(ApplyResult::label("skipped"))
//!     }
//! }
//! ```

pub mod error;
pub mod inventory;
pub mod record;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use inventory::{
    ApplyResult, Authenticator, BearerToken, Capability, Deleter, LocalFetcher, RemoteFetcher,
    Upserter,
};
pub use record::{FieldValue, Item};
pub use time::{Clock, FixedClock, LogLevel, SystemClock};
