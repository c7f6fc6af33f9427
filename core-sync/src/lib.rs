//! # Listing Reconciliation Engine
//!
//! Reconciles a local listing collection against a remote source of truth.
//!
//! ## Overview
//!
//! The engine does not fetch or write listings itself. The integration layer
//! registers typed collaborators, the engine binds one per capability, then
//! plans and applies the create/update/delete work and records every outcome.
//!
//! ## Components
//!
//! - **Capability Resolver** (`resolver`): Binds collaborators by override, well-known name or heuristic
//! - **Identity & Indexing** (`identity`): Derives identity keys and builds ordered indexes
//! - **Temporal Filter** (`temporal`): `since` filtering over heterogeneous timestamps
//! - **Reconciler** (`reconciler`): Auth gate, fetch, upsert and delete passes
//! - **Run Summary** (`summary`): Outcome recorder and the sealed, serializable summary
//! - **Artifact Writer** (`artifacts`): JSON summary, `sync.log` rollup and CSV export

pub mod artifacts;
pub mod error;
pub mod identity;
pub mod reconciler;
pub mod resolver;
pub mod summary;
pub mod temporal;

pub use artifacts::ArtifactWriter;
pub use error::{Result, SyncError};
pub use identity::{build_index, identity, IdentityIndex};
pub use reconciler::Reconciler;
pub use resolver::{BindingTable, Bindings, Bound, CollaboratorRegistry};
pub use summary::{Action, Outcome, OutcomeCounts, RunRecorder, RunSummary};
pub use temporal::{item_timestamp, parse_cutoff, select_since};
