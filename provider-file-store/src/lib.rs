//! # JSON File Store Provider
//!
//! Implements the listing collaborator traits over plain JSON files.
//!
//! ## Overview
//!
//! This module provides:
//! - `JsonLocalSource`: the local listing export, read-only
//! - `JsonFileStore`: a remote mirror kept as a JSON array, supporting
//!   fetch, upsert and delete by identity key
//!
//! Both expect a top-level array of flat objects. A missing file reads as an
//! empty collection.

pub mod source;
pub mod store;

pub use source::JsonLocalSource;
pub use store::JsonFileStore;
