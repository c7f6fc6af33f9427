//! # Authentication Module
//!
//! Credential handling for the remote marketplace side of a sync run.
//!
//! ## Overview
//!
//! The engine asks for a token at most once per run, and only when the
//! marketplace credentials look configured. This crate supplies the pieces
//! behind that call:
//!
//! - [`Credentials`] read from the environment, with placeholder detection
//! - [`AccessToken`] with expiry and a redacted `Debug`
//! - [`CredentialCache`], an explicitly constructed single-token cache
//! - [`CachedAuthenticator`], which implements the engine's `Authenticator`
//!   over any [`TokenSource`]
//!
//! The refresh protocol itself is not implemented here. [`EnvTokenSource`]
//! serves a token that was acquired out of band.

pub mod authenticator;
pub mod cache;
pub mod error;
pub mod types;

pub use authenticator::{CachedAuthenticator, EnvTokenSource, TokenSource};
pub use cache::CredentialCache;
pub use error::{AuthError, Result};
pub use types::{AccessToken, Credentials};
