//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the listing sync engine:
//! - Logging and tracing infrastructure
//! - Run configuration
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the engine and the command-line
//! host depend on. It establishes the logging conventions and the way run
//! settings are assembled from the environment and the command line.

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
