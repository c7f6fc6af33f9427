//! # Sync Configuration Module
//!
//! Provides run configuration for the listing reconciliation engine.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! [`SyncSettings`] instance holding everything a single run needs: simulation
//! mode, the optional `--since` cutoff, artifact locations, capability
//! overrides and the switches that disable authentication or the delete pass.
//!
//! Settings come from two places. Environment-style keys are read through
//! [`SyncSettingsBuilder::from_lookup`] (or [`SyncSettingsBuilder::from_env`]),
//! and command-line values are layered on top with the regular builder
//! methods before [`build()`](SyncSettingsBuilder::build) validates the result.
//!
//! ## Environment Keys
//!
//! | Key                   | Meaning                                     |
//! |-----------------------|---------------------------------------------|
//! | `EBT_GET_LOCAL_FN`    | Collaborator name forced for local fetch    |
//! | `EBT_GET_REMOTE_FN`   | Collaborator name forced for remote fetch   |
//! | `EBT_UPSERT_FN`       | Collaborator name forced for upsert         |
//! | `EBT_DELETE_FN`       | Collaborator name forced for delete         |
//! | `EBT_DISABLE_AUTH`    | Boolean-like, skips authentication          |
//! | `EBT_DISABLE_DELETE`  | Boolean-like, skips the delete pass         |
//! | `EBT_MAX_CONCURRENCY` | In-flight apply calls per pass (1-64)       |
//! | `EBT_LOG_DIR`         | Artifact and debug log directory            |
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SyncSettings;
//!
//! let settings = SyncSettings::builder()
//!     .dry_run(true)
//!     .since("2025-10-01")
//!     .log_dir("logs")
//!     .build()?;
//! # Ok::<(), core_runtime::Error>(())
//! ```

use crate::error::{Error, Result};
use bridge_traits::Capability;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default directory for run artifacts
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Upper bound for concurrent apply calls
pub const MAX_CONCURRENCY_LIMIT: usize = 64;

pub const ENV_DISABLE_AUTH: &str = "EBT_DISABLE_AUTH";
pub const ENV_DISABLE_DELETE: &str = "EBT_DISABLE_DELETE";
pub const ENV_MAX_CONCURRENCY: &str = "EBT_MAX_CONCURRENCY";
pub const ENV_LOG_DIR: &str = "EBT_LOG_DIR";

/// Settings for a single reconciliation run.
///
/// Use [`SyncSettingsBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// Simulation mode: no auth, no remote fetch, no side effects
    pub dry_run: bool,

    /// Raw `--since` value; parsed by the engine, which ignores it when invalid
    pub since: Option<String>,

    /// Optional path for the single-row CSV rollup
    pub summary_csv: Option<PathBuf>,

    /// Directory receiving the JSON summary, the run log and the debug log
    pub log_dir: PathBuf,

    /// Capability -> collaborator name forced by the environment
    pub overrides: BTreeMap<Capability, String>,

    /// Skip authentication even when credentials look configured
    pub disable_auth: bool,

    /// Skip the delete pass even when a deleter is bound
    pub disable_delete: bool,

    /// Number of apply calls allowed in flight during a pass
    pub max_concurrency: usize,
}

impl SyncSettings {
    /// Creates a new builder for constructing `SyncSettings`.
    pub fn builder() -> SyncSettingsBuilder {
        SyncSettingsBuilder::default()
    }

    /// Collaborator name forced for a capability, if any
    pub fn override_for(&self, capability: Capability) -> Option<&str> {
        self.overrides.get(&capability).map(String::as_str)
    }

    /// Validates the settings and returns an error if invalid.
    ///
    /// This checks:
    /// - The log directory is not empty
    /// - `max_concurrency` is between 1 and 64
    pub fn validate(&self) -> Result<()> {
        if self.log_dir.as_os_str().is_empty() {
            return Err(Error::Config("Log directory cannot be empty".to_string()));
        }

        if self.max_concurrency == 0 {
            return Err(Error::Config(
                "Max concurrency must be at least 1".to_string(),
            ));
        }

        if self.max_concurrency > MAX_CONCURRENCY_LIMIT {
            return Err(Error::Config(format!(
                "Max concurrency exceeds maximum of {}",
                MAX_CONCURRENCY_LIMIT
            )));
        }

        Ok(())
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            dry_run: false,
            since: None,
            summary_csv: None,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            overrides: BTreeMap::new(),
            disable_auth: false,
            disable_delete: false,
            max_concurrency: 1,
        }
    }
}

/// Interpret a boolean-like environment value.
///
/// `1`, `true`, `yes`, `on` are true; `0`, `false`, `no`, `off` and the empty
/// string are false. Any other non-empty value counts as true.
pub fn parse_flag(value: &str) -> bool {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "" | "0" | "false" | "no" | "off" => false,
        _ => true,
    }
}

/// Builder for constructing [`SyncSettings`] instances.
#[derive(Debug, Default, Clone)]
pub struct SyncSettingsBuilder {
    dry_run: bool,
    since: Option<String>,
    summary_csv: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    overrides: BTreeMap<Capability, String>,
    disable_auth: bool,
    disable_delete: bool,
    max_concurrency: Option<usize>,
}

impl SyncSettingsBuilder {
    /// Pre-populate a builder from environment-style keys.
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value for a key, or `None` when unset
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `EBT_MAX_CONCURRENCY` is set but is not
    /// a positive integer.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::default();

        for capability in Capability::ALL {
            if let Some(name) = lookup(capability.override_key()) {
                let name = name.trim();
                if !name.is_empty() {
                    builder.overrides.insert(capability, name.to_string());
                }
            }
        }

        builder.disable_auth = lookup(ENV_DISABLE_AUTH)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        builder.disable_delete = lookup(ENV_DISABLE_DELETE)
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        if let Some(raw) = lookup(ENV_MAX_CONCURRENCY) {
            let raw = raw.trim();
            if !raw.is_empty() {
                let value = raw.parse::<usize>().map_err(|_| {
                    Error::Config(format!(
                        "{} must be a positive integer, got '{}'",
                        ENV_MAX_CONCURRENCY, raw
                    ))
                })?;
                builder.max_concurrency = Some(value);
            }
        }

        if let Some(dir) = lookup(ENV_LOG_DIR) {
            if !dir.trim().is_empty() {
                builder.log_dir = Some(PathBuf::from(dir.trim()));
            }
        }

        Ok(builder)
    }

    /// Pre-populate a builder from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Enables or disables simulation mode.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Sets the raw `--since` cutoff (`YYYY-MM-DD`).
    pub fn since(mut self, since: impl Into<String>) -> Self {
        self.since = Some(since.into());
        self
    }

    /// Sets the CSV rollup path.
    pub fn summary_csv<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.summary_csv = Some(path.into());
        self
    }

    /// Sets the artifact directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::SyncSettings;
    ///
    /// let settings = SyncSettings::builder().log_dir("/tmp/sync-logs").build().unwrap();
    /// assert_eq!(settings.log_dir.to_str(), Some("/tmp/sync-logs"));
    /// ```
    pub fn log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Forces a collaborator name for a capability.
    pub fn override_capability(mut self, capability: Capability, name: impl Into<String>) -> Self {
        self.overrides.insert(capability, name.into());
        self
    }

    pub fn disable_auth(mut self, disabled: bool) -> Self {
        self.disable_auth = disabled;
        self
    }

    pub fn disable_delete(mut self, disabled: bool) -> Self {
        self.disable_delete = disabled;
        self
    }

    /// Sets how many apply calls may run at once.
    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    /// Builds the final `SyncSettings` instance.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if validation fails.
    pub fn build(self) -> Result<SyncSettings> {
        let settings = SyncSettings {
            dry_run: self.dry_run,
            since: self.since.filter(|s| !s.trim().is_empty()),
            summary_csv: self.summary_csv,
            log_dir: self
                .log_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            overrides: self.overrides,
            disable_auth: self.disable_auth,
            disable_delete: self.disable_delete,
            max_concurrency: self.max_concurrency.unwrap_or(1),
        };

        settings.validate()?;

        Ok(settings)
    }
}
