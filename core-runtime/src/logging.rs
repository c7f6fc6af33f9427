//! # Logging & Tracing Infrastructure
//!
//! Provides structured logging with the `tracing` crate, supporting:
//! - Pretty, JSON and compact output formats
//! - Verbosity-driven level selection (`-v` / `-vv`)
//! - An append-only debug log file inside the run's log directory
//! - Redaction helpers for token-like values
//!
//! ## Overview
//!
//! This module configures the `tracing-subscriber` infrastructure. When a log
//! directory is configured every event is appended to `{log_dir}/debug.log`
//! without ANSI colors; otherwise events go to stderr so that stdout stays
//! reserved for the run report.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_traits::time::LogLevel;
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::from_verbosity(2))
//!     .with_log_dir("logs");
//!
//! init_logging(config)?;
//! tracing::info!("Sync started");
//! ```

use crate::error::{Error, Result};

use bridge_traits::time::LogLevel;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use tracing_subscriber::{
    filter::EnvFilter, fmt::writer::BoxMakeWriter, layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// File name of the debug log inside the log directory
pub const DEBUG_LOG_FILE: &str = "debug.log";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format
    Pretty,
    /// Structured JSON format for machine parsing
    Json,
    /// Single-line format, the default for file output
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        Self::Compact
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            other => Err(Error::Config(format!(
                "Unknown log format '{}'. Expected pretty, json or compact.",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Minimum log level
    pub level: LogLevel,
    /// Custom filter string (e.g., "core_sync=trace,core_auth=debug")
    pub filter: Option<String>,
    /// Directory receiving `debug.log`; `None` logs to stderr
    pub log_dir: Option<PathBuf>,
    /// Display target module in logs
    pub display_target: bool,
    /// Display thread info
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Warn,
            filter: None,
            log_dir: None,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    /// Set log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Set minimum log level
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set level from a repeated `-v` count
    pub fn with_verbosity(self, count: u8) -> Self {
        self.with_level(LogLevel::from_verbosity(count))
    }

    /// Set custom filter string
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Write events to `{dir}/debug.log` instead of stderr
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Enable or disable target display
    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    /// Enable or disable thread info
    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }

    /// Path of the debug log file, if file output is configured
    pub fn debug_log_path(&self) -> Option<PathBuf> {
        self.log_dir.as_ref().map(|dir| dir.join(DEBUG_LOG_FILE))
    }
}

/// Initialize the logging system
///
/// This should be called once during application startup. Subsequent calls
/// will return an error.
///
/// # Errors
///
/// Returns an error if:
/// - Logging is already initialized
/// - The filter string is invalid
/// - The debug log file cannot be opened
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let (writer, ansi) = build_writer(&config)?;

    let base = tracing_subscriber::fmt::layer()
        .with_ansi(ansi)
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_writer(writer);

    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry.with(base.pretty()).try_init(),
        LogFormat::Json => registry
            .with(base.json().flatten_event(true).with_current_span(true))
            .try_init(),
        LogFormat::Compact => registry.with(base.compact()).try_init(),
    };

    result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let base_level = config.level.as_directive();

    let filter_string = if let Some(custom_filter) = &config.filter {
        custom_filter.clone()
    } else {
        // Our crates at the requested level, everything else at warn
        format!(
            "warn,core_runtime={},core_auth={},core_sync={},provider_file_store={},listing_sync={}",
            base_level, base_level, base_level, base_level, base_level
        )
    };

    EnvFilter::try_new(filter_string)
        .map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn build_writer(config: &LoggingConfig) -> Result<(BoxMakeWriter, bool)> {
    match config.log_dir.as_deref() {
        Some(dir) => {
            let file = open_debug_log(dir)?;
            Ok((BoxMakeWriter::new(Mutex::new(file)), false))
        }
        None => Ok((BoxMakeWriter::new(std::io::stderr), true)),
    }
}

fn open_debug_log(dir: &Path) -> Result<fs::File> {
    fs::create_dir_all(dir).map_err(|e| {
        Error::Internal(format!(
            "Failed to create log directory {}: {}",
            dir.display(),
            e
        ))
    })?;

    let path = dir.join(DEBUG_LOG_FILE);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| Error::Internal(format!("Failed to open {}: {}", path.display(), e)))
}

/// Helper function to redact sensitive field values
///
/// ```ignore
/// use tracing::info;
/// use core_runtime::logging::redact_if_sensitive;
///
/// info!(token = %redact_if_sensitive("access_token", &token), "Token acquired");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    const SENSITIVE_FIELDS: &[&str] = &[
        "token",
        "access_token",
        "refresh_token",
        "password",
        "secret",
        "client_id",
        "api_key",
        "authorization",
        "bearer",
    ];

    let field_lower = field_name.to_lowercase();
    if SENSITIVE_FIELDS.iter().any(|&f| field_lower.contains(f)) {
        "[REDACTED]".to_string()
    } else if value.contains('@') && value.contains('.') {
        // Likely an email - keep first char only
        if let Some(at_pos) = value.find('@') {
            format!("{}***@[REDACTED]", &value[..1.min(at_pos)])
        } else {
            value.to_string()
        }
    } else {
        value.to_string()
    }
}

/// Strip full file paths to basename only
///
/// ```ignore
/// use core_runtime::logging::strip_path;
///
/// assert_eq!(strip_path("/home/seller/listings.json"), "listings.json");
/// ```
pub fn strip_path(path: &str) -> &str {
    path.rsplit('/')
        .next()
        .unwrap_or(path)
        .rsplit('\\')
        .next()
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level(LogLevel::Debug)
            .with_filter("core_sync=trace")
            .with_log_dir("logs")
            .with_target(false)
            .with_thread_info(true);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.filter, Some("core_sync=trace".to_string()));
        assert_eq!(config.debug_log_path(), Some(PathBuf::from("logs/debug.log")));
        assert!(!config.display_target);
        assert!(config.display_thread_info);
    }

    #[test]
    fn test_default_config_logs_warnings_to_stderr() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, LogLevel::Warn);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.debug_log_path().is_none());
    }

    #[test]
    fn test_with_verbosity() {
        assert_eq!(LoggingConfig::default().with_verbosity(0).level, LogLevel::Warn);
        assert_eq!(LoggingConfig::default().with_verbosity(1).level, LogLevel::Info);
        assert_eq!(LoggingConfig::default().with_verbosity(3).level, LogLevel::Debug);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert_eq!(
            redact_if_sensitive("access_token", "secret123"),
            "[REDACTED]"
        );
        assert_eq!(redact_if_sensitive("EBAY_CLIENT_ID", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("password", "pass"), "[REDACTED]");

        let redacted = redact_if_sensitive("email", "seller@example.com");
        assert!(redacted.starts_with('s'));
        assert!(redacted.contains("[REDACTED]"));

        assert_eq!(redact_if_sensitive("sku", "SKU-1"), "SKU-1");
    }

    #[test]
    fn test_strip_path() {
        assert_eq!(strip_path("/home/user/data/local.json"), "local.json");
        assert_eq!(strip_path("C:\\Users\\Seller\\local.json"), "local.json");
        assert_eq!(strip_path("local.json"), "local.json");
        assert_eq!(strip_path("/var/log/"), "");
    }

    #[test]
    fn test_build_filter() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_sync=debug"));
    }

    #[test]
    fn test_build_custom_filter() {
        let config = LoggingConfig::default().with_filter("core_auth=trace,core_sync=debug");
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("core_auth=trace"));
    }

    #[test]
    fn test_open_debug_log_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");

        open_debug_log(&nested).unwrap();
        assert!(nested.join(DEBUG_LOG_FILE).exists());
    }
}
