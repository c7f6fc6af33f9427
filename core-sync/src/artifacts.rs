//! # Artifact Writer
//!
//! Persists a sealed [`RunSummary`]:
//!
//! - `{log_dir}/sync-{YYYYmmdd-HHMMSS}.json` with the full summary
//! - one rollup line appended to `{log_dir}/sync.log`
//! - optionally a one-row CSV rollup at a caller-chosen path
//!
//! Two runs that end in the same second would share a JSON name; the second
//! one gets the short run id appended instead of overwriting the first.

use crate::summary::RunSummary;
use crate::{Result, SyncError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

pub const ROLLUP_LOG_FILE: &str = "sync.log";

pub const CSV_HEADER: &str = "started_at,ended_at,duration_sec,added,updated,skipped,deleted,errors";

const STAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Writes run artifacts under a log directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    log_dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Write the JSON summary and append the rollup line
    ///
    /// Returns the path of the JSON file.
    #[instrument(skip(self, summary), fields(run_id = %summary.run_id()))]
    pub async fn write_run(&self, summary: &RunSummary) -> Result<PathBuf> {
        fs::create_dir_all(&self.log_dir).await?;

        let stamp = stamp(summary);
        let mut json_path = self.log_dir.join(format!("sync-{}.json", stamp));
        if fs::try_exists(&json_path).await? {
            json_path = self
                .log_dir
                .join(format!("sync-{}-{}.json", stamp, summary.short_id()));
        }

        fs::write(&json_path, summary.to_json_pretty()?).await?;
        debug!(path = ?json_path, "Wrote run summary");

        let log_path = self.log_dir.join(ROLLUP_LOG_FILE);
        let mut log = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await?;
        log.write_all(format!("{}\n", rollup_line(summary)).as_bytes())
            .await?;
        log.flush().await?;

        info!(path = ?json_path, "Run artifacts written");
        Ok(json_path)
    }

    /// Write the one-row CSV rollup, creating parent directories
    #[instrument(skip(self, summary))]
    pub async fn write_csv(&self, summary: &RunSummary, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        fs::write(path, csv_rollup(summary))
            .await
            .map_err(|e| SyncError::Artifact(format!("{}: {}", path.display(), e)))?;
        debug!(path = ?path, "Wrote CSV rollup");
        Ok(())
    }
}

fn stamp(summary: &RunSummary) -> String {
    summary.ended_at().format(STAMP_FORMAT).to_string()
}

/// Seconds with millisecond precision, as written in every artifact
pub fn format_duration(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

/// The `sync.log` line for a run, without the trailing newline
pub fn rollup_line(summary: &RunSummary) -> String {
    let c = summary.counts();
    format!(
        "{} | added={} updated={} skipped={} deleted={} errors={} duration_sec={}",
        stamp(summary),
        c.added,
        c.updated,
        c.skipped,
        c.deleted,
        c.errors,
        format_duration(summary.duration_sec())
    )
}

/// Header plus one data row
pub fn csv_rollup(summary: &RunSummary) -> String {
    let c = summary.counts();
    format!(
        "{}\n{},{},{},{},{},{},{},{}\n",
        CSV_HEADER,
        summary.started_at().to_rfc3339(),
        summary.ended_at().to_rfc3339(),
        format_duration(summary.duration_sec()),
        c.added,
        c.updated,
        c.skipped,
        c.deleted,
        c.errors
    )
}
