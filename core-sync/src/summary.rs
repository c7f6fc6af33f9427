//! # Run Summary
//!
//! Accumulates the outcome of every item touched by a reconciliation run.
//!
//! ## Overview
//!
//! A [`RunRecorder`] is opened when a run starts and is the only thing that
//! may append outcomes. Calling [`RunRecorder::finish`] consumes it and
//! produces the sealed [`RunSummary`], which is what gets written to disk.
//!
//! ```text
//! RunRecorder::start ──record()*──▶ finish() ──▶ RunSummary (immutable)
//! ```
//!
//! Every outcome lands in exactly one of five buckets, so the sum of the
//! counters always equals the number of recorded outcomes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::summary::{Action, RunRecorder};
//!
//! let mut recorder = RunRecorder::start(clock, bindings.table());
//! recorder.record("SKU-1", Action::Added, "upsert", "");
//! recorder.record_label("SKU-2", "bogus", "upsert", ""); // counted as skipped
//! let summary = recorder.finish();
//! assert_eq!(summary.counts().total(), 2);
//! ```

use crate::resolver::BindingTable;
use crate::{Result, SyncError};
use bridge_traits::time::Clock;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Outcome Types
// ============================================================================

/// The bucket an outcome is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Added,
    Updated,
    Skipped,
    Deleted,
    Errors,
}

impl Action {
    pub const ALL: [Action; 5] = [
        Action::Added,
        Action::Updated,
        Action::Skipped,
        Action::Deleted,
        Action::Errors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Added => "added",
            Action::Updated => "updated",
            Action::Skipped => "skipped",
            Action::Deleted => "deleted",
            Action::Errors => "errors",
        }
    }

    /// Match a bucket name exactly, as collaborators report them
    pub fn from_label(label: &str) -> Option<Self> {
        Action::ALL.into_iter().find(|a| a.as_str() == label)
    }
}

impl FromStr for Action {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        Action::from_label(s).ok_or_else(|| SyncError::UnknownAction(s.to_string()))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One recorded outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Identity key, or a synthetic tag such as `__local__` or `(unknown)`
    pub id: String,
    pub action: Action,
    /// Why the outcome happened: `upsert`, `dry-run`, `no-id-key`, the
    /// failing collaborator's name, ...
    pub reason: String,
    /// Failure text; empty unless the action is `errors`
    pub error: String,
}

/// Per-bucket counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub added: u64,
    pub updated: u64,
    pub skipped: u64,
    pub deleted: u64,
    pub errors: u64,
}

impl OutcomeCounts {
    pub fn get(&self, action: Action) -> u64 {
        match action {
            Action::Added => self.added,
            Action::Updated => self.updated,
            Action::Skipped => self.skipped,
            Action::Deleted => self.deleted,
            Action::Errors => self.errors,
        }
    }

    fn increment(&mut self, action: Action) {
        let slot = match action {
            Action::Added => &mut self.added,
            Action::Updated => &mut self.updated,
            Action::Skipped => &mut self.skipped,
            Action::Deleted => &mut self.deleted,
            Action::Errors => &mut self.errors,
        };
        *slot += 1;
    }

    /// Sum of all five buckets
    pub fn total(&self) -> u64 {
        self.added + self.updated + self.skipped + self.deleted + self.errors
    }
}

// ============================================================================
// Recorder
// ============================================================================

/// Open, append-only accumulator for a running reconciliation
pub struct RunRecorder {
    run_id: Uuid,
    clock: Arc<dyn Clock>,
    started_at: DateTime<Utc>,
    counts: OutcomeCounts,
    items: Vec<Outcome>,
    bindings: BindingTable,
    dry_run: bool,
    since: Option<String>,
}

impl RunRecorder {
    /// Open a recorder; the start time is read from `clock` now
    pub fn start(clock: Arc<dyn Clock>, bindings: BindingTable) -> Self {
        let started_at = clock.now();
        Self {
            run_id: Uuid::new_v4(),
            clock,
            started_at,
            counts: OutcomeCounts::default(),
            items: Vec::new(),
            bindings,
            dry_run: false,
            since: None,
        }
    }

    /// Record the run flags that shaped this run
    pub fn with_flags(mut self, dry_run: bool, since: Option<String>) -> Self {
        self.dry_run = dry_run;
        self.since = since;
        self
    }

    /// Append an outcome and bump exactly one counter
    pub fn record(
        &mut self,
        id: impl Into<String>,
        action: Action,
        reason: impl Into<String>,
        error: impl Into<String>,
    ) {
        self.counts.increment(action);
        self.items.push(Outcome {
            id: id.into(),
            action,
            reason: reason.into(),
            error: error.into(),
        });
    }

    /// Append an outcome from a free-form action name
    ///
    /// Names outside the five buckets are counted as `skipped`.
    pub fn record_label(
        &mut self,
        id: impl Into<String>,
        label: &str,
        reason: impl Into<String>,
        error: impl Into<String>,
    ) {
        let action = Action::from_label(label).unwrap_or(Action::Skipped);
        self.record(id, action, reason, error);
    }

    pub fn counts(&self) -> &OutcomeCounts {
        &self.counts
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Seal the run
    pub fn finish(self) -> RunSummary {
        let ended_at = self.clock.now().max(self.started_at);
        let millis = (ended_at - self.started_at).num_milliseconds();

        RunSummary {
            run_id: self.run_id,
            started_at: self.started_at,
            ended_at,
            duration_sec: millis as f64 / 1000.0,
            counts: self.counts,
            items: self.items,
            bindings: self.bindings,
            dry_run: self.dry_run,
            since: self.since,
        }
    }
}

// ============================================================================
// Sealed Summary
// ============================================================================

/// Immutable record of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    ended_at: DateTime<Utc>,
    /// Wall time in seconds, millisecond precision
    duration_sec: f64,
    counts: OutcomeCounts,
    items: Vec<Outcome>,
    bindings: BindingTable,
    dry_run: bool,
    since: Option<String>,
}

impl RunSummary {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// First eight hex digits of the run id
    pub fn short_id(&self) -> String {
        self.run_id.simple().to_string()[..8].to_string()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn ended_at(&self) -> DateTime<Utc> {
        self.ended_at
    }

    pub fn duration_sec(&self) -> f64 {
        self.duration_sec
    }

    pub fn counts(&self) -> &OutcomeCounts {
        &self.counts
    }

    pub fn items(&self) -> &[Outcome] {
        &self.items
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn since(&self) -> Option<&str> {
        self.since.as_deref()
    }

    pub fn has_errors(&self) -> bool {
        self.counts.errors > 0
    }

    /// Outcomes recorded for one identity, in order
    pub fn outcomes_for<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Outcome> + 'a {
        self.items.iter().filter(move |o| o.id == id)
    }

    /// Pretty-printed JSON form
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
