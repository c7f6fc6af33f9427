//! # Reconciler
//!
//! Converges the remote listing set toward the local one and records what
//! happened to every item.
//!
//! ## Workflow
//!
//! 1. Auth gate (skipped in dry-run, when disabled, or when credentials are
//!    template values)
//! 2. Fetch local items and apply the `since` filter
//! 3. Fetch remote items (never in dry-run)
//! 4. Index remote, then local; identity-less local items are recorded as
//!    skipped
//! 5. Upsert pass in local index order
//! 6. Delete pass over remote keys missing locally
//!
//! Auth and fetch failures end the run early with a synthetic outcome
//! (`__auth__`, `__local__`, `__remote__`). Per-item failures, including
//! panics inside a collaborator, are recorded as `errors` and the run goes on.
//!
//! Apply calls may overlap up to `max_concurrency`, but results are consumed
//! through an order-preserving stream so the recorded order never changes.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{CollaboratorRegistry, Reconciler};
//!
//! let bindings = registry.bind(&settings.overrides)?;
//! let summary = Reconciler::new(bindings, settings.clone())
//!     .with_authenticator(authenticator, &credentials)
//!     .run()
//!     .await;
//! println!("errors: {}", summary.counts().errors);
//! ```

use crate::identity::IdentityIndex;
use crate::resolver::Bindings;
use crate::summary::{Action, RunRecorder, RunSummary};
use crate::temporal::{parse_cutoff, select_since};
use bridge_traits::inventory::{ApplyResult, Authenticator};
use bridge_traits::time::{Clock, SystemClock};
use bridge_traits::Item;
use core_auth::Credentials;
use core_runtime::config::SyncSettings;
use futures::{stream, FutureExt, StreamExt};
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Synthetic identity for an authentication failure
pub const AUTH_TAG: &str = "__auth__";
/// Synthetic identity for a local fetch failure
pub const LOCAL_TAG: &str = "__local__";
/// Synthetic identity for a remote fetch failure
pub const REMOTE_TAG: &str = "__remote__";
/// Identity recorded for local items without a key
pub const UNKNOWN_TAG: &str = "(unknown)";

pub const REASON_AUTH: &str = "auth";
pub const REASON_LOCAL_LOAD: &str = "local-load";
pub const REASON_REMOTE_LOAD: &str = "remote-load";
pub const REASON_NO_ID: &str = "no-id-key";
pub const REASON_DRY_RUN: &str = "dry-run";
pub const REASON_UPSERT: &str = "upsert";
pub const REASON_DELETE: &str = "reconcile-delete";

/// Runs one reconciliation over bound collaborators
pub struct Reconciler {
    bindings: Bindings,
    settings: SyncSettings,
    clock: Arc<dyn Clock>,
    authenticator: Option<Arc<dyn Authenticator>>,
    credentials_configured: bool,
}

impl Reconciler {
    pub fn new(bindings: Bindings, settings: SyncSettings) -> Self {
        Self {
            bindings,
            settings,
            clock: Arc::new(SystemClock),
            authenticator: None,
            credentials_configured: false,
        }
    }

    /// Use a specific clock for run timing
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Gate the run on authentication
    ///
    /// The authenticator is only called when `credentials` look configured.
    pub fn with_authenticator(
        mut self,
        authenticator: Arc<dyn Authenticator>,
        credentials: &Credentials,
    ) -> Self {
        self.authenticator = Some(authenticator);
        self.credentials_configured = credentials.is_configured();
        self
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Execute the run and seal its summary
    ///
    /// Never fails: run-level problems are recorded as outcomes.
    #[instrument(skip(self), fields(dry_run = self.settings.dry_run))]
    pub async fn run(&self) -> RunSummary {
        let dry_run = self.settings.dry_run;

        let cutoff = self.settings.since.as_deref().and_then(|raw| {
            let parsed = parse_cutoff(raw);
            if parsed.is_none() {
                warn!(
                    since = raw,
                    "Could not parse since date (expected YYYY-MM-DD); continuing without filter"
                );
            }
            parsed.map(|cutoff| (raw.to_string(), cutoff))
        });

        let mut recorder = RunRecorder::start(Arc::clone(&self.clock), self.bindings.table())
            .with_flags(dry_run, cutoff.as_ref().map(|(raw, _)| raw.clone()));

        // Phase 1: Auth gate
        if let Err(error) = self.authenticate().await {
            recorder.record(AUTH_TAG, Action::Errors, REASON_AUTH, error);
            return recorder.finish();
        }

        // Phase 2: Local items
        info!(collaborator = %self.bindings.local.name, "Phase 2: Fetching local items");
        let mut local = match guarded(self.bindings.local.collaborator.fetch_local()).await {
            Ok(items) => items,
            Err(error) => {
                warn!(error = %error, "Failed to load local items");
                recorder.record(LOCAL_TAG, Action::Errors, REASON_LOCAL_LOAD, error);
                return recorder.finish();
            }
        };

        if let Some((raw, cutoff)) = &cutoff {
            let before = local.len();
            local = select_since(local, *cutoff);
            info!(since = %raw, before, after = local.len(), "Filtered local items by date");
        }

        // Phase 3: Remote items
        let remote: Vec<Item> = if dry_run {
            debug!("Dry run; not fetching remote items");
            Vec::new()
        } else {
            info!(collaborator = %self.bindings.remote.name, "Phase 3: Fetching remote items");
            match guarded(self.bindings.remote.collaborator.fetch_remote()).await {
                Ok(items) => items,
                Err(error) => {
                    warn!(error = %error, "Failed to load remote items");
                    recorder.record(REMOTE_TAG, Action::Errors, REASON_REMOTE_LOAD, error);
                    return recorder.finish();
                }
            }
        };

        // Phase 4: Index
        let remote_index = IdentityIndex::build(&remote);
        let local_index = IdentityIndex::build(&local);
        info!(
            local = local_index.len(),
            remote = remote_index.len(),
            unidentified = local_index.unidentified(),
            "Phase 4: Indexed items"
        );
        for _ in 0..local_index.unidentified() {
            recorder.record(UNKNOWN_TAG, Action::Skipped, REASON_NO_ID, "");
        }

        // Phase 5: Upsert
        self.upsert_pass(&mut recorder, &local_index, &remote_index).await;

        // Phase 6: Delete
        self.delete_pass(&mut recorder, &local_index, &remote_index).await;

        let summary = recorder.finish();
        info!(
            added = summary.counts().added,
            updated = summary.counts().updated,
            skipped = summary.counts().skipped,
            deleted = summary.counts().deleted,
            errors = summary.counts().errors,
            duration_sec = summary.duration_sec(),
            "Reconciliation finished"
        );
        summary
    }

    async fn authenticate(&self) -> std::result::Result<(), String> {
        if self.settings.dry_run || self.settings.disable_auth {
            debug!("Auth not required for this run");
            return Ok(());
        }
        let Some(authenticator) = &self.authenticator else {
            return Ok(());
        };
        if !self.credentials_configured {
            info!("Auth skipped (offline mode; credentials not configured)");
            return Ok(());
        }

        info!("Phase 1: Authenticating");
        guarded(authenticator.authenticate())
            .await
            .map(|_token| ())
            .map_err(|error| {
                warn!(error = %error, "Auth failure");
                error
            })
    }

    async fn upsert_pass(
        &self,
        recorder: &mut RunRecorder,
        local_index: &IdentityIndex,
        remote_index: &IdentityIndex,
    ) {
        if self.settings.dry_run {
            info!(items = local_index.len(), "Phase 5: Simulating upserts");
            for id in local_index.keys() {
                recorder.record(id, Action::Skipped, REASON_DRY_RUN, "");
            }
            return;
        }

        info!(
            items = local_index.len(),
            collaborator = %self.bindings.upsert.name,
            "Phase 5: Applying upserts"
        );
        let upserter = &self.bindings.upsert;

        let results: Vec<_> = stream::iter(local_index.iter())
            .map(|(id, local)| {
                let remote = remote_index.get(id);
                let collaborator = Arc::clone(&upserter.collaborator);
                async move {
                    let result = guarded(collaborator.upsert(local, remote)).await;
                    (id, remote.is_some(), result)
                }
            })
            .buffered(self.concurrency())
            .collect()
            .await;

        for (id, has_remote, result) in results {
            match result {
                Ok(applied) => {
                    let action = normalize_upsert(&applied, has_remote);
                    debug!(id, action = %action, "Upserted");
                    recorder.record(id, action, REASON_UPSERT, "");
                }
                Err(error) => {
                    warn!(id, error = %error, "Upsert failed");
                    recorder.record(id, Action::Errors, upserter.name.as_str(), error);
                }
            }
        }
    }

    async fn delete_pass(
        &self,
        recorder: &mut RunRecorder,
        local_index: &IdentityIndex,
        remote_index: &IdentityIndex,
    ) {
        if self.settings.dry_run {
            return;
        }
        if self.settings.disable_delete {
            info!("Delete pass disabled");
            return;
        }
        let Some(deleter) = &self.bindings.delete else {
            debug!("No delete collaborator bound");
            return;
        };

        let orphans: Vec<(&str, &Item)> = remote_index
            .iter()
            .filter(|(id, _)| !local_index.contains_key(id))
            .collect();
        info!(
            items = orphans.len(),
            collaborator = %deleter.name,
            "Phase 6: Deleting remote items missing locally"
        );

        let results: Vec<_> = stream::iter(orphans)
            .map(|(id, remote)| {
                let collaborator = Arc::clone(&deleter.collaborator);
                async move { (id, guarded(collaborator.delete(remote)).await) }
            })
            .buffered(self.concurrency())
            .collect()
            .await;

        for (id, result) in results {
            match result {
                Ok(applied) => {
                    let action = normalize_delete(&applied);
                    debug!(id, action = %action, "Delete applied");
                    recorder.record(id, action, REASON_DELETE, "");
                }
                Err(error) => {
                    warn!(id, error = %error, "Delete failed");
                    recorder.record(id, Action::Errors, deleter.name.as_str(), error);
                }
            }
        }
    }

    fn concurrency(&self) -> usize {
        self.settings.max_concurrency.max(1)
    }
}

/// Map an upsert answer onto an outcome bucket
pub fn normalize_upsert(result: &ApplyResult, has_remote: bool) -> Action {
    match result {
        ApplyResult::Flag(true) if has_remote => Action::Updated,
        ApplyResult::Flag(true) => Action::Added,
        ApplyResult::Flag(false) => Action::Skipped,
        ApplyResult::Label(label) => Action::from_label(label).unwrap_or(Action::Skipped),
    }
}

/// Map a delete answer onto an outcome bucket
pub fn normalize_delete(result: &ApplyResult) -> Action {
    if result.is_true() || result.as_label() == Some("deleted") {
        Action::Deleted
    } else {
        Action::Skipped
    }
}

/// Await a collaborator call, turning errors and panics into failure text
async fn guarded<T, F>(call: F) -> std::result::Result<T, String>
where
    F: Future<Output = bridge_traits::error::Result<T>>,
{
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(e.to_string()),
        Err(panic) => Err(panic_message(panic)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
