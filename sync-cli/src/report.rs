//! Console report

use core_runtime::config::SyncSettings;
use core_sync::artifacts::format_duration;
use core_sync::{BindingTable, RunSummary, SyncError};
use std::path::Path;

fn banner(text: &str) {
    let rule = "=".repeat(60);
    println!("\n{}", rule);
    println!("{}", text);
    println!("{}", rule);
}

pub fn print_header(bindings: &BindingTable, settings: &SyncSettings) {
    banner("Listing Sync - Running");
    println!(
        "Adapters - local:{} | remote:{} | upsert:{} | delete:{}",
        bindings.local_fetch,
        bindings.remote_fetch,
        bindings.upsert,
        bindings.delete.as_deref().unwrap_or("N/A")
    );
    if settings.dry_run {
        println!("Mode     - DRY RUN (no auth, no writes, no deletes)");
    }
    if let Some(since) = &settings.since {
        println!("Filter   - since {} (local items only)", since);
    }
}

pub fn print_counts(summary: &RunSummary) {
    let c = summary.counts();
    println!("Added   : {}", c.added);
    println!("Updated : {}", c.updated);
    println!("Skipped : {}", c.skipped);
    println!("Deleted : {}", c.deleted);
    println!("Errors  : {}", c.errors);
    println!("Duration: {}s", format_duration(summary.duration_sec()));
}

pub fn print_footer(summary: &RunSummary, json_path: &Path) {
    if summary.has_errors() {
        banner("Sync completed WITH ERRORS");
    } else {
        banner("Sync completed successfully");
    }
    println!("Details JSON: {}", json_path.display());
}

pub fn print_binding_help(err: &SyncError) {
    banner("Missing required listing bindings");
    println!("{}", err);
    println!("\nSet the override variables to registered collaborator names, then re-run:");
    println!("  EBT_GET_LOCAL_FN=<name>");
    println!("  EBT_GET_REMOTE_FN=<name>");
    println!("  EBT_UPSERT_FN=<name>");
    println!("  # optional:");
    println!("  # EBT_DELETE_FN=<name>");
    println!("  # EBT_DISABLE_DELETE=1");
    println!(
        "\nThe file store registers collaborators when {} and {} point at JSON files.",
        crate::wiring::ENV_LOCAL_JSON,
        crate::wiring::ENV_REMOTE_JSON
    );
}
