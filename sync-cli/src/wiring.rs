//! Collaborator registration for the JSON file store

use core_runtime::logging::strip_path;
use core_sync::CollaboratorRegistry;
use provider_file_store::{JsonFileStore, JsonLocalSource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Path of the local listing export
pub const ENV_LOCAL_JSON: &str = "EBT_LOCAL_JSON";
/// Path of the remote mirror file
pub const ENV_REMOTE_JSON: &str = "EBT_REMOTE_JSON";

fn path_from_env(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Register whatever collaborators the environment configures
///
/// Missing paths leave their capabilities unregistered; binding reports them.
pub fn registry_from_env() -> CollaboratorRegistry {
    let mut registry = CollaboratorRegistry::new();

    if let Some(path) = path_from_env(ENV_LOCAL_JSON) {
        debug!(file = strip_path(&path.to_string_lossy()), "Registering local JSON source");
        registry.register_local("get_local_items", Arc::new(JsonLocalSource::new(path)));
    }

    if let Some(path) = path_from_env(ENV_REMOTE_JSON) {
        debug!(file = strip_path(&path.to_string_lossy()), "Registering remote JSON store");
        let store = Arc::new(JsonFileStore::new(path));
        registry
            .register_remote("get_remote_items", store.clone())
            .register_upsert("upsert_remote_item", store.clone())
            .register_delete("delete_remote_item", store);
    }

    registry
}
