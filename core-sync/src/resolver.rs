//! # Capability Resolver
//!
//! Binds each logical capability to one registered collaborator.
//!
//! ## Overview
//!
//! The integration layer registers typed implementations under names in a
//! [`CollaboratorRegistry`]. At run start [`CollaboratorRegistry::bind`] picks
//! one implementation per capability:
//!
//! 1. An override naming a registered collaborator of that capability wins.
//!    Overrides naming nothing registered are logged and ignored.
//! 2. Well-known names, matched case-insensitively, in priority order.
//! 3. Registered names containing a capability keyword and a verb, in
//!    registration order.
//! 4. The first registration for the capability.
//!
//! Local fetch, remote fetch and upsert are required. A missing required
//! capability fails the whole run before any I/O with
//! [`SyncError::MissingBindings`]. Delete is optional; when nothing is
//! registered for it the delete pass is disabled.

use crate::{Result, SyncError};
use bridge_traits::inventory::{Capability, Deleter, LocalFetcher, RemoteFetcher, Upserter};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown in the binding table when no deleter is bound
pub const NOT_AVAILABLE: &str = "(not available)";

const FETCH_VERBS: &[&str] = &["get", "load", "list", "read", "fetch", "iter", "all"];
const APPLY_VERBS: &[&str] = &["item", "listing"];

/// Name-matching rules for one capability
struct Heuristic {
    priority: &'static [&'static str],
    keys: &'static [&'static str],
    verbs: &'static [&'static str],
}

fn heuristic(capability: Capability) -> Heuristic {
    match capability {
        Capability::LocalFetch => Heuristic {
            priority: &["get_local_items", "load_local_items", "read_local_items"],
            keys: &["local", "csv_local", "db_local"],
            verbs: FETCH_VERBS,
        },
        Capability::RemoteFetch => Heuristic {
            priority: &["get_remote_items", "list_remote_items", "fetch_remote_items"],
            keys: &["remote", "ebay", "api"],
            verbs: FETCH_VERBS,
        },
        Capability::Upsert => Heuristic {
            priority: &[
                "upsert_remote_item",
                "upsert_item",
                "sync_remote_item",
                "create_or_update_item",
            ],
            keys: &["upsert", "create_or_update", "createupdate", "sync", "apply", "merge"],
            verbs: APPLY_VERBS,
        },
        Capability::Delete => Heuristic {
            priority: &["delete_remote_item", "remove_remote_item", "delete_item"],
            keys: &["delete", "remove", "purge"],
            verbs: APPLY_VERBS,
        },
    }
}

/// Pick an index into `names` for a capability
///
/// Returns `None` only when `names` is empty.
pub fn choose(capability: Capability, names: &[&str], override_name: Option<&str>) -> Option<usize> {
    if names.is_empty() {
        if let Some(name) = override_name {
            warn!(
                capability = %capability,
                name,
                "Override names no registered collaborator; ignoring"
            );
        }
        return None;
    }

    if let Some(name) = override_name {
        if let Some(pos) = names.iter().position(|n| *n == name) {
            debug!(capability = %capability, name, "Binding from override");
            return Some(pos);
        }
        warn!(
            capability = %capability,
            name,
            key = capability.override_key(),
            "Override names no registered collaborator; ignoring"
        );
    }

    let rules = heuristic(capability);
    let lowered: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();

    for wanted in rules.priority {
        if let Some(pos) = lowered.iter().position(|n| n == wanted) {
            return Some(pos);
        }
    }

    let keyword_hit = lowered.iter().position(|n| {
        rules.keys.iter().any(|k| n.contains(k)) && rules.verbs.iter().any(|v| n.contains(v))
    });
    if keyword_hit.is_some() {
        return keyword_hit;
    }

    debug!(
        capability = %capability,
        name = names[0],
        "No name matched; using first registration"
    );
    Some(0)
}

// ============================================================================
// Registry
// ============================================================================

/// A collaborator bound to a capability, with the name it was registered under
pub struct Bound<T: ?Sized> {
    pub name: String,
    pub collaborator: Arc<T>,
}

impl<T: ?Sized> Clone for Bound<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            collaborator: Arc::clone(&self.collaborator),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for Bound<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bound").field("name", &self.name).finish()
    }
}

/// Named, typed collaborator registrations
#[derive(Default)]
pub struct CollaboratorRegistry {
    local: Vec<Bound<dyn LocalFetcher>>,
    remote: Vec<Bound<dyn RemoteFetcher>>,
    upsert: Vec<Bound<dyn Upserter>>,
    delete: Vec<Bound<dyn Deleter>>,
}

impl CollaboratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_local(&mut self, name: impl Into<String>, fetcher: Arc<dyn LocalFetcher>) -> &mut Self {
        self.local.push(Bound {
            name: name.into(),
            collaborator: fetcher,
        });
        self
    }

    pub fn register_remote(&mut self, name: impl Into<String>, fetcher: Arc<dyn RemoteFetcher>) -> &mut Self {
        self.remote.push(Bound {
            name: name.into(),
            collaborator: fetcher,
        });
        self
    }

    pub fn register_upsert(&mut self, name: impl Into<String>, upserter: Arc<dyn Upserter>) -> &mut Self {
        self.upsert.push(Bound {
            name: name.into(),
            collaborator: upserter,
        });
        self
    }

    pub fn register_delete(&mut self, name: impl Into<String>, deleter: Arc<dyn Deleter>) -> &mut Self {
        self.delete.push(Bound {
            name: name.into(),
            collaborator: deleter,
        });
        self
    }

    /// Names registered for one capability, in registration order
    pub fn names(&self, capability: Capability) -> Vec<&str> {
        match capability {
            Capability::LocalFetch => self.local.iter().map(|b| b.name.as_str()).collect(),
            Capability::RemoteFetch => self.remote.iter().map(|b| b.name.as_str()).collect(),
            Capability::Upsert => self.upsert.iter().map(|b| b.name.as_str()).collect(),
            Capability::Delete => self.delete.iter().map(|b| b.name.as_str()).collect(),
        }
    }

    /// Every registered name, sorted and de-duplicated
    pub fn available_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Capability::ALL
            .iter()
            .flat_map(|c| self.names(*c))
            .map(str::to_string)
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Resolve the collaborator name for a capability
    pub fn resolve(&self, capability: Capability, override_name: Option<&str>) -> Option<String> {
        let names = self.names(capability);
        choose(capability, &names, override_name).map(|i| names[i].to_string())
    }

    /// Bind every capability for a run
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingBindings`] listing every required
    /// capability that could not be bound.
    pub fn bind(&self, overrides: &BTreeMap<Capability, String>) -> Result<Bindings> {
        let pick = |capability: Capability| -> Option<usize> {
            let names = self.names(capability);
            choose(
                capability,
                &names,
                overrides.get(&capability).map(String::as_str),
            )
        };

        let local = pick(Capability::LocalFetch).map(|i| self.local[i].clone());
        let remote = pick(Capability::RemoteFetch).map(|i| self.remote[i].clone());
        let upsert = pick(Capability::Upsert).map(|i| self.upsert[i].clone());
        let delete = pick(Capability::Delete).map(|i| self.delete[i].clone());

        match (local, remote, upsert) {
            (Some(local), Some(remote), Some(upsert)) => {
                let bindings = Bindings {
                    local,
                    remote,
                    upsert,
                    delete,
                };
                info!(bindings = %bindings.table(), "Capabilities bound");
                Ok(bindings)
            }
            _ => {
                let missing: Vec<Capability> = Capability::ALL
                    .into_iter()
                    .filter(|c| c.is_required() && self.names(*c).is_empty())
                    .collect();
                Err(SyncError::MissingBindings {
                    missing,
                    available: self.available_names(),
                })
            }
        }
    }
}

// ============================================================================
// Bindings
// ============================================================================

/// The collaborators chosen for a run
#[derive(Clone, Debug)]
pub struct Bindings {
    pub local: Bound<dyn LocalFetcher>,
    pub remote: Bound<dyn RemoteFetcher>,
    pub upsert: Bound<dyn Upserter>,
    pub delete: Option<Bound<dyn Deleter>>,
}

impl Bindings {
    pub fn table(&self) -> BindingTable {
        BindingTable::new(
            self.local.name.clone(),
            self.remote.name.clone(),
            self.upsert.name.clone(),
            self.delete.as_ref().map(|d| d.name.clone()),
        )
    }
}

/// Capability -> collaborator name, as stored in the run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BindingTable {
    pub local_fetch: String,
    pub remote_fetch: String,
    pub upsert: String,
    #[serde(
        serialize_with = "serialize_optional_binding",
        deserialize_with = "deserialize_optional_binding"
    )]
    pub delete: Option<String>,
}

impl BindingTable {
    pub fn new(
        local_fetch: impl Into<String>,
        remote_fetch: impl Into<String>,
        upsert: impl Into<String>,
        delete: Option<String>,
    ) -> Self {
        Self {
            local_fetch: local_fetch.into(),
            remote_fetch: remote_fetch.into(),
            upsert: upsert.into(),
            delete,
        }
    }
}

impl std::fmt::Display for BindingTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "local:{} | remote:{} | upsert:{} | delete:{}",
            self.local_fetch,
            self.remote_fetch,
            self.upsert,
            self.delete.as_deref().unwrap_or("N/A")
        )
    }
}

fn serialize_optional_binding<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or(NOT_AVAILABLE))
}

fn deserialize_optional_binding<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|name| name != NOT_AVAILABLE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::{ApplyResult, Item};

    struct Noop;

    #[async_trait]
    impl LocalFetcher for Noop {
        async fn fetch_local(&self) -> BridgeResult<Vec<Item>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl RemoteFetcher for Noop {
        async fn fetch_remote(&self) -> BridgeResult<Vec<Item>> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl Upserter for Noop {
        async fn upsert(&self, _local: &Item, _remote: Option<&Item>) -> BridgeResult<ApplyResult> {
            Ok(ApplyResult::Flag(true))
        }
    }

    #[async_trait]
    impl Deleter for Noop {
        async fn delete(&self, _remote: &Item) -> BridgeResult<ApplyResult> {
            Ok(ApplyResult::Flag(true))
        }
    }

    fn full_registry() -> CollaboratorRegistry {
        let noop = Arc::new(Noop);
        let mut registry = CollaboratorRegistry::new();
        registry
            .register_local("get_local_items", noop.clone())
            .register_remote("get_remote_items", noop.clone())
            .register_upsert("upsert_item", noop.clone())
            .register_delete("delete_item", noop);
        registry
    }

    #[test]
    fn test_priority_name_wins_over_registration_order() {
        let names = ["load_local_csv", "read_local_items", "get_local_items"];
        assert_eq!(choose(Capability::LocalFetch, &names, None), Some(2));
    }

    #[test]
    fn test_priority_match_is_case_insensitive() {
        let names = ["misc", "Upsert_Remote_Item"];
        assert_eq!(choose(Capability::Upsert, &names, None), Some(1));
    }

    #[test]
    fn test_keyword_and_verb_heuristic() {
        let names = ["push_everything", "ebay_list_active", "helpers"];
        assert_eq!(choose(Capability::RemoteFetch, &names, None), Some(1));

        let names = ["remove", "purge_stale_listing"];
        assert_eq!(choose(Capability::Delete, &names, None), Some(1));
    }

    #[test]
    fn test_falls_back_to_first_registration() {
        let names = ["push", "pull"];
        assert_eq!(choose(Capability::Upsert, &names, None), Some(0));
        assert_eq!(choose(Capability::Upsert, &[], None), None);
    }

    #[test]
    fn test_override_beats_heuristics() {
        let names = ["get_local_items", "my_custom_local"];
        assert_eq!(
            choose(Capability::LocalFetch, &names, Some("my_custom_local")),
            Some(1)
        );
    }

    #[test]
    fn test_override_without_heuristic_keywords() {
        let names = ["upsert_item", "zzz"];
        assert_eq!(choose(Capability::Upsert, &names, Some("zzz")), Some(1));
    }

    #[test]
    fn test_unknown_override_is_ignored() {
        let names = ["get_remote_items"];
        assert_eq!(
            choose(Capability::RemoteFetch, &names, Some("does_not_exist")),
            Some(0)
        );
    }

    #[test]
    fn test_bind_full_registry() {
        let bindings = full_registry().bind(&BTreeMap::new()).unwrap();
        let table = bindings.table();
        assert_eq!(table.local_fetch, "get_local_items");
        assert_eq!(table.remote_fetch, "get_remote_items");
        assert_eq!(table.upsert, "upsert_item");
        assert_eq!(table.delete.as_deref(), Some("delete_item"));
    }

    #[test]
    fn test_bind_with_override() {
        let noop = Arc::new(Noop);
        let mut registry = full_registry();
        registry.register_upsert("zzz", noop);

        let mut overrides = BTreeMap::new();
        overrides.insert(Capability::Upsert, "zzz".to_string());

        let bindings = registry.bind(&overrides).unwrap();
        assert_eq!(bindings.upsert.name, "zzz");
    }

    #[test]
    fn test_bind_without_delete() {
        let noop = Arc::new(Noop);
        let mut registry = CollaboratorRegistry::new();
        registry
            .register_local("get_local_items", noop.clone())
            .register_remote("get_remote_items", noop.clone())
            .register_upsert("upsert_item", noop);

        let bindings = registry.bind(&BTreeMap::new()).unwrap();
        assert!(bindings.delete.is_none());
        assert_eq!(bindings.table().to_string().rsplit(':').next(), Some("N/A"));
    }

    #[test]
    fn test_bind_reports_every_missing_capability() {
        let noop = Arc::new(Noop);
        let mut registry = CollaboratorRegistry::new();
        registry.register_local("get_local_items", noop);

        let err = registry.bind(&BTreeMap::new()).unwrap_err();
        match &err {
            SyncError::MissingBindings { missing, available } => {
                assert_eq!(missing, &vec![Capability::RemoteFetch, Capability::Upsert]);
                assert_eq!(available, &vec!["get_local_items".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let message = err.to_string();
        assert!(message.contains("EBT_GET_REMOTE_FN"));
        assert!(message.contains("EBT_UPSERT_FN"));
        assert!(message.contains("get_local_items"));
    }

    #[test]
    fn test_binding_table_serialization() {
        let table = BindingTable::new("a", "b", "c", None);
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["local-fetch"], "a");
        assert_eq!(value["delete"], NOT_AVAILABLE);

        let back: BindingTable = serde_json::from_value(value).unwrap();
        assert_eq!(back, table);
    }
}
