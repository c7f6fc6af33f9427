//! Inventory Collaborator Contracts
//!
//! The reconciliation engine depends on four logical capabilities that it does
//! not implement itself. The integration layer implements these traits and
//! registers named instances; the engine binds one instance per capability at
//! run start.
//!
//! | Capability     | Trait            | Required |
//! |----------------|------------------|----------|
//! | `local-fetch`  | [`LocalFetcher`] | yes      |
//! | `remote-fetch` | [`RemoteFetcher`]| yes      |
//! | `upsert`       | [`Upserter`]     | yes      |
//! | `delete`       | [`Deleter`]      | no       |
//!
//! Token acquisition is exposed separately through [`Authenticator`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};
use crate::record::Item;

/// A logical operation the engine binds to an implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    LocalFetch,
    RemoteFetch,
    Upsert,
    Delete,
}

impl Capability {
    /// All capabilities in resolution order
    pub const ALL: [Capability; 4] = [
        Capability::LocalFetch,
        Capability::RemoteFetch,
        Capability::Upsert,
        Capability::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::LocalFetch => "local-fetch",
            Capability::RemoteFetch => "remote-fetch",
            Capability::Upsert => "upsert",
            Capability::Delete => "delete",
        }
    }

    /// Environment key that forces a binding for this capability
    pub fn override_key(&self) -> &'static str {
        match self {
            Capability::LocalFetch => "EBT_GET_LOCAL_FN",
            Capability::RemoteFetch => "EBT_GET_REMOTE_FN",
            Capability::Upsert => "EBT_UPSERT_FN",
            Capability::Delete => "EBT_DELETE_FN",
        }
    }

    /// Whether a run can proceed without this capability
    pub fn is_required(&self) -> bool {
        !matches!(self, Capability::Delete)
    }
}

impl FromStr for Capability {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "local-fetch" | "local" => Ok(Capability::LocalFetch),
            "remote-fetch" | "remote" => Ok(Capability::RemoteFetch),
            "upsert" => Ok(Capability::Upsert),
            "delete" => Ok(Capability::Delete),
            _ => Err(BridgeError::NotAvailable(format!("unknown capability '{}'", s))),
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value returned by an apply collaborator
///
/// Integrations answer either with a success flag or with a label drawn from
/// the outcome vocabulary (`added`, `updated`, `skipped`, `deleted`,
/// `errors`). The engine normalizes both forms; unrecognized labels count as
/// skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplyResult {
    Flag(bool),
    Label(String),
}

impl ApplyResult {
    pub fn label(label: impl Into<String>) -> Self {
        ApplyResult::Label(label.into())
    }

    pub fn is_true(&self) -> bool {
        matches!(self, ApplyResult::Flag(true))
    }

    pub fn as_label(&self) -> Option<&str> {
        match self {
            ApplyResult::Label(s) => Some(s.as_str()),
            ApplyResult::Flag(_) => None,
        }
    }
}

impl From<bool> for ApplyResult {
    fn from(value: bool) -> Self {
        ApplyResult::Flag(value)
    }
}

impl From<&str> for ApplyResult {
    fn from(value: &str) -> Self {
        ApplyResult::Label(value.to_string())
    }
}

/// Bearer token handed out by an [`Authenticator`]
///
/// The `Debug` implementation never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BearerToken").field(&"[REDACTED]").finish()
    }
}

/// Source of the local listing collection
#[async_trait]
pub trait LocalFetcher: Send + Sync {
    /// Fetch every local listing record
    async fn fetch_local(&self) -> Result<Vec<Item>>;
}

/// Source of the remote listing collection
///
/// Never invoked during a simulation run.
#[async_trait]
pub trait RemoteFetcher: Send + Sync {
    async fn fetch_remote(&self) -> Result<Vec<Item>>;
}

/// Creates or updates a remote listing from its local counterpart
#[async_trait]
pub trait Upserter: Send + Sync {
    /// Apply a local record
    ///
    /// # Arguments
    ///
    /// * `local` - The local record to push
    /// * `remote` - The remote record with the same identity, if one exists.
    ///   Implementations that do not need it may ignore it.
    async fn upsert(&self, local: &Item, remote: Option<&Item>) -> Result<ApplyResult>;
}

/// Removes a remote listing that no longer exists locally
#[async_trait]
pub trait Deleter: Send + Sync {
    async fn delete(&self, remote: &Item) -> Result<ApplyResult>;
}

/// Acquires an access token for the remote side
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self) -> Result<BearerToken>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_override_keys() {
        assert_eq!(Capability::LocalFetch.override_key(), "EBT_GET_LOCAL_FN");
        assert_eq!(Capability::RemoteFetch.override_key(), "EBT_GET_REMOTE_FN");
        assert_eq!(Capability::Upsert.override_key(), "EBT_UPSERT_FN");
        assert_eq!(Capability::Delete.override_key(), "EBT_DELETE_FN");
    }

    #[test]
    fn test_capability_required() {
        assert!(Capability::LocalFetch.is_required());
        assert!(Capability::RemoteFetch.is_required());
        assert!(Capability::Upsert.is_required());
        assert!(!Capability::Delete.is_required());
    }

    #[test]
    fn test_capability_from_str() {
        assert_eq!("local-fetch".parse::<Capability>().unwrap(), Capability::LocalFetch);
        assert_eq!("REMOTE_FETCH".parse::<Capability>().unwrap(), Capability::RemoteFetch);
        assert_eq!("upsert".parse::<Capability>().unwrap(), Capability::Upsert);
        assert!("merge".parse::<Capability>().is_err());
    }

    #[test]
    fn test_capability_serialization() {
        let json = serde_json::to_string(&Capability::RemoteFetch).unwrap();
        assert_eq!(json, "\"remote-fetch\"");
    }

    #[test]
    fn test_apply_result_from_json() {
        let flag: ApplyResult = serde_json::from_str("true").unwrap();
        assert!(flag.is_true());

        let label: ApplyResult = serde_json::from_str("\"updated\"").unwrap();
        assert_eq!(label.as_label(), Some("updated"));
    }

    mockall::mock! {
        Store {}

        #[async_trait]
        impl LocalFetcher for Store {
            async fn fetch_local(&self) -> Result<Vec<Item>>;
        }

        #[async_trait]
        impl Deleter for Store {
            async fn delete(&self, remote: &Item) -> Result<ApplyResult>;
        }
    }

    #[tokio::test]
    async fn test_collaborators_usable_as_trait_objects() {
        let mut store = MockStore::new();
        store
            .expect_fetch_local()
            .times(1)
            .returning(|| Ok(vec![Item::new().with_field("id", 1i64)]));
        store
            .expect_delete()
            .withf(|item| item.get("id").and_then(|v| v.as_number()) == Some(1.0))
            .returning(|_| Ok(ApplyResult::from("deleted")));

        let store = std::sync::Arc::new(store);
        let fetcher: std::sync::Arc<dyn LocalFetcher> = store.clone();
        let deleter: std::sync::Arc<dyn Deleter> = store;

        let items = fetcher.fetch_local().await.unwrap();
        let result = deleter.delete(&items[0]).await.unwrap();
        assert_eq!(result.as_label(), Some("deleted"));
    }

    #[test]
    fn test_bearer_token_debug_redacts() {
        let token = BearerToken::new("v^1.1#secret");
        let debug = format!("{:?}", token);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(token.secret(), "v^1.1#secret");
    }
}
