//! Remote mirror kept as a JSON file
//!
//! Every mutation reads the whole file, edits it and writes it back while
//! holding an async lock, so concurrent apply calls never lose each other's
//! writes within one process.

use crate::source::read_collection;
use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::inventory::{ApplyResult, Deleter, RemoteFetcher, Upserter};
use bridge_traits::Item;
use core_sync::identity;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_collection(&self, items: &[Item]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(items)?;
        fs::write(&self.path, json).await?;
        debug!(path = ?self.path, count = items.len(), "Wrote collection");
        Ok(())
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("path", &self.path)
            .finish()
    }
}

fn require_identity(item: &Item) -> Result<String> {
    identity(item).ok_or_else(|| {
        BridgeError::InvalidRecords("record has no id, sku, itemId or item_id".to_string())
    })
}

#[async_trait]
impl RemoteFetcher for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch_remote(&self) -> Result<Vec<Item>> {
        read_collection(&self.path).await
    }
}

#[async_trait]
impl Upserter for JsonFileStore {
    async fn upsert(&self, local: &Item, _remote: Option<&Item>) -> Result<ApplyResult> {
        let key = require_identity(local)?;
        let _guard = self.write_lock.lock().await;

        let mut items = read_collection(&self.path).await?;
        let position = items
            .iter()
            .position(|item| identity(item).as_deref() == Some(key.as_str()));

        match position {
            Some(i) if items[i] == *local => {
                debug!(id = %key, "Stored record already current");
                return Ok(ApplyResult::label("skipped"));
            }
            Some(i) => items[i] = local.clone(),
            None => items.push(local.clone()),
        }

        self.write_collection(&items).await?;
        debug!(id = %key, "Upserted record");
        Ok(ApplyResult::Flag(true))
    }
}

#[async_trait]
impl Deleter for JsonFileStore {
    async fn delete(&self, remote: &Item) -> Result<ApplyResult> {
        let key = require_identity(remote)?;
        let _guard = self.write_lock.lock().await;

        let mut items = read_collection(&self.path).await?;
        let before = items.len();
        items.retain(|item| identity(item).as_deref() != Some(key.as_str()));

        if items.len() == before {
            debug!(id = %key, "Nothing to delete");
            return Ok(ApplyResult::Flag(false));
        }

        self.write_collection(&items).await?;
        debug!(id = %key, "Deleted record");
        Ok(ApplyResult::Flag(true))
    }
}
