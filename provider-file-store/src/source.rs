//! Read-only local listing source

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result};
use bridge_traits::inventory::LocalFetcher;
use bridge_traits::Item;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};

/// Read a JSON array of records, treating a missing file as empty
pub(crate) async fn read_collection(path: &Path) -> Result<Vec<Item>> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = ?path, "Collection file missing; treating as empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(BridgeError::Io(e)),
    };

    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let items = Item::parse_collection(&raw).map_err(|e| match e {
        BridgeError::Json(inner) => {
            BridgeError::InvalidRecords(format!("{}: {}", path.display(), inner))
        }
        other => other,
    })?;
    debug!(path = ?path, count = items.len(), "Read collection");
    Ok(items)
}

/// Local listings exported as a JSON file
#[derive(Debug, Clone)]
pub struct JsonLocalSource {
    path: PathBuf,
}

impl JsonLocalSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LocalFetcher for JsonLocalSource {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch_local(&self) -> Result<Vec<Item>> {
        read_collection(&self.path).await
    }
}
