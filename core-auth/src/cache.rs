//! # Credential Cache
//!
//! Holds at most one access token for the lifetime of the object that owns it.
//! The cache is constructed explicitly and handed to the authenticator, so two
//! engines in one process never share a token by accident.

use crate::types::AccessToken;
use bridge_traits::time::Clock;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Seconds before expiry at which a cached token stops being served
pub const EXPIRY_BUFFER_SECS: i64 = 60;

pub struct CredentialCache {
    slot: Mutex<Option<AccessToken>>,
    clock: Arc<dyn Clock>,
}

impl CredentialCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(None),
            clock,
        }
    }

    /// Return the cached token while it is still valid
    ///
    /// A token that has entered the expiry buffer is dropped from the cache.
    pub fn get(&self) -> Option<AccessToken> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        let now = self.clock.now();

        match slot.as_ref() {
            Some(token) if token.is_valid_at(now, EXPIRY_BUFFER_SECS) => Some(token.clone()),
            Some(token) => {
                debug!(expires_at = %token.expires_at(), "Cached token expired");
                *slot = None;
                None
            }
            None => None,
        }
    }

    /// Replace the cached token
    pub fn store(&self, token: AccessToken) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        debug!(expires_at = %token.expires_at(), "Caching access token");
        *slot = Some(token);
    }

    /// Forget the cached token
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}

impl std::fmt::Debug for CredentialCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = self
            .slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false);
        f.debug_struct("CredentialCache")
            .field("cached", &cached)
            .finish()
    }
}
