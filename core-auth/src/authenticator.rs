//! # Cached Authenticator
//!
//! Implements the engine's [`Authenticator`] contract on top of a pluggable
//! [`TokenSource`], consulting a [`CredentialCache`] first.
//!
//! ## Usage
//!
//! ```ignore
//! use core_auth::{CachedAuthenticator, CredentialCache, Credentials, EnvTokenSource};
//! use bridge_traits::time::SystemClock;
//! use std::sync::Arc;
//!
//! let cache = Arc::new(CredentialCache::new(Arc::new(SystemClock)));
//! let authenticator = CachedAuthenticator::new(
//!     Arc::new(EnvTokenSource::from_env()),
//!     cache,
//!     Credentials::from_env(),
//! );
//! let token = authenticator.authenticate().await?;
//! ```

use crate::cache::CredentialCache;
use crate::error::{AuthError, Result};
use crate::types::{AccessToken, Credentials};
use async_trait::async_trait;
use bridge_traits::inventory::{Authenticator, BearerToken};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub const ENV_ACCESS_TOKEN: &str = "EBAY_ACCESS_TOKEN";
pub const ENV_TOKEN_EXPIRES_IN: &str = "EBAY_TOKEN_EXPIRES_IN";

/// Lifetime assumed for a pre-acquired token with no explicit expiry
pub const DEFAULT_TOKEN_LIFETIME_SECS: i64 = 7200;

/// Produces fresh access tokens
///
/// The token-refresh protocol itself lives outside this workspace; a source
/// is whatever can turn configured credentials into a token.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn acquire(&self, credentials: &Credentials, now: DateTime<Utc>) -> Result<AccessToken>;
}

/// Token source backed by a pre-acquired token in the environment
#[derive(Clone)]
pub struct EnvTokenSource {
    token: Option<String>,
    expires_in: i64,
}

impl EnvTokenSource {
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(ENV_ACCESS_TOKEN)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let expires_in = lookup(ENV_TOKEN_EXPIRES_IN)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_TOKEN_LIFETIME_SECS);

        Self { token, expires_in }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

impl std::fmt::Debug for EnvTokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvTokenSource")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[async_trait]
impl TokenSource for EnvTokenSource {
    async fn acquire(&self, credentials: &Credentials, now: DateTime<Utc>) -> Result<AccessToken> {
        if !credentials.is_configured() {
            return Err(AuthError::NotConfigured(
                "EBAY_CLIENT_ID, EBAY_CLIENT_SECRET and EBAY_REFRESH_TOKEN must be set".to_string(),
            ));
        }

        let token = self.token.as_ref().ok_or_else(|| {
            AuthError::TokenUnavailable(format!(
                "{} is not set; acquire a token and export it before running",
                ENV_ACCESS_TOKEN
            ))
        })?;

        Ok(AccessToken::new(token.clone(), now, self.expires_in))
    }
}

/// [`Authenticator`] that serves cached tokens and refreshes through a source
pub struct CachedAuthenticator {
    source: Arc<dyn TokenSource>,
    cache: Arc<CredentialCache>,
    credentials: Credentials,
}

impl CachedAuthenticator {
    pub fn new(
        source: Arc<dyn TokenSource>,
        cache: Arc<CredentialCache>,
        credentials: Credentials,
    ) -> Self {
        Self {
            source,
            cache,
            credentials,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Get a usable access token, acquiring one if the cache is empty
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> Result<AccessToken> {
        if let Some(token) = self.cache.get() {
            debug!("Using cached access token");
            return Ok(token);
        }

        let now = self.cache.clock().now();
        let token = self.source.acquire(&self.credentials, now).await.map_err(|e| {
            warn!(error = %e, "Token acquisition failed");
            match e {
                AuthError::NotConfigured(_) => e,
                other => AuthError::TokenRefreshFailed(other.to_string()),
            }
        })?;

        info!(expires_at = %token.expires_at(), "Access token acquired");
        self.cache.store(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl Authenticator for CachedAuthenticator {
    async fn authenticate(&self) -> bridge_traits::error::Result<BearerToken> {
        let token = self.access_token().await?;
        Ok(BearerToken::new(token.secret()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::time::FixedClock;
    use chrono::{Duration, TimeZone};
    use mockall::mock;
    use std::collections::HashMap;

    mock! {
        Source {}

        #[async_trait]
        impl TokenSource for Source {
            async fn acquire(&self, credentials: &Credentials, now: DateTime<Utc>) -> Result<AccessToken>;
        }
    }

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
    }

    fn configured() -> Credentials {
        Credentials::new("id", "secret", "refresh")
    }

    #[tokio::test]
    async fn test_acquires_once_then_serves_cache() {
        let mut source = MockSource::new();
        source
            .expect_acquire()
            .times(1)
            .returning(|_, now| Ok(AccessToken::new("fresh", now, 3600)));

        let clock = Arc::new(FixedClock::new(start()));
        let cache = Arc::new(CredentialCache::new(clock));
        let auth = CachedAuthenticator::new(Arc::new(source), cache, configured());

        let first = auth.authenticate().await.unwrap();
        let second = auth.authenticate().await.unwrap();
        assert_eq!(first.secret(), "fresh");
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn test_reacquires_after_expiry() {
        let mut source = MockSource::new();
        let mut calls = 0;
        source.expect_acquire().times(2).returning(move |_, now| {
            calls += 1;
            Ok(AccessToken::new(format!("tok-{}", calls), now, 120))
        });

        let clock = Arc::new(FixedClock::new(start()));
        let cache = Arc::new(CredentialCache::new(clock.clone()));
        let auth = CachedAuthenticator::new(Arc::new(source), cache, configured());

        assert_eq!(auth.authenticate().await.unwrap().secret(), "tok-1");
        clock.advance(Duration::seconds(90));
        assert_eq!(auth.authenticate().await.unwrap().secret(), "tok-2");
    }

    #[tokio::test]
    async fn test_source_failure_maps_to_refresh_failed() {
        let mut source = MockSource::new();
        source
            .expect_acquire()
            .returning(|_, _| Err(AuthError::TokenUnavailable("endpoint down".to_string())));

        let cache = Arc::new(CredentialCache::new(Arc::new(FixedClock::new(start()))));
        let auth = CachedAuthenticator::new(Arc::new(source), cache.clone(), configured());

        let err = auth.access_token().await.unwrap_err();
        assert!(matches!(err, AuthError::TokenRefreshFailed(_)));
        assert!(err.to_string().contains("endpoint down"));
        assert!(cache.get().is_none());

        let bridge_err = auth.authenticate().await.unwrap_err();
        assert!(bridge_err.to_string().contains("endpoint down"));
    }

    #[tokio::test]
    async fn test_env_token_source() {
        let env: HashMap<&str, &str> = [
            ("EBAY_ACCESS_TOKEN", "env-token"),
            ("EBAY_TOKEN_EXPIRES_IN", "600"),
        ]
        .into_iter()
        .collect();
        let source = EnvTokenSource::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        let token = source.acquire(&configured(), start()).await.unwrap();
        assert_eq!(token.secret(), "env-token");
        assert_eq!(token.expires_at(), start() + Duration::seconds(600));
    }

    #[tokio::test]
    async fn test_env_token_source_missing_token() {
        let source = EnvTokenSource::from_lookup(|_| None);
        let err = source.acquire(&configured(), start()).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenUnavailable(_)));
        assert!(err.to_string().contains("EBAY_ACCESS_TOKEN"));
    }

    #[tokio::test]
    async fn test_env_token_source_requires_credentials() {
        let source = EnvTokenSource::from_lookup(|k| {
            (k == "EBAY_ACCESS_TOKEN").then(|| "env-token".to_string())
        });
        let creds = Credentials::new("YOUR_CLIENT_ID", "secret", "refresh");
        let err = source.acquire(&creds, start()).await.unwrap_err();
        assert!(matches!(err, AuthError::NotConfigured(_)));
    }

    #[test]
    fn test_env_token_source_debug_redacts() {
        let source = EnvTokenSource::from_lookup(|_| Some("leak-me".to_string()));
        let debug = format!("{:?}", source);
        assert!(!debug.contains("leak-me"));
    }
}
