use chrono::{DateTime, Duration, Utc};
use std::fmt;

pub const ENV_CLIENT_ID: &str = "EBAY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "EBAY_CLIENT_SECRET";
pub const ENV_REFRESH_TOKEN: &str = "EBAY_REFRESH_TOKEN";

/// Prefixes that mark a value as a template placeholder rather than a secret
const PLACEHOLDER_PREFIXES: &[&str] = &["YOUR_", "PLACEHOLDER", "XXX"];

/// Marketplace application credentials.
///
/// The engine only authenticates when these look configured; a fresh checkout
/// with template values in `.env` runs without touching the token endpoint.
///
/// # Security
///
/// The `Debug` implementation redacts every field.
///
/// # Examples
///
/// ```
/// use core_auth::Credentials;
///
/// let creds = Credentials::new("app-id", "app-secret", "v^1.1#refresh");
/// assert!(creds.is_configured());
///
/// let template = Credentials::new("YOUR_CLIENT_ID", "secret", "refresh");
/// assert!(!template.is_configured());
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Read credentials through an environment-style lookup
    ///
    /// Missing keys become empty strings.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            client_id: read(ENV_CLIENT_ID),
            client_secret: read(ENV_CLIENT_SECRET),
            refresh_token: read(ENV_REFRESH_TOKEN),
        }
    }

    /// Read credentials from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Check that every field is set to something other than a placeholder
    pub fn is_configured(&self) -> bool {
        [&self.client_id, &self.client_secret, &self.refresh_token]
            .iter()
            .all(|value| looks_real(value))
    }
}

fn looks_real(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let upper = value.to_uppercase();
    !PLACEHOLDER_PREFIXES
        .iter()
        .any(|prefix| upper.starts_with(prefix))
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &"[REDACTED]")
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// An access token with its expiry.
///
/// # Security
///
/// Tokens should never be logged. The `Debug` implementation redacts the
/// secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    token: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Create a token valid for `expires_in` seconds after `issued_at`
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>, expires_in: i64) -> Self {
        Self {
            token: token.into(),
            expires_at: issued_at + Duration::seconds(expires_in),
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check if the token is still usable at `now`
    ///
    /// # Arguments
    ///
    /// * `now` - Current time
    /// * `buffer_seconds` - Treat the token as expired this many seconds early
    pub fn is_valid_at(&self, now: DateTime<Utc>, buffer_seconds: i64) -> bool {
        now < self.expires_at - Duration::seconds(buffer_seconds)
    }
}

// Custom Debug implementation to avoid logging tokens
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
