use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Credentials not configured: {0}")]
    NotConfigured(String),

    #[error("Access token unavailable: {0}")]
    TokenUnavailable(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl From<AuthError> for bridge_traits::BridgeError {
    fn from(err: AuthError) -> Self {
        bridge_traits::BridgeError::OperationFailed(err.to_string())
    }
}
