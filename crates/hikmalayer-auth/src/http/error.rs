/*
[INPUT]:  Error sources (wallet provider, HTTP transport, server responses, storage)
[OUTPUT]: Structured error types with stable causes and retry hints
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use thiserror::Error;

/// Main error type for Hikmalayer wallet authentication
#[derive(Error, Debug)]
pub enum AuthError {
    /// No wallet signing provider is present
    #[error("No wallet provider detected, install one and reload")]
    CapabilityUnavailable,

    /// The user rejected a wallet prompt
    #[error("Request was declined in the wallet")]
    UserDeclined,

    /// Transport failure, including timeouts
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error (status {status}): {body}")]
    Server { status: u16, body: String },

    /// Signature, nonce or address did not check out
    #[error("Signature verification rejected (status {status}): {body}")]
    VerificationRejected { status: u16, body: String },

    /// A previously issued session token is no longer accepted
    #[error("Session rejected by server (status {status}), reconnect the wallet")]
    SessionRejected { status: u16 },

    /// A protected call was attempted without a session
    #[error("Not authenticated, connect a wallet first")]
    NotAuthenticated,

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Wallet provider failed for a reason other than a user decline
    #[error("Wallet provider error: {0}")]
    Provider(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Key-value store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Check if re-invoking `connect()` may succeed without outside changes
    pub fn is_retryable(&self) -> bool {
        match self {
            AuthError::Network(_) | AuthError::InvalidResponse(_) => true,
            AuthError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Check if error indicates an authentication failure
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            AuthError::VerificationRejected { .. }
                | AuthError::SessionRejected { .. }
                | AuthError::NotAuthenticated
        )
    }

    /// Fatal until the host environment changes (provider installed, page reloaded)
    pub fn is_fatal(&self) -> bool {
        matches!(self, AuthError::CapabilityUnavailable)
    }

    /// Create a server error from status code and response body
    pub fn server_error(status: StatusCode, body: impl Into<String>) -> Self {
        AuthError::Server {
            status: status.as_u16(),
            body: body.into(),
        }
    }
}

/// Result type alias for authentication operations
pub type Result<T> = std::result::Result<T, AuthError>;
