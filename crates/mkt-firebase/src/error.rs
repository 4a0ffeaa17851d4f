//! Firebase error types.

use thiserror::Error;

/// Result type for Firebase operations.
pub type FirebaseResult<T> = Result<T, FirebaseError>;

/// Errors that can occur while configuring or calling Firebase.
#[derive(Debug, Error)]
pub enum FirebaseError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FirebaseError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::Auth(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        match status {
            401 | 403 => Self::Auth(msg.into()),
            _ => Self::RequestFailed(format!("HTTP {}: {}", status, msg.into())),
        }
    }

    /// True if the presented token was rejected, as opposed to the
    /// provider failing to answer.
    pub fn is_invalid_token(&self) -> bool {
        matches!(self, FirebaseError::InvalidToken(_))
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, FirebaseError::Configuration(_))
    }
}
