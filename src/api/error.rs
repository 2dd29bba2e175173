//! Error types for the service client.

use thiserror::Error;

/// Errors that can occur when talking to the streaming service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The call needs a signed-in user and there is none (or the token expired).
    #[error("Please log in first")]
    AuthRequired,

    #[error("Invalid server URL: {0}")]
    InvalidUrl(String),

    /// The service answered 2xx but the body did not have the expected shape.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Short text suitable for a notice popup.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error. Please try again.".to_string(),
            ApiError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for service client operations.
pub type Result<T> = std::result::Result<T, ApiError>;
