//! Error types for the 1AIX SDK

use aix_store_client::StoreError;
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error types
#[derive(Error, Debug)]
pub enum SdkError {
    /// The action needs a signed-in user; nothing was changed
    #[error("Authentication required")]
    AuthRequired,

    /// A required field is missing or empty; nothing was submitted
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Remote store call failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Local storage could not be read or written
    #[error("Local storage error: {0}")]
    LocalStorage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Some writes of a bulk commit failed; the rest were applied
    #[error("Order partially saved, {} of {total} items failed: {message}", .failed.len())]
    Commit {
        failed: Vec<String>,
        total: usize,
        message: String,
    },

    /// Item not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SdkError {
    /// Whether the user should be sent to the login view
    pub fn needs_login(&self) -> bool {
        matches!(self, SdkError::AuthRequired)
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        SdkError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        SdkError::LocalStorage(err.to_string())
    }
}
