//! Error types for the store client

use thiserror::Error;

/// Store client error
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Row or resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Auth service rejected the request
    #[error("Auth error: {0}")]
    Auth(String),
}

impl StoreError {
    /// Whether the failure happened on the server side (5xx)
    pub fn is_server_fault(&self) -> bool {
        matches!(self, StoreError::Server { status, .. } if *status >= 500)
    }
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
