//! Error types for snapshot sources.

use thiserror::Error;

/// Errors that can occur while fetching a snapshot.
///
/// Every variant collapses to the same user-visible "fetch error" status;
/// the distinction only shows up in logs and in the status bar detail.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The body was not JSON or lacked required fields.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if err.is_builder() {
            FetchError::Client(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}
