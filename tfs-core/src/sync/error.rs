//! Sync error types.

use thiserror::Error;

/// Errors raised while talking to the data store.
///
/// Reads treat every variant as "keep the last-known document"; writes hand
/// the error back to the caller.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Request never completed (connection refused, DNS, reset)
    #[error("Network error: {0}")]
    Network(String),
    /// Request exceeded its deadline
    #[error("Request timed out")]
    Timeout,
    /// Non-2xx status or `success: false`
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },
    /// Body was not JSON or did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),
    /// Update could not be merged into the item
    #[error("Failed to merge update into '{id}': {source}")]
    Merge {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SyncError::Timeout
        } else if e.is_decode() {
            SyncError::Malformed(e.to_string())
        } else {
            SyncError::Network(e.to_string())
        }
    }
}
