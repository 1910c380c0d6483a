//! Errors from the external collaborators (history and order listing).
//!
//! Fetch failures never escape the chat panel: the session or directory logs
//! them and carries on with an empty result.

use thiserror::Error;

/// A history or order-listing request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Request never produced a response
    #[error("request failed: {0}")]
    Request(String),

    /// Server answered with a non-success status
    #[error("unexpected status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Response body did not have the expected shape
    #[error("invalid response body: {0}")]
    Decode(String),
}
