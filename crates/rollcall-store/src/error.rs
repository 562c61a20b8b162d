//! Error types for the store module.

use thiserror::Error;

/// Errors from local persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Snapshot could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("store lock poisoned")]
    Poisoned,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for local store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors from a remote record store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request did not complete in time.
    #[error("request timed out")]
    Timeout,

    /// The endpoint could not be reached (DNS, refused, offline, CORS).
    #[error("network error: {0}")]
    Network(String),

    /// Any other failure while sending the request.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint answered with an error body.
    #[error("remote error {code}: {message}")]
    Api {
        status: Option<u16>,
        code: String,
        message: String,
        details: Option<String>,
        hint: Option<String>,
    },

    /// The endpoint answered with something we could not decode.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Shorthand for an answered error with just a code and message.
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        RemoteError::Api {
            status: None,
            code: code.into(),
            message: message.into(),
            details: None,
            hint: None,
        }
    }
}

/// Result type for remote store operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;
