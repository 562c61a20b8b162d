//! Error types for the sync module.

use serde::Serialize;
use thiserror::Error;

use rollcall_store::RemoteError;

/// Why a probe considers the remote store unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// The endpoint could not be reached.
    Network,
    /// The endpoint did not answer within the probe timeout.
    Timeout,
    /// The endpoint rejected our credentials.
    Auth,
    /// The endpoint answered but is not a usable record store.
    Endpoint,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::Network => "network",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Auth => "auth",
            ErrorKind::Endpoint => "endpoint",
        })
    }
}

/// Errors surfaced by explicit sync operations.
///
/// Background persistence never returns these; it turns remote failures
/// into state transitions instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A remote call failed.
    #[error("remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// The remote store is currently unavailable.
    #[error("remote store unavailable ({0})")]
    Offline(ErrorKind),

    /// The engine has been shut down.
    #[error("sync engine shut down")]
    Shutdown,
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
