//! Error types for the workshop facade.

use rollcall_core::ValidationError;
use rollcall_store::{RemoteError, StoreError};
use rollcall_sync::SyncError;
use thiserror::Error;

/// Errors that can occur during workshop operations.
#[derive(Debug, Error)]
pub enum WorkshopError {
    /// The submission was rejected.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Local storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Remote store error outside the sync engine.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Sync error.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization of an export failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for workshop operations.
pub type Result<T> = std::result::Result<T, WorkshopError>;
