//! Error types for the Rollcall data model.

use thiserror::Error;

use crate::types::SessionId;

/// Reasons a submission is rejected before it touches any store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Name is too short or contains characters outside the allowed set.
    #[error("invalid name {0:?}: use at least 2 letters, spaces, apostrophes or hyphens")]
    InvalidName(String),

    /// Name already present (case-insensitive, trimmed) in the session.
    #[error("{name:?} is already registered for {session}")]
    DuplicateName { name: String, session: SessionId },

    /// Session is not part of the configured catalog.
    #[error("unknown session: {0}")]
    UnknownSession(SessionId),
}
