//! # Rollcall Core
//!
//! Pure data model for Rollcall: participants, sessions, and the roster that
//! holds them.
//!
//! This crate contains no I/O, no storage, no networking. Everything here is
//! plain computation over enrollment state.
//!
//! ## Key Types
//!
//! - [`Participant`] - A single enrollment, identified by [`ParticipantId`]
//! - [`SessionId`] / [`SessionInfo`] - Configured workshop slots
//! - [`SessionCatalog`] - The fixed set of sessions for one workshop
//! - [`Roster`] - Enrolled and queued participants for every session
//! - [`ParticipantRecord`] - The flat row shape used by remote stores
//!
//! ## Name Rules
//!
//! Submitted names are checked by [`validate_name`] and compared for
//! duplicates through [`normalize_name`]. See the [`validation`] module.

pub mod error;
pub mod participant;
pub mod record;
pub mod roster;
pub mod session;
pub mod types;
pub mod validation;

pub use error::ValidationError;
pub use participant::{now_timestamp, Bucket, Participant};
pub use record::{ParticipantRecord, RecordFilter};
pub use roster::{MembershipDiff, Placement, Roster, SessionRoster};
pub use session::{SessionCatalog, SessionInfo};
pub use types::{ParticipantId, SessionId};
pub use validation::{normalize_name, validate_name, MIN_NAME_CHARS};
