//! # Rollcall
//!
//! Offline-first workshop enrollment. Names go in, each lands in a
//! session's `enrolled` list until the session is full and in its `queued`
//! list after that. State is kept locally and mirrored to a remote record
//! store whenever the network allows.
//!
//! ## Overview
//!
//! - **Sessions**: Fixed, configured slots, each with its own capacity
//! - **Submissions**: Validated names, unique per session (case-insensitive)
//! - **Sync**: Local-first writes with retries, reconnection and
//!   reconciliation (see [`sync`])
//! - **Admin**: Clear, export, force a sync, inspect the connection
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rollcall::{Workshop, WorkshopConfig};
//!
//! async fn example() -> rollcall::Result<()> {
//!     let config = WorkshopConfig::load("rollcall.json")?;
//!     let workshop = Workshop::open(config).await?;
//!
//!     let enrollment = workshop.submit("Ada Lovelace", "session1").await?;
//!     println!("{}", enrollment.message());
//!
//!     let status = workshop.sync_status().await;
//!     println!("connected: {}, pending sync: {}", status.connected, status.sync_required);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `rollcall::core` - Data model (participants, sessions, roster)
//! - `rollcall::store` - Local and remote stores
//! - `rollcall::sync` - Sync engine

pub mod config;
pub mod error;
pub mod workshop;

pub use rollcall_core as core;
pub use rollcall_store as store;
pub use rollcall_sync as sync;

pub use config::{SyncSettings, WorkshopConfig, DEFAULT_LOCAL_PATH, DEFAULT_WORKSHOP_ID};
pub use error::{Result, WorkshopError};
pub use workshop::{ConnectionReport, Enrollment, ExportSnapshot, SessionSummary, Workshop};

pub use rollcall_core::{
    Bucket, Participant, Placement, Roster, SessionCatalog, SessionId, SessionInfo,
    ValidationError,
};
pub use rollcall_sync::{Advisory, ErrorKind, ProbeOutcome, SyncStatus};
