//! # Rollcall Sync
//!
//! Offline-first synchronization between an in-memory roster, a local
//! key-value store and a remote record store.
//!
//! ## Overview
//!
//! Every change is written locally first and pushed to the remote store
//! when it is reachable. Failed pushes are retried with exponential backoff;
//! once retries run out the engine probes periodically and, on recovery,
//! reconciles the remote copy against local state. Local always wins.
//!
//! ## Key Types
//!
//! - [`SyncEngine`] - Owns the roster and drives the state machine
//! - [`ConnectionProbe`] - Reachability and credential check
//! - [`ReconcileReport`] - What a reconciliation found and did
//! - [`SyncStatus`] / [`Advisory`] - Diagnostics and user-facing notices
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rollcall_core::{Participant, SessionCatalog};
//! use rollcall_store::{MemoryLocalStore, MemoryRemoteStore};
//! use rollcall_sync::{SyncConfig, SyncEngine};
//!
//! async fn example() {
//!     let engine = SyncEngine::start(
//!         Arc::new(MemoryLocalStore::new()),
//!         Arc::new(MemoryRemoteStore::new()),
//!         "workshop-2026",
//!         SessionCatalog::default(),
//!         SyncConfig::default(),
//!     )
//!     .await;
//!
//!     let placement = engine
//!         .apply(|roster, catalog| {
//!             roster.admit(catalog, Participant::new("Ann", "session1".into()))
//!         })
//!         .await;
//!     println!("{placement:?}, {:?}", engine.status().await);
//! }
//! ```

pub mod engine;
pub mod error;
pub mod probe;
pub mod protocol;
pub mod reconcile;
mod timers;

pub use engine::{Advisory, RetryState, SyncConfig, SyncEngine, SyncStatus};
pub use error::{ErrorKind, Result, SyncError};
pub use probe::{classify_query_error, ConnectionProbe, ProbeOutcome};
pub use reconcile::{reconcile, ReconcileReport};
