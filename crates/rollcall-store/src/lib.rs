//! # Rollcall Store
//!
//! Storage abstractions for Rollcall. Two stores back every workshop:
//!
//! - a **local** store: synchronous key-value persistence that survives
//!   restarts ([`LocalStore`])
//! - a **remote** store: an asynchronous record store reached over the
//!   network, which can fail at any time ([`RemoteStore`])
//!
//! ## Key Types
//!
//! - [`LocalStore`] - Sync key-value trait
//! - [`SqliteLocalStore`] - SQLite-backed local store
//! - [`MemoryLocalStore`] - In-memory local store for tests and embedding
//! - [`RemoteStore`] - Async record store trait (ping/select/insert/delete)
//! - [`RestRemoteStore`] - PostgREST-style HTTP remote store
//! - [`MemoryRemoteStore`] - In-memory remote store with fault injection
//! - [`snapshot`] - Versioned roster encoding for the local store
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rollcall_core::SessionCatalog;
//! use rollcall_store::{snapshot, SqliteLocalStore};
//!
//! let local = SqliteLocalStore::open("rollcall.db").unwrap();
//! let catalog = SessionCatalog::default();
//! let loaded = snapshot::load_roster(&local, &catalog).unwrap();
//! println!("{} enrolled", loaded.roster.count(rollcall_core::Bucket::Enrolled));
//! ```

pub mod error;
pub mod local;
pub mod memory;
pub mod migration;
pub mod remote;
pub mod rest;
pub mod snapshot;
pub mod sqlite;

pub use error::{RemoteError, RemoteResult, Result, StoreError};
pub use local::LocalStore;
pub use memory::{MemoryLocalStore, MemoryRemoteStore, RemoteCall, RemoteOp};
pub use remote::{Reachability, RemoteStore};
pub use rest::{RestConfig, RestRemoteStore};
pub use snapshot::{LoadedRoster, SnapshotFormat, ENROLLED_KEY, QUEUED_KEY};
pub use sqlite::SqliteLocalStore;
