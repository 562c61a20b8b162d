//! Remote record store: the async interface every backend implements.

use async_trait::async_trait;
use rollcall_core::{ParticipantRecord, RecordFilter};

use crate::error::RemoteResult;

/// Answer to a lightweight reachability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    /// The endpoint answered normally.
    Reachable,
    /// The endpoint answered but refused the request.
    Rejected { status: u16 },
}

/// Asynchronous record store holding one row per participant.
///
/// Every method can fail with a [`crate::RemoteError`]; callers decide what a
/// failure means for connectivity.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Minimal request proving the endpoint is up and the credentials work.
    async fn ping(&self) -> RemoteResult<Reachability>;

    /// Rows matching `filter`, ordered by timestamp ascending.
    async fn select(&self, filter: &RecordFilter) -> RemoteResult<Vec<ParticipantRecord>>;

    /// Insert rows in one request.
    async fn insert(&self, records: &[ParticipantRecord]) -> RemoteResult<()>;

    /// Delete every row matching `filter`.
    async fn delete(&self, filter: &RecordFilter) -> RemoteResult<()>;

    /// Human-readable description of the endpoint, for diagnostics.
    fn describe(&self) -> String;
}

#[async_trait]
impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    async fn ping(&self) -> RemoteResult<Reachability> {
        (**self).ping().await
    }

    async fn select(&self, filter: &RecordFilter) -> RemoteResult<Vec<ParticipantRecord>> {
        (**self).select(filter).await
    }

    async fn insert(&self, records: &[ParticipantRecord]) -> RemoteResult<()> {
        (**self).insert(records).await
    }

    async fn delete(&self, filter: &RecordFilter) -> RemoteResult<()> {
        (**self).delete(filter).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
