//! In-memory implementations of the local and remote stores.
//!
//! These are primarily for testing. [`MemoryRemoteStore`] can be switched
//! offline, made to fail writes or queries, and records every call it
//! receives with the (tokio) time it arrived, so retry timing can be
//! asserted under a paused clock.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rollcall_core::{ParticipantRecord, RecordFilter};
use tokio::time::Instant;

use crate::error::{RemoteError, RemoteResult, Result, StoreError};
use crate::local::LocalStore;
use crate::remote::{Reachability, RemoteStore};

/// In-memory local store.
#[derive(Default)]
pub struct MemoryLocalStore {
    values: Mutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `set` fail with a serialization error.
    pub fn set_fail_writes(&self, fail: bool) {
        *self
            .fail_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = fail;
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if *self.fail_writes.lock().map_err(|_| StoreError::Poisoned)? {
            return Err(StoreError::Serialization(format!(
                "quota exceeded writing {key}"
            )));
        }
        let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Kind of call received by a [`MemoryRemoteStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    Ping,
    Select(RecordFilter),
    Insert(usize),
    Delete(RecordFilter),
}

/// A call received by a [`MemoryRemoteStore`], successful or not.
#[derive(Debug, Clone)]
pub struct RemoteCall {
    pub op: RemoteOp,
    pub at: Instant,
    pub ok: bool,
}

struct MemoryRemoteInner {
    rows: Vec<ParticipantRecord>,
    online: bool,
    ping_status: Option<u16>,
    ping_delay: Option<Duration>,
    ping_error: Option<RemoteError>,
    query_delay: Option<Duration>,
    write_delay: Option<Duration>,
    query_errors: VecDeque<RemoteError>,
    sticky_query_error: Option<RemoteError>,
    failing_writes: usize,
    sticky_write_error: Option<RemoteError>,
    calls: Vec<RemoteCall>,
}

/// In-memory remote store with fault injection.
pub struct MemoryRemoteStore {
    inner: Mutex<MemoryRemoteInner>,
}

impl MemoryRemoteStore {
    /// An empty, online store.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MemoryRemoteInner {
                rows: Vec::new(),
                online: true,
                ping_status: None,
                ping_delay: None,
                ping_error: None,
                query_delay: None,
                write_delay: None,
                query_errors: VecDeque::new(),
                sticky_query_error: None,
                failing_writes: 0,
                sticky_write_error: None,
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryRemoteInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offline stores fail every call with a network error.
    pub fn set_online(&self, online: bool) {
        self.lock().online = online;
    }

    /// Answer pings with this HTTP-like status instead of `Reachable`.
    pub fn set_ping_status(&self, status: Option<u16>) {
        self.lock().ping_status = status;
    }

    /// Delay every ping, to exercise probe timeouts.
    pub fn set_ping_delay(&self, delay: Option<Duration>) {
        self.lock().ping_delay = delay;
    }

    /// Fail every ping with this error.
    pub fn set_ping_error(&self, error: Option<RemoteError>) {
        self.lock().ping_error = error;
    }

    /// Delay every `select`, to hold a read in flight.
    pub fn set_query_delay(&self, delay: Option<Duration>) {
        self.lock().query_delay = delay;
    }

    /// Delay every `insert` and `delete`, to hold a write in flight.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        self.lock().write_delay = delay;
    }

    /// Fail the next `select` with this error.
    pub fn push_query_error(&self, error: RemoteError) {
        self.lock().query_errors.push_back(error);
    }

    /// Fail every `select` with this error until cleared.
    pub fn set_query_error(&self, error: Option<RemoteError>) {
        self.lock().sticky_query_error = error;
    }

    /// Fail the next `count` write calls (insert or delete).
    pub fn fail_next_writes(&self, count: usize) {
        self.lock().failing_writes = count;
    }

    /// Fail every write call with this error until cleared.
    pub fn set_write_error(&self, error: Option<RemoteError>) {
        self.lock().sticky_write_error = error;
    }

    /// Replace the stored rows directly, bypassing fault injection.
    pub fn seed(&self, rows: Vec<ParticipantRecord>) {
        self.lock().rows = rows;
    }

    /// Snapshot of the stored rows.
    pub fn rows(&self) -> Vec<ParticipantRecord> {
        self.lock().rows.clone()
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of write calls (insert or delete) received, failed or not.
    pub fn write_calls(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c.op, RemoteOp::Insert(_) | RemoteOp::Delete(_)))
            .count()
    }

    fn record(inner: &mut MemoryRemoteInner, op: RemoteOp, ok: bool) {
        inner.calls.push(RemoteCall {
            op,
            at: Instant::now(),
            ok,
        });
    }

    async fn pause(delay: Option<Duration>) {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn offline_error() -> RemoteError {
        RemoteError::Network("Failed to fetch".into())
    }

    fn check_write(inner: &mut MemoryRemoteInner) -> RemoteResult<()> {
        if !inner.online {
            return Err(Self::offline_error());
        }
        if let Some(err) = &inner.sticky_write_error {
            return Err(err.clone());
        }
        if inner.failing_writes > 0 {
            inner.failing_writes -= 1;
            return Err(Self::offline_error());
        }
        Ok(())
    }
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemoteStore {
    async fn ping(&self) -> RemoteResult<Reachability> {
        let delay = self.lock().ping_delay;
        Self::pause(delay).await;

        let mut inner = self.lock();
        let result = if !inner.online {
            Err(Self::offline_error())
        } else if let Some(err) = &inner.ping_error {
            Err(err.clone())
        } else {
            match inner.ping_status {
                Some(status) => Ok(Reachability::Rejected { status }),
                None => Ok(Reachability::Reachable),
            }
        };
        Self::record(&mut inner, RemoteOp::Ping, result.is_ok());
        result
    }

    async fn select(&self, filter: &RecordFilter) -> RemoteResult<Vec<ParticipantRecord>> {
        let delay = self.lock().query_delay;
        Self::pause(delay).await;

        let mut inner = self.lock();
        let result = if !inner.online {
            Err(Self::offline_error())
        } else if let Some(err) = inner.query_errors.pop_front() {
            Err(err)
        } else if let Some(err) = &inner.sticky_query_error {
            Err(err.clone())
        } else {
            let mut rows: Vec<_> = inner
                .rows
                .iter()
                .filter(|r| filter.matches(r))
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            if let Some(limit) = filter.limit {
                rows.truncate(limit);
            }
            Ok(rows)
        };
        Self::record(&mut inner, RemoteOp::Select(filter.clone()), result.is_ok());
        result
    }

    async fn insert(&self, records: &[ParticipantRecord]) -> RemoteResult<()> {
        let delay = self.lock().write_delay;
        Self::pause(delay).await;

        let mut inner = self.lock();
        let result = Self::check_write(&mut inner);
        if result.is_ok() {
            inner.rows.extend_from_slice(records);
        }
        Self::record(&mut inner, RemoteOp::Insert(records.len()), result.is_ok());
        result
    }

    async fn delete(&self, filter: &RecordFilter) -> RemoteResult<()> {
        let delay = self.lock().write_delay;
        Self::pause(delay).await;

        let mut inner = self.lock();
        let result = Self::check_write(&mut inner);
        if result.is_ok() {
            inner.rows.retain(|r| !filter.matches(r));
        }
        Self::record(&mut inner, RemoteOp::Delete(filter.clone()), result.is_ok());
        result
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
