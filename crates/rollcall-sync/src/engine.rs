//! The sync engine: one roster, two stores, unreliable network.
//!
//! ## State machine
//!
//! ```text
//!            persist (connected)              persist (offline)
//!   local write ──> remote write          local write ──> sync_required
//!                    │ ok      │ err                          │
//!                    ▼         ▼                              ▼
//!                 clean     retry chain ── exhausted ──> reconnect loop
//!                            (2, 4, 8 s)                 (every 30 s)
//!                               │ ok                          │ probe ok
//!                               ▼                             ▼
//!                             clean                     reconcile ──> clean
//! ```
//!
//! Every mutation is written to the local store first. Remote failures never
//! surface to the caller of [`SyncEngine::apply`]; they become state
//! transitions plus an [`Advisory`].
//!
//! ## Concurrency
//!
//! [`SyncEngine`] is a cheap cloneable handle. State sits behind one async
//! mutex; remote writes and reconciliation go through a second one (the
//! remote gate) so the delete and insert phases of one write never
//! interleave with another. The gate is always taken before the state lock.
//!
//! Each local write bumps a revision. A remote write or reconciliation works
//! on a copy of the roster and only clears `sync_required` if the revision
//! is unchanged when it finishes; otherwise the newer roster is written
//! again.
//!
//! At most one retry chain and one reconnection loop run at a time. Both are
//! aborted by [`SyncEngine::shutdown`] or when the last handle is dropped.

use std::sync::Arc;
use std::time::Duration;

use rollcall_core::{Bucket, Roster, SessionCatalog};
use rollcall_store::{snapshot, LocalStore, RemoteResult, RemoteStore};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::error::{Result, SyncError};
use crate::probe::{ConnectionProbe, ProbeOutcome};
use crate::protocol;
use crate::reconcile::{self, ReconcileReport};
use crate::timers::{TimerKind, Timers};

/// Timing knobs for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Retry `n` waits `retry_base * 2^n`.
    pub retry_base: Duration,
    /// Retries after a failed remote write before giving up.
    pub max_attempts: u32,
    /// Delay between reconnection probes.
    pub reconnect_interval: Duration,
    /// Bound on each network step of a probe.
    pub probe_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_base: Duration::from_secs(1),
            max_attempts: 3,
            reconnect_interval: Duration::from_secs(30),
            probe_timeout: Duration::from_secs(10),
        }
    }
}

impl SyncConfig {
    /// Wait before retry number `attempt` (1-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        self.retry_base.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// User-facing notice about where the data currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    /// The last change is stored locally; the remote write failed or was
    /// skipped.
    SavedLocallyOnly,
    /// Retries are exhausted; changes will be pushed after reconnecting.
    OfflineWillSyncLater,
    /// The remote store caught up with local state.
    Restored,
}

impl Advisory {
    pub fn message(&self) -> &'static str {
        match self {
            Advisory::SavedLocallyOnly => "Data saved locally but database sync failed",
            Advisory::OfflineWillSyncLater => "Working offline. Changes will sync when the connection returns",
            Advisory::Restored => "Connection restored. Data synced",
        }
    }
}

/// Retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RetryState {
    /// Retries used by the current chain. Resets on any successful remote
    /// write and when a reconnection probe succeeds.
    pub attempts: u32,
    /// Retries allowed before falling back to the reconnection loop.
    pub max_attempts: u32,
}

/// Snapshot of the engine for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// Whether the remote store is believed usable.
    pub connected: bool,
    /// Local changes have not reached the remote store yet.
    pub sync_required: bool,
    /// Retry counters.
    pub retry: RetryState,
    /// A retry chain is running.
    pub retrying: bool,
    /// A reconnection loop is running.
    pub reconnect_scheduled: bool,
    /// Latest user-facing notice, if any.
    pub advisory: Option<Advisory>,
    /// Enrolled participants across all sessions.
    pub enrolled: usize,
    /// Queued participants across all sessions.
    pub queued: usize,
    /// [`SyncEngine::shutdown`] has been called.
    pub shut_down: bool,
}

struct EngineState {
    roster: Roster,
    /// Bumped on every local write. A remote write only settles the engine
    /// if no local write happened since its roster copy was taken.
    revision: u64,
    connected: bool,
    sync_required: bool,
    retry: RetryState,
    retrying: bool,
    reconnect_scheduled: bool,
    advisory: Option<Advisory>,
    shut_down: bool,
}

struct Inner {
    local: Arc<dyn LocalStore>,
    remote: Arc<dyn RemoteStore>,
    probe: ConnectionProbe,
    config: SyncConfig,
    workshop_id: String,
    catalog: SessionCatalog,
    state: Mutex<EngineState>,
    remote_gate: Mutex<()>,
    timers: Timers,
}

/// Cancels background tasks when the last [`SyncEngine`] handle goes away.
/// Tasks hold `Inner`, not this.
struct Shared {
    inner: Arc<Inner>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        self.inner.timers.cancel_all();
    }
}

/// Handle to a running sync engine.
#[derive(Clone)]
pub struct SyncEngine {
    shared: Arc<Shared>,
}

impl SyncEngine {
    /// Probe the remote store, hydrate the roster and return a ready engine.
    ///
    /// The roster comes from the remote store when the probe says it is
    /// usable, falling back to the local snapshot if that load fails, and
    /// from the local snapshot otherwise. Legacy local data is rewritten in
    /// the current shape. Unreadable local data starts an empty roster.
    pub async fn start(
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
        workshop_id: impl Into<String>,
        catalog: SessionCatalog,
        config: SyncConfig,
    ) -> Self {
        let workshop_id = workshop_id.into();
        let probe = ConnectionProbe::new(remote.clone(), workshop_id.clone(), config.probe_timeout);

        let outcome = probe.probe().await;
        let connected = outcome.is_connected();
        let roster = if connected {
            match protocol::load_roster(&*remote, &workshop_id, &catalog).await {
                Ok(roster) => {
                    tracing::info!(
                        enrolled = roster.count(Bucket::Enrolled),
                        queued = roster.count(Bucket::Queued),
                        "loaded roster from remote store"
                    );
                    roster
                }
                Err(e) => {
                    tracing::warn!(error = %e, "remote load failed, using local snapshot");
                    load_local(&*local, &catalog)
                }
            }
        } else {
            tracing::warn!(?outcome, "remote store unavailable, using local snapshot");
            load_local(&*local, &catalog)
        };

        let state = EngineState {
            roster,
            revision: 0,
            connected,
            sync_required: false,
            retry: RetryState {
                attempts: 0,
                max_attempts: config.max_attempts,
            },
            retrying: false,
            reconnect_scheduled: false,
            advisory: None,
            shut_down: false,
        };

        Self {
            shared: Arc::new(Shared {
                inner: Arc::new(Inner {
                    local,
                    remote,
                    probe,
                    config,
                    workshop_id,
                    catalog,
                    state: Mutex::new(state),
                    remote_gate: Mutex::new(()),
                    timers: Timers::default(),
                }),
            }),
        }
    }

    fn inner(&self) -> &Arc<Inner> {
        &self.shared.inner
    }

    pub fn workshop_id(&self) -> &str {
        &self.inner().workshop_id
    }

    pub fn catalog(&self) -> &SessionCatalog {
        &self.inner().catalog
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner().config
    }

    /// Copy of the current roster.
    pub async fn roster(&self) -> Roster {
        self.inner().state.lock().await.roster.clone()
    }

    /// Mutate the roster and persist the result.
    ///
    /// `f` runs under the state lock. If it returns `Err` nothing is
    /// persisted, so `f` must leave the roster untouched on failure.
    pub async fn apply<T, E>(
        &self,
        f: impl FnOnce(&mut Roster, &SessionCatalog) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let inner = self.inner();
        let (value, push) = {
            let mut state = inner.state.lock().await;
            let value = f(&mut state.roster, &inner.catalog)?;
            state.revision += 1;
            inner.save_local(&state.roster);
            (value, inner.after_local_write(&mut state))
        };
        if push {
            inner.push_now().await;
        }
        Ok(value)
    }

    /// Persist the current roster without changing it.
    pub async fn persist(&self) {
        let inner = self.inner();
        let push = {
            let mut state = inner.state.lock().await;
            state.revision += 1;
            inner.save_local(&state.roster);
            inner.after_local_write(&mut state)
        };
        if push {
            inner.push_now().await;
        }
    }

    /// Probe now and, if the remote store is usable, push the full local
    /// roster whether or not it diverged.
    pub async fn force_sync(&self) -> Result<()> {
        let inner = self.inner();
        if inner.state.lock().await.shut_down {
            return Err(SyncError::Shutdown);
        }

        if let ProbeOutcome::Disconnected(kind) = inner.probe.probe().await {
            inner.state.lock().await.connected = false;
            tracing::warn!(%kind, "force sync: remote store unavailable");
            return Err(SyncError::Offline(kind));
        }
        inner.state.lock().await.connected = true;

        match inner.push_current().await {
            Ok(()) => {
                let mut state = inner.state.lock().await;
                state.advisory = Some(Advisory::Restored);
                tracing::info!("force sync pushed local roster");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "force sync write failed");
                let mut state = inner.state.lock().await;
                state.mark_dirty();
                if !state.retrying {
                    inner.ensure_reconnect(&mut state);
                }
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Compare local and remote now, pushing local if they differ.
    pub async fn reconcile(&self) -> Result<ReconcileReport> {
        let inner = self.inner();
        if inner.state.lock().await.shut_down {
            return Err(SyncError::Shutdown);
        }
        Ok(inner.reconcile_current().await?)
    }

    /// Run a probe without touching engine state.
    pub async fn probe(&self) -> ProbeOutcome {
        self.inner().probe.probe().await
    }

    /// Description of the remote endpoint.
    pub fn describe_remote(&self) -> String {
        self.inner().remote.describe()
    }

    pub async fn status(&self) -> SyncStatus {
        let state = self.inner().state.lock().await;
        SyncStatus {
            connected: state.connected,
            sync_required: state.sync_required,
            retry: state.retry,
            retrying: state.retrying,
            reconnect_scheduled: state.reconnect_scheduled,
            advisory: state.advisory,
            enrolled: state.roster.count(Bucket::Enrolled),
            queued: state.roster.count(Bucket::Queued),
            shut_down: state.shut_down,
        }
    }

    /// Cancel pending retries and reconnection. Later mutations are still
    /// written locally but never pushed.
    pub async fn shutdown(&self) {
        let inner = self.inner();
        let mut state = inner.state.lock().await;
        state.shut_down = true;
        state.retrying = false;
        state.reconnect_scheduled = false;
        inner.timers.cancel_all();
        tracing::debug!(workshop_id = %inner.workshop_id, "sync engine shut down");
    }
}

impl EngineState {
    fn mark_clean(&mut self) {
        self.connected = true;
        self.sync_required = false;
        self.retry.attempts = 0;
    }

    fn mark_dirty(&mut self) {
        self.connected = false;
        self.sync_required = true;
        self.advisory = Some(Advisory::SavedLocallyOnly);
    }
}

fn load_local(local: &dyn LocalStore, catalog: &SessionCatalog) -> Roster {
    match snapshot::load_roster(local, catalog) {
        Ok(loaded) => {
            if loaded.migrated() {
                tracing::info!("migrating legacy local snapshot to per-session format");
                if let Err(e) = snapshot::save_roster(local, &loaded.roster) {
                    tracing::warn!(error = %e, "failed to rewrite migrated local snapshot");
                }
            }
            loaded.roster
        }
        Err(e) => {
            tracing::error!(error = %e, "local snapshot unreadable, starting empty");
            Roster::empty(catalog)
        }
    }
}

impl Inner {
    fn save_local(&self, roster: &Roster) {
        if let Err(e) = snapshot::save_roster(&*self.local, roster) {
            tracing::error!(error = %e, "failed to write local snapshot");
        }
    }

    /// Decide what follows a local write. Returns whether to write remote.
    fn after_local_write(self: &Arc<Self>, state: &mut EngineState) -> bool {
        if state.shut_down {
            tracing::debug!("engine shut down, skipping remote write");
            return false;
        }
        if state.connected {
            return true;
        }

        state.sync_required = true;
        state.advisory = Some(Advisory::SavedLocallyOnly);
        // An active retry chain falls through to reconnection on its own.
        if !state.retrying {
            self.ensure_reconnect(state);
        }
        false
    }

    /// Write the current roster and return the revision that was written.
    async fn write_current(&self) -> RemoteResult<u64> {
        let _gate = self.remote_gate.lock().await;
        let (roster, revision) = {
            let state = self.state.lock().await;
            (state.roster.clone(), state.revision)
        };
        protocol::write_roster(&*self.remote, &self.workshop_id, &roster).await?;
        Ok(revision)
    }

    /// Write until the remote copy matches the latest local revision, then
    /// mark the engine clean.
    async fn push_current(&self) -> RemoteResult<()> {
        loop {
            let written = self.write_current().await?;
            let mut state = self.state.lock().await;
            if state.revision == written {
                state.mark_clean();
                return Ok(());
            }
            state.connected = true;
            tracing::debug!(
                written,
                current = state.revision,
                "roster changed during remote write, writing again"
            );
        }
    }

    async fn push_now(self: &Arc<Self>) {
        match self.push_current().await {
            Ok(()) => tracing::debug!("roster written to remote store"),
            Err(e) => {
                tracing::warn!(error = %e, "remote write failed, saved locally");
                let mut state = self.state.lock().await;
                state.mark_dirty();
                self.ensure_retry(&mut state);
            }
        }
    }

    async fn reconcile_current(&self) -> RemoteResult<ReconcileReport> {
        let mut report = {
            let _gate = self.remote_gate.lock().await;
            let (roster, revision) = {
                let state = self.state.lock().await;
                (state.roster.clone(), state.revision)
            };
            let report =
                reconcile::reconcile(&*self.remote, &self.workshop_id, &self.catalog, &roster)
                    .await?;

            let mut state = self.state.lock().await;
            if state.revision == revision {
                state.mark_clean();
                return Ok(report);
            }
            state.connected = true;
            report
        };

        tracing::debug!("roster changed during reconciliation, writing again");
        self.push_current().await?;
        report.pushed = true;
        Ok(report)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Retry chain
    // ─────────────────────────────────────────────────────────────────────

    fn ensure_retry(self: &Arc<Self>, state: &mut EngineState) {
        if state.retrying || state.shut_down {
            return;
        }
        state.retrying = true;
        let inner = Arc::clone(self);
        self.timers
            .install(TimerKind::Retry, tokio::spawn(inner.run_retry_chain()));
    }

    async fn run_retry_chain(self: Arc<Self>) {
        loop {
            let (attempt, delay) = {
                let mut state = self.state.lock().await;
                if state.shut_down || !state.sync_required {
                    state.retrying = false;
                    return;
                }
                if state.retry.attempts >= state.retry.max_attempts {
                    state.retrying = false;
                    state.advisory = Some(Advisory::OfflineWillSyncLater);
                    tracing::warn!(
                        attempts = state.retry.attempts,
                        "remote retries exhausted, waiting for reconnection"
                    );
                    self.ensure_reconnect(&mut state);
                    return;
                }
                state.retry.attempts += 1;
                let attempt = state.retry.attempts;
                (attempt, self.config.retry_delay(attempt))
            };

            tracing::debug!(attempt, ?delay, "scheduling remote write retry");
            tokio::time::sleep(delay).await;

            match self.push_current().await {
                Ok(()) => {
                    let mut state = self.state.lock().await;
                    state.retrying = false;
                    state.advisory = Some(Advisory::Restored);
                    tracing::info!(attempt, "remote write succeeded on retry");
                    return;
                }
                Err(e) => tracing::warn!(attempt, error = %e, "remote write retry failed"),
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Reconnection loop
    // ─────────────────────────────────────────────────────────────────────

    fn ensure_reconnect(self: &Arc<Self>, state: &mut EngineState) {
        if state.reconnect_scheduled || state.shut_down {
            return;
        }
        state.reconnect_scheduled = true;
        let inner = Arc::clone(self);
        self.timers
            .install(TimerKind::Reconnect, tokio::spawn(inner.run_reconnect_loop()));
    }

    async fn run_reconnect_loop(self: Arc<Self>) {
        loop {
            tokio::time::sleep(self.config.reconnect_interval).await;

            {
                let mut state = self.state.lock().await;
                if state.shut_down || !state.sync_required {
                    state.reconnect_scheduled = false;
                    return;
                }
            }

            match self.probe.probe().await {
                ProbeOutcome::Disconnected(kind) => {
                    self.state.lock().await.connected = false;
                    tracing::debug!(%kind, "still offline");
                }
                ProbeOutcome::Connected => {
                    {
                        let mut state = self.state.lock().await;
                        state.connected = true;
                        state.retry.attempts = 0;
                    }
                    match self.reconcile_current().await {
                        Ok(report) => {
                            let mut state = self.state.lock().await;
                            if !state.sync_required {
                                state.reconnect_scheduled = false;
                                state.advisory = Some(Advisory::Restored);
                                tracing::info!(
                                    pushed = report.pushed,
                                    diverged = report.diverged.len(),
                                    "reconnected and reconciled"
                                );
                                return;
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "reconciliation failed"),
                    }
                }
            }
        }
    }
}
