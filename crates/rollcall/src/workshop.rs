//! The Workshop: enrollment policy on top of the sync engine.
//!
//! Validation happens here; capacity and duplicate rules live on
//! [`Roster::admit`]; persistence is the engine's job.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;

use rollcall_core::{
    now_timestamp, validate_name, Bucket, Participant, Placement, Roster, SessionCatalog,
    SessionId, SessionInfo, ValidationError,
};
use rollcall_store::{LocalStore, RemoteStore, RestRemoteStore, SqliteLocalStore};
use rollcall_sync::{ProbeOutcome, SyncEngine, SyncStatus};
use serde::Serialize;

use crate::config::WorkshopConfig;
use crate::error::{Result, WorkshopError};

/// An accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    pub participant: Participant,
    pub placement: Placement,
}

impl Enrollment {
    /// Confirmation line for the submitter.
    pub fn message(&self) -> String {
        match self.placement {
            Placement::Enrolled { .. } => {
                format!("{} has been successfully enrolled!", self.participant.name)
            }
            Placement::Queued { position } => format!(
                "{} has been added to the queue (position #{position})",
                self.participant.name
            ),
        }
    }
}

/// Seat counts for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session: SessionInfo,
    pub enrolled: usize,
    pub queued: usize,
    pub capacity: usize,
    pub remaining: usize,
}

/// Full dump of the current roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSnapshot {
    pub enrolled: BTreeMap<SessionId, Vec<Participant>>,
    pub queued: BTreeMap<SessionId, Vec<Participant>>,
    pub export_date: String,
    pub environment: String,
}

impl ExportSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Result of [`Workshop::debug_connection`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionReport {
    pub outcome: ProbeOutcome,
    pub endpoint: String,
    pub workshop_id: String,
    pub environment: String,
    pub status: SyncStatus,
}

/// A workshop: sessions, a roster and the stores behind it.
#[derive(Clone)]
pub struct Workshop {
    engine: SyncEngine,
    environment: String,
}

impl Workshop {
    /// Build stores from `config` and start the engine.
    ///
    /// The local store is the SQLite file at `local_path`, so unsynced
    /// changes survive a restart. A remote store must be configured.
    pub async fn open(config: WorkshopConfig) -> Result<Self> {
        config.validate()?;

        let remote_config = config
            .remote
            .clone()
            .ok_or_else(|| WorkshopError::Config("no remote store configured".into()))?;
        let remote: Arc<dyn RemoteStore> = Arc::new(RestRemoteStore::new(remote_config)?);

        let local: Arc<dyn LocalStore> = Arc::new(SqliteLocalStore::open(&config.local_path)?);

        Ok(Self::with_stores(config, local, remote).await)
    }

    /// Start the engine over caller-provided stores.
    pub async fn with_stores(
        config: WorkshopConfig,
        local: Arc<dyn LocalStore>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        let sync = config.sync_config();
        tracing::info!(
            workshop_id = %config.workshop_id,
            environment = %config.environment,
            remote = %remote.describe(),
            "opening workshop"
        );
        let engine =
            SyncEngine::start(local, remote, config.workshop_id, config.sessions, sync).await;
        Self {
            engine,
            environment: config.environment,
        }
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn workshop_id(&self) -> &str {
        self.engine.workshop_id()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    // ─────────────────────────────────────────────────────────────────────
    // Enrollment
    // ─────────────────────────────────────────────────────────────────────

    /// Enroll `name` in `session`, or queue them if the session is full.
    pub async fn submit(&self, name: &str, session: impl Into<SessionId>) -> Result<Enrollment> {
        let name = validate_name(name)?;
        let session = session.into();
        if !self.sessions().contains(&session) {
            return Err(ValidationError::UnknownSession(session).into());
        }

        let participant = Participant::new(name, session);
        let admitted = participant.clone();
        let placement = self
            .engine
            .apply(move |roster, catalog| roster.admit(catalog, admitted))
            .await?;

        tracing::info!(
            name = %participant.name,
            session = %participant.session,
            bucket = %placement.bucket(),
            position = placement.position(),
            "submission accepted"
        );
        Ok(Enrollment {
            participant,
            placement,
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Admin
    // ─────────────────────────────────────────────────────────────────────

    /// Empty every session. The remote copy is emptied through the normal
    /// write path.
    pub async fn clear_all(&self) {
        let cleared = self
            .engine
            .apply(|roster, _| {
                roster.clear();
                Ok::<(), Infallible>(())
            })
            .await;
        match cleared {
            Ok(()) => tracing::warn!(workshop_id = %self.workshop_id(), "all enrollment data cleared"),
            Err(never) => match never {},
        }
    }

    /// Current roster, stamped with the export time and environment.
    pub async fn export_snapshot(&self) -> ExportSnapshot {
        let roster = self.engine.roster().await;
        ExportSnapshot {
            enrolled: roster.bucket_map(Bucket::Enrolled),
            queued: roster.bucket_map(Bucket::Queued),
            export_date: now_timestamp(),
            environment: self.environment.clone(),
        }
    }

    /// Probe now and push the whole local roster if the remote is usable.
    pub async fn force_sync(&self) -> Result<SyncStatus> {
        self.engine.force_sync().await?;
        Ok(self.engine.status().await)
    }

    pub async fn sync_status(&self) -> SyncStatus {
        self.engine.status().await
    }

    /// Probe the remote store without changing engine state.
    pub async fn debug_connection(&self) -> ConnectionReport {
        let outcome = self.engine.probe().await;
        tracing::info!(?outcome, endpoint = %self.engine.describe_remote(), "connection check");
        ConnectionReport {
            outcome,
            endpoint: self.engine.describe_remote(),
            workshop_id: self.workshop_id().to_string(),
            environment: self.environment.clone(),
            status: self.engine.status().await,
        }
    }

    /// Stop background retries and reconnection.
    pub async fn shutdown(&self) {
        self.engine.shutdown().await;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────

    pub async fn roster(&self) -> Roster {
        self.engine.roster().await
    }

    pub fn sessions(&self) -> &SessionCatalog {
        self.engine.catalog()
    }

    /// Seat counts for a session, or `None` if it is not configured.
    pub async fn session_summary(&self, session: &SessionId) -> Option<SessionSummary> {
        let info = self.sessions().get(session)?.clone();
        let roster = self.engine.roster().await;
        let (enrolled, queued) = roster
            .session(session)
            .map_or((0, 0), |s| (s.enrolled.len(), s.queued.len()));

        Some(SessionSummary {
            capacity: info.capacity,
            remaining: info.capacity.saturating_sub(enrolled),
            session: info,
            enrolled,
            queued,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_store::{MemoryLocalStore, MemoryRemoteStore, RestConfig};

    async fn workshop() -> (Workshop, Arc<MemoryRemoteStore>) {
        let remote = Arc::new(MemoryRemoteStore::new());
        let workshop = Workshop::with_stores(
            WorkshopConfig::default(),
            Arc::new(MemoryLocalStore::new()),
            remote.clone(),
        )
        .await;
        (workshop, remote)
    }

    #[tokio::test]
    async fn test_submit_trims_and_places() {
        let (workshop, _) = workshop().await;
        let enrollment = workshop.submit("  Zoë O'Neil ", "session1").await.unwrap();

        assert_eq!(enrollment.participant.name, "Zoë O'Neil");
        assert_eq!(enrollment.placement, Placement::Enrolled { position: 1 });
        assert_eq!(enrollment.message(), "Zoë O'Neil has been successfully enrolled!");
    }

    #[tokio::test]
    async fn test_submit_rejections() {
        let (workshop, remote) = workshop().await;
        workshop.submit("Ann", "session1").await.unwrap();
        remote.clear_calls();

        assert!(matches!(
            workshop.submit("A", "session1").await,
            Err(WorkshopError::Validation(ValidationError::InvalidName(_)))
        ));
        assert!(matches!(
            workshop.submit("R2D2", "session1").await,
            Err(WorkshopError::Validation(ValidationError::InvalidName(_)))
        ));
        assert!(matches!(
            workshop.submit("Ann", "session9").await,
            Err(WorkshopError::Validation(ValidationError::UnknownSession(_)))
        ));
        assert!(matches!(
            workshop.submit(" aNN ", "session1").await,
            Err(WorkshopError::Validation(ValidationError::DuplicateName { .. }))
        ));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_session_summary() {
        let (workshop, _) = workshop().await;
        workshop.submit("Ann", "session2").await.unwrap();

        let summary = workshop.session_summary(&"session2".into()).await.unwrap();
        assert_eq!(summary.enrolled, 1);
        assert_eq!(summary.queued, 0);
        assert_eq!(summary.capacity, 8);
        assert_eq!(summary.remaining, 7);
        assert!(workshop.session_summary(&"nope".into()).await.is_none());
    }

    #[tokio::test]
    async fn test_export_snapshot_json() {
        let (workshop, _) = workshop().await;
        workshop.submit("Ann", "session1").await.unwrap();

        let snapshot = workshop.export_snapshot().await;
        assert_eq!(snapshot.environment, "development");
        assert_eq!(snapshot.enrolled[&SessionId::from("session1")].len(), 1);

        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["enrolled"]["session1"][0]["name"], "Ann");
        assert!(json["queued"]["session2"].as_array().unwrap().is_empty());
        assert!(json["export_date"].is_string());
    }

    #[tokio::test]
    async fn test_clear_all_empties_both_stores() {
        let (workshop, remote) = workshop().await;
        workshop.submit("Ann", "session1").await.unwrap();
        workshop.submit("Bob", "session2").await.unwrap();
        assert_eq!(remote.rows().len(), 2);

        workshop.clear_all().await;
        assert!(workshop.roster().await.is_empty());
        assert!(remote.rows().is_empty());
    }

    #[tokio::test]
    async fn test_debug_connection_reports_endpoint() {
        let (workshop, remote) = workshop().await;
        remote.set_ping_status(Some(401));

        let report = workshop.debug_connection().await;
        assert_eq!(
            report.outcome,
            ProbeOutcome::Disconnected(rollcall_sync::ErrorKind::Auth)
        );
        assert_eq!(report.endpoint, "memory");
        assert!(report.status.connected);
    }

    #[tokio::test]
    async fn test_open_requires_remote() {
        assert!(matches!(
            Workshop::open(WorkshopConfig::default()).await,
            Err(WorkshopError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_open_keeps_offline_changes_across_restart() {
        let dir = tempfile::tempdir().unwrap();
        let mut remote = RestConfig::new("http://127.0.0.1:9", "anon");
        remote.timeout_secs = 1;
        let mut config = WorkshopConfig {
            remote: Some(remote),
            local_path: dir.path().join("state").join("rollcall.db"),
            ..WorkshopConfig::default()
        };
        config.sync.probe_timeout_secs = 1;

        let workshop = Workshop::open(config.clone()).await.unwrap();
        assert!(!workshop.sync_status().await.connected);
        workshop.submit("Ann", "session1").await.unwrap();
        workshop.shutdown().await;
        drop(workshop);

        let reopened = Workshop::open(config).await.unwrap();
        let summary = reopened.session_summary(&"session1".into()).await.unwrap();
        assert_eq!(summary.enrolled, 1);
        assert_eq!(reopened.roster().await.count(Bucket::Enrolled), 1);
        reopened.shutdown().await;
    }
}
