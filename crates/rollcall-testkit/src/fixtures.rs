//! Test fixtures and helpers.

use std::sync::Arc;

use rollcall::{Workshop, WorkshopConfig};
use rollcall_core::{SessionCatalog, SessionInfo};
use rollcall_store::{MemoryLocalStore, MemoryRemoteStore};

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Two sessions with room for two and one participants.
pub fn small_catalog() -> SessionCatalog {
    SessionCatalog::new(vec![
        SessionInfo::new("session1", 2),
        SessionInfo::new("session2", 1),
    ])
    .unwrap_or_default()
}

/// A workshop over in-memory stores.
pub struct TestFixture {
    pub workshop: Workshop,
    pub local: Arc<MemoryLocalStore>,
    pub remote: Arc<MemoryRemoteStore>,
}

impl TestFixture {
    /// Default configuration, remote online.
    pub async fn new() -> Self {
        Self::with_config(WorkshopConfig::default()).await
    }

    pub async fn with_config(config: WorkshopConfig) -> Self {
        Self::with_stores(
            config,
            Arc::new(MemoryLocalStore::new()),
            Arc::new(MemoryRemoteStore::new()),
        )
        .await
    }

    /// Start over existing stores, e.g. to simulate a restart.
    pub async fn with_stores(
        config: WorkshopConfig,
        local: Arc<MemoryLocalStore>,
        remote: Arc<MemoryRemoteStore>,
    ) -> Self {
        init_tracing();
        let workshop = Workshop::with_stores(config, local.clone(), remote.clone()).await;
        remote.clear_calls();
        Self {
            workshop,
            local,
            remote,
        }
    }

    /// Same stores, fresh workshop. The old workshop is shut down first.
    pub async fn restart(self, config: WorkshopConfig) -> Self {
        self.workshop.shutdown().await;
        Self::with_stores(config, self.local, self.remote).await
    }
}
