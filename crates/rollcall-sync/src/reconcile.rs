//! Post-reconnect reconciliation.
//!
//! Local state always wins. The remote roster is compared with the local
//! one session by session; if any bucket differs in membership, both remote
//! buckets are overwritten from local. Equal rosters cost one read and no
//! writes.

use rollcall_core::{Roster, SessionCatalog, SessionId};
use rollcall_store::{RemoteResult, RemoteStore};
use serde::Serialize;

use crate::protocol;

/// Outcome of a reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Sessions whose remote membership differed from local.
    pub diverged: Vec<SessionId>,
    /// Whether the local roster was pushed to the remote store.
    pub pushed: bool,
}

impl ReconcileReport {
    pub fn in_sync(&self) -> bool {
        self.diverged.is_empty()
    }
}

/// Compare `local` with the remote copy and repair the remote if needed.
pub async fn reconcile(
    remote: &dyn RemoteStore,
    workshop_id: &str,
    catalog: &SessionCatalog,
    local: &Roster,
) -> RemoteResult<ReconcileReport> {
    let remote_roster = protocol::load_roster(remote, workshop_id, catalog).await?;
    let diff = local.membership_diff(&remote_roster, catalog);

    if diff.is_empty() {
        tracing::debug!(workshop_id, "remote roster matches local");
        return Ok(ReconcileReport::default());
    }

    tracing::info!(
        workshop_id,
        diverged = ?diff.diverged,
        "remote roster diverged, pushing local copy"
    );
    protocol::write_roster(remote, workshop_id, local).await?;

    Ok(ReconcileReport {
        diverged: diff.diverged,
        pushed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_core::Participant;
    use rollcall_store::MemoryRemoteStore;

    fn setup() -> (SessionCatalog, Roster, MemoryRemoteStore) {
        let catalog = SessionCatalog::default();
        let mut roster = Roster::empty(&catalog);
        roster
            .admit(&catalog, Participant::new("Ann", "session1".into()))
            .unwrap();
        roster
            .admit(&catalog, Participant::new("Bob", "session2".into()))
            .unwrap();
        (catalog, roster, MemoryRemoteStore::new())
    }

    #[tokio::test]
    async fn test_divergent_remote_is_overwritten() {
        let (catalog, local, remote) = setup();

        let report = reconcile(&remote, "ws", &catalog, &local).await.unwrap();
        assert!(report.pushed);
        assert_eq!(
            report.diverged,
            vec![SessionId::from("session1"), SessionId::from("session2")]
        );

        let remote_roster = protocol::load_roster(&remote, "ws", &catalog).await.unwrap();
        assert!(local.membership_diff(&remote_roster, &catalog).is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (catalog, local, remote) = setup();

        reconcile(&remote, "ws", &catalog, &local).await.unwrap();
        let writes = remote.write_calls();

        let second = reconcile(&remote, "ws", &catalog, &local).await.unwrap();
        assert!(second.in_sync());
        assert!(!second.pushed);
        assert_eq!(remote.write_calls(), writes);
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let (catalog, local, remote) = setup();
        remote.set_online(false);
        assert!(reconcile(&remote, "ws", &catalog, &local).await.is_err());
        assert_eq!(remote.write_calls(), 0);
    }
}
