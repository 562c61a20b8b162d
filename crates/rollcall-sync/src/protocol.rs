//! Roster <-> remote record store.
//!
//! Writing replaces a bucket wholesale: delete every row of
//! `(workshop, status)`, then insert the current rows. The two phases are
//! not atomic. A failure between them leaves the remote bucket empty or
//! stale until the next successful write; the local store keeps the
//! authoritative copy.

use rollcall_core::{Bucket, RecordFilter, Roster, SessionCatalog};
use rollcall_store::{RemoteResult, RemoteStore};

/// Replace one bucket of a workshop on the remote store.
pub async fn write_bucket(
    remote: &dyn RemoteStore,
    workshop_id: &str,
    roster: &Roster,
    bucket: Bucket,
) -> RemoteResult<()> {
    remote
        .delete(&RecordFilter::workshop(workshop_id).with_status(bucket))
        .await?;

    let records = roster.to_records(workshop_id, bucket);
    if !records.is_empty() {
        remote.insert(&records).await?;
    }
    Ok(())
}

/// Replace both buckets, enrolled first.
pub async fn write_roster(
    remote: &dyn RemoteStore,
    workshop_id: &str,
    roster: &Roster,
) -> RemoteResult<()> {
    for bucket in Bucket::ALL {
        write_bucket(remote, workshop_id, roster, bucket).await?;
    }
    Ok(())
}

/// Load a workshop's roster from the remote store.
pub async fn load_roster(
    remote: &dyn RemoteStore,
    workshop_id: &str,
    catalog: &SessionCatalog,
) -> RemoteResult<Roster> {
    let records = remote.select(&RecordFilter::workshop(workshop_id)).await?;
    Ok(Roster::from_records(catalog, &records))
}
