//! Roster snapshots in the local store.
//!
//! A roster is kept under two keys, one per bucket. Each value is a JSON
//! object mapping session id to the participants of that bucket:
//!
//! ```json
//! { "session1": [{ "id": "…", "name": "Ann", "timestamp": "…", "session": "session1" }],
//!   "session2": [] }
//! ```
//!
//! Older installations stored a flat array per key with no session field.
//! Loading accepts both shapes; a flat array is assigned wholesale to the
//! default session and reported as [`SnapshotFormat::Legacy`] so the caller
//! can rewrite it in the current shape.

use std::collections::BTreeMap;

use rollcall_core::{Bucket, Participant, ParticipantId, Roster, SessionCatalog, SessionId};
use serde::Deserialize;

use crate::error::Result;
use crate::local::LocalStore;

/// Key holding the enrolled bucket.
pub const ENROLLED_KEY: &str = "workshop-enrolled";

/// Key holding the queued bucket.
pub const QUEUED_KEY: &str = "workshop-queued";

/// Local key for a bucket.
pub fn key_for(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Enrolled => ENROLLED_KEY,
        Bucket::Queued => QUEUED_KEY,
    }
}

/// Shape of the data found in the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SnapshotFormat {
    /// Nothing stored yet.
    Missing,
    /// Per-session maps.
    Sessions,
    /// At least one bucket was a flat array.
    Legacy,
}

/// Result of [`load_roster`].
#[derive(Debug, Clone)]
pub struct LoadedRoster {
    pub roster: Roster,
    pub format: SnapshotFormat,
}

impl LoadedRoster {
    /// Whether the stored data should be rewritten in the current shape.
    pub fn migrated(&self) -> bool {
        self.format == SnapshotFormat::Legacy
    }
}

#[derive(Deserialize)]
struct StoredParticipant {
    id: ParticipantId,
    name: String,
    timestamp: String,
    #[serde(default)]
    session: Option<SessionId>,
}

impl StoredParticipant {
    fn into_participant(self, fallback: &SessionId) -> Participant {
        Participant {
            id: self.id,
            name: self.name,
            timestamp: self.timestamp,
            session: self.session.unwrap_or_else(|| fallback.clone()),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredBucket {
    Sessions(BTreeMap<SessionId, Vec<StoredParticipant>>),
    Legacy(Vec<StoredParticipant>),
}

fn decode_bucket(
    raw: &str,
    catalog: &SessionCatalog,
) -> Result<(BTreeMap<SessionId, Vec<Participant>>, SnapshotFormat)> {
    let stored: StoredBucket = serde_json::from_str(raw)?;
    Ok(match stored {
        StoredBucket::Sessions(map) => {
            let map = map
                .into_iter()
                .map(|(session, list)| {
                    let participants = list
                        .into_iter()
                        .map(|p| p.into_participant(&session))
                        .collect();
                    (session, participants)
                })
                .collect();
            (map, SnapshotFormat::Sessions)
        }
        StoredBucket::Legacy(list) => {
            let default = catalog.default_session().clone();
            let participants = list
                .into_iter()
                .map(|p| Participant {
                    session: default.clone(),
                    ..p.into_participant(&default)
                })
                .collect();
            (
                BTreeMap::from([(default, participants)]),
                SnapshotFormat::Legacy,
            )
        }
    })
}

/// Read both buckets from the local store.
///
/// Missing keys load as empty buckets. Sessions not in `catalog` are
/// dropped.
pub fn load_roster<L: LocalStore + ?Sized>(
    local: &L,
    catalog: &SessionCatalog,
) -> Result<LoadedRoster> {
    let mut format = SnapshotFormat::Missing;
    let mut buckets = BTreeMap::new();

    for bucket in Bucket::ALL {
        let map = match local.get(key_for(bucket))? {
            Some(raw) => {
                let (map, found) = decode_bucket(&raw, catalog)?;
                format = format.max(found);
                map
            }
            None => BTreeMap::new(),
        };
        buckets.insert(bucket, map);
    }

    let enrolled = buckets.remove(&Bucket::Enrolled).unwrap_or_default();
    let queued = buckets.remove(&Bucket::Queued).unwrap_or_default();
    Ok(LoadedRoster {
        roster: Roster::from_buckets(catalog, enrolled, queued),
        format,
    })
}

/// Write both buckets to the local store, enrolled first.
pub fn save_roster<L: LocalStore + ?Sized>(local: &L, roster: &Roster) -> Result<()> {
    for bucket in Bucket::ALL {
        let encoded = serde_json::to_string(&roster.bucket_map(bucket))?;
        local.set(key_for(bucket), &encoded)?;
    }
    Ok(())
}
