//! Flat record shape exchanged with remote stores.
//!
//! A remote store holds one row per participant, tagged with the workshop,
//! the bucket (`status`) and the session. Converting a roster bucket to rows
//! flattens the per-session lists; converting rows back groups them again.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::participant::{Bucket, Participant};
use crate::roster::Roster;
use crate::session::SessionCatalog;
use crate::types::{ParticipantId, SessionId};

/// One participant row in a remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub workshop_id: String,
    pub name: String,
    /// Bucket name; kept as a string so unknown values survive a round trip.
    pub status: String,
    pub timestamp: String,
    pub participant_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ParticipantRecord {
    pub fn from_participant(workshop_id: &str, bucket: Bucket, participant: &Participant) -> Self {
        Self {
            workshop_id: workshop_id.to_string(),
            name: participant.name.clone(),
            status: bucket.as_str().to_string(),
            timestamp: participant.timestamp.clone(),
            participant_id: participant.id.as_str().to_string(),
            session_id: Some(participant.session.as_str().to_string()),
        }
    }

    pub fn bucket(&self) -> Option<Bucket> {
        Bucket::parse(&self.status)
    }
}

/// Row selection used by `select` and `delete`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFilter {
    pub workshop_id: String,
    pub status: Option<Bucket>,
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Every row of a workshop.
    pub fn workshop(workshop_id: impl Into<String>) -> Self {
        Self {
            workshop_id: workshop_id.into(),
            status: None,
            limit: None,
        }
    }

    pub fn with_status(mut self, status: Bucket) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, record: &ParticipantRecord) -> bool {
        record.workshop_id == self.workshop_id
            && self
                .status
                .map_or(true, |status| record.status == status.as_str())
    }
}

impl Roster {
    /// Flatten one bucket into remote rows.
    ///
    /// Rows are tagged with the participant's own session, or the map key if
    /// the participant's session is blank.
    pub fn to_records(&self, workshop_id: &str, bucket: Bucket) -> Vec<ParticipantRecord> {
        self.sessions()
            .flat_map(|(session_id, session)| {
                session.bucket(bucket).iter().map(move |p| {
                    let mut record = ParticipantRecord::from_participant(workshop_id, bucket, p);
                    if p.session.as_str().is_empty() {
                        record.session_id = Some(session_id.as_str().to_string());
                    }
                    record
                })
            })
            .collect()
    }

    /// Group remote rows into a roster.
    ///
    /// Rows without a session go to the catalog's default session. Rows for
    /// unknown sessions or with an unknown status are dropped. Row order is
    /// preserved within each bucket.
    pub fn from_records(catalog: &SessionCatalog, records: &[ParticipantRecord]) -> Self {
        let mut enrolled: BTreeMap<SessionId, Vec<Participant>> = BTreeMap::new();
        let mut queued: BTreeMap<SessionId, Vec<Participant>> = BTreeMap::new();

        for record in records {
            let session = record
                .session_id
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(SessionId::from)
                .unwrap_or_else(|| catalog.default_session().clone());

            let participant = Participant {
                id: ParticipantId::new(record.participant_id.clone()),
                name: record.name.clone(),
                timestamp: record.timestamp.clone(),
                session: session.clone(),
            };

            match record.bucket() {
                Some(Bucket::Enrolled) => enrolled.entry(session).or_default().push(participant),
                Some(Bucket::Queued) => queued.entry(session).or_default().push(participant),
                None => {}
            }
        }

        Roster::from_buckets(catalog, enrolled, queued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, status: &str, session: Option<&str>) -> ParticipantRecord {
        ParticipantRecord {
            workshop_id: "w".into(),
            name: name.into(),
            status: status.into(),
            timestamp: "2026-01-01T00:00:00.000Z".into(),
            participant_id: format!("id-{name}"),
            session_id: session.map(String::from),
        }
    }

    #[test]
    fn test_from_records_groups_by_session_and_status() {
        let catalog = SessionCatalog::default();
        let roster = Roster::from_records(
            &catalog,
            &[
                record("Ann", "enrolled", Some("session1")),
                record("Bob", "queued", Some("session2")),
                record("Cid", "enrolled", None),
                record("Dee", "enrolled", Some("session9")),
                record("Eve", "waitlist", Some("session1")),
            ],
        );

        let s1 = roster.session(&"session1".into()).unwrap();
        let names: Vec<_> = s1.enrolled.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Ann", "Cid"]);
        assert_eq!(s1.enrolled[1].session.as_str(), "session1");
        assert!(s1.queued.is_empty());

        let s2 = roster.session(&"session2".into()).unwrap();
        assert_eq!(s2.queued[0].name, "Bob");
        assert_eq!(roster.count(Bucket::Enrolled), 2);
    }

    #[test]
    fn test_to_records_tags_bucket_and_session() {
        let catalog = SessionCatalog::default();
        let mut roster = Roster::empty(&catalog);
        roster
            .admit(&catalog, Participant::new("Ann", "session2".into()))
            .unwrap();

        let rows = roster.to_records("ws-1", Bucket::Enrolled);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].workshop_id, "ws-1");
        assert_eq!(rows[0].status, "enrolled");
        assert_eq!(rows[0].session_id.as_deref(), Some("session2"));

        assert!(roster.to_records("ws-1", Bucket::Queued).is_empty());
    }

    #[test]
    fn test_filter_matches() {
        let filter = RecordFilter::workshop("w").with_status(Bucket::Queued);
        assert!(filter.matches(&record("Ann", "queued", None)));
        assert!(!filter.matches(&record("Ann", "enrolled", None)));
        assert!(RecordFilter::workshop("w").matches(&record("Ann", "enrolled", None)));
        assert!(!RecordFilter::workshop("x").matches(&record("Ann", "enrolled", None)));
    }
}
