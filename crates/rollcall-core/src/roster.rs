//! The roster: enrolled and queued participants for every session.
//!
//! Invariants maintained by [`Roster::admit`]:
//! - `enrolled.len() <= capacity` for every session
//! - a participant is queued only if the session was full when it arrived
//! - names are unique per session after [`normalize_name`]
//!
//! There is no promotion from `queued` to `enrolled`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::ValidationError;
use crate::participant::{Bucket, Participant};
use crate::session::SessionCatalog;
use crate::types::SessionId;
use crate::validation::normalize_name;

/// Both buckets of one session, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRoster {
    pub enrolled: Vec<Participant>,
    pub queued: Vec<Participant>,
}

impl SessionRoster {
    pub fn bucket(&self, bucket: Bucket) -> &[Participant] {
        match bucket {
            Bucket::Enrolled => &self.enrolled,
            Bucket::Queued => &self.queued,
        }
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<Participant> {
        match bucket {
            Bucket::Enrolled => &mut self.enrolled,
            Bucket::Queued => &mut self.queued,
        }
    }

    /// Whether `name` is already present in either bucket.
    pub fn contains_name(&self, name: &str) -> bool {
        let key = normalize_name(name);
        self.enrolled
            .iter()
            .chain(self.queued.iter())
            .any(|p| normalize_name(&p.name) == key)
    }

    pub fn is_empty(&self) -> bool {
        self.enrolled.is_empty() && self.queued.is_empty()
    }
}

/// Where an admitted participant landed. Positions are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "bucket", rename_all = "lowercase")]
pub enum Placement {
    Enrolled { position: usize },
    Queued { position: usize },
}

impl Placement {
    pub fn bucket(&self) -> Bucket {
        match self {
            Placement::Enrolled { .. } => Bucket::Enrolled,
            Placement::Queued { .. } => Bucket::Queued,
        }
    }

    pub fn position(&self) -> usize {
        match self {
            Placement::Enrolled { position } | Placement::Queued { position } => *position,
        }
    }
}

/// Sessions whose membership differs between two rosters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub diverged: Vec<SessionId>,
}

impl MembershipDiff {
    pub fn is_empty(&self) -> bool {
        self.diverged.is_empty()
    }
}

/// Full enrollment state across all sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster {
    sessions: BTreeMap<SessionId, SessionRoster>,
}

impl Roster {
    /// An empty roster with one entry per configured session.
    pub fn empty(catalog: &SessionCatalog) -> Self {
        Self {
            sessions: catalog
                .ids()
                .map(|id| (id.clone(), SessionRoster::default()))
                .collect(),
        }
    }

    /// Build a roster from per-bucket maps. Sessions missing from the
    /// catalog are dropped; configured sessions missing from the maps are
    /// left empty.
    pub fn from_buckets(
        catalog: &SessionCatalog,
        enrolled: BTreeMap<SessionId, Vec<Participant>>,
        queued: BTreeMap<SessionId, Vec<Participant>>,
    ) -> Self {
        let mut roster = Self::empty(catalog);
        for (bucket, map) in [(Bucket::Enrolled, enrolled), (Bucket::Queued, queued)] {
            for (session, participants) in map {
                if let Some(entry) = roster.sessions.get_mut(&session) {
                    entry.bucket_mut(bucket).extend(participants);
                }
            }
        }
        roster
    }

    pub fn session(&self, id: &SessionId) -> Option<&SessionRoster> {
        self.sessions.get(id)
    }

    pub fn sessions(&self) -> impl Iterator<Item = (&SessionId, &SessionRoster)> {
        self.sessions.iter()
    }

    /// One bucket across all sessions, keyed by session.
    pub fn bucket_map(&self, bucket: Bucket) -> BTreeMap<SessionId, Vec<Participant>> {
        self.sessions
            .iter()
            .map(|(id, s)| (id.clone(), s.bucket(bucket).to_vec()))
            .collect()
    }

    /// Number of participants in a bucket across all sessions.
    pub fn count(&self, bucket: Bucket) -> usize {
        self.sessions.values().map(|s| s.bucket(bucket).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.values().all(SessionRoster::is_empty)
    }

    /// Append a participant to its session, honoring capacity and name
    /// uniqueness.
    pub fn admit(
        &mut self,
        catalog: &SessionCatalog,
        participant: Participant,
    ) -> Result<Placement, ValidationError> {
        let session_id = participant.session.clone();
        let capacity = catalog
            .capacity(&session_id)
            .ok_or_else(|| ValidationError::UnknownSession(session_id.clone()))?;

        let session = self.sessions.entry(session_id.clone()).or_default();
        if session.contains_name(&participant.name) {
            return Err(ValidationError::DuplicateName {
                name: participant.name,
                session: session_id,
            });
        }

        if session.enrolled.len() < capacity {
            session.enrolled.push(participant);
            Ok(Placement::Enrolled {
                position: session.enrolled.len(),
            })
        } else {
            session.queued.push(participant);
            Ok(Placement::Queued {
                position: session.queued.len(),
            })
        }
    }

    /// Reset every session to empty.
    pub fn clear(&mut self) {
        for session in self.sessions.values_mut() {
            session.enrolled.clear();
            session.queued.clear();
        }
    }

    /// Compare membership with another roster.
    ///
    /// Each bucket is compared as a set of `(name, session)` pairs plus its
    /// length, so ordering and timestamps are ignored.
    pub fn membership_diff(&self, other: &Roster, catalog: &SessionCatalog) -> MembershipDiff {
        let empty = SessionRoster::default();
        let diverged = catalog
            .ids()
            .filter(|id| {
                let mine = self.sessions.get(*id).unwrap_or(&empty);
                let theirs = other.sessions.get(*id).unwrap_or(&empty);
                Bucket::ALL.iter().any(|&bucket| {
                    !same_members(mine.bucket(bucket), theirs.bucket(bucket))
                })
            })
            .cloned()
            .collect();
        MembershipDiff { diverged }
    }
}

fn same_members(a: &[Participant], b: &[Participant]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let key = |p: &Participant| (p.name.clone(), p.session.clone());
    let left: HashSet<_> = a.iter().map(key).collect();
    let right: HashSet<_> = b.iter().map(key).collect();
    left == right
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionInfo;

    fn catalog() -> SessionCatalog {
        SessionCatalog::new(vec![SessionInfo::new("s1", 2), SessionInfo::new("s2", 1)]).unwrap()
    }

    fn person(name: &str, session: &str) -> Participant {
        Participant::new(name, SessionId::from(session))
    }

    #[test]
    fn test_admit_fills_then_queues() {
        let catalog = catalog();
        let mut roster = Roster::empty(&catalog);

        assert_eq!(
            roster.admit(&catalog, person("Ann", "s1")).unwrap(),
            Placement::Enrolled { position: 1 }
        );
        assert_eq!(
            roster.admit(&catalog, person("Bob", "s1")).unwrap(),
            Placement::Enrolled { position: 2 }
        );
        assert_eq!(
            roster.admit(&catalog, person("Cid", "s1")).unwrap(),
            Placement::Queued { position: 1 }
        );
        assert_eq!(
            roster.admit(&catalog, person("Dee", "s1")).unwrap(),
            Placement::Queued { position: 2 }
        );

        let s1 = roster.session(&"s1".into()).unwrap();
        assert_eq!(s1.enrolled.len(), 2);
        assert_eq!(s1.queued.len(), 2);
        assert_eq!(roster.count(Bucket::Enrolled), 2);
    }

    #[test]
    fn test_duplicate_names_are_per_session() {
        let catalog = catalog();
        let mut roster = Roster::empty(&catalog);

        roster.admit(&catalog, person("Ann Lee", "s1")).unwrap();
        let err = roster.admit(&catalog, person("  ann LEE ", "s1")).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateName { .. }));

        assert!(roster.admit(&catalog, person("Ann Lee", "s2")).is_ok());
    }

    #[test]
    fn test_duplicates_detected_in_queue() {
        let catalog = catalog();
        let mut roster = Roster::empty(&catalog);

        roster.admit(&catalog, person("Ann", "s2")).unwrap();
        roster.admit(&catalog, person("Bob", "s2")).unwrap();
        let err = roster.admit(&catalog, person("BOB", "s2")).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateName { .. }));
    }

    #[test]
    fn test_unknown_session_rejected() {
        let catalog = catalog();
        let mut roster = Roster::empty(&catalog);
        let err = roster.admit(&catalog, person("Ann", "s9")).unwrap_err();
        assert_eq!(err, ValidationError::UnknownSession("s9".into()));
    }

    #[test]
    fn test_clear_keeps_sessions() {
        let catalog = catalog();
        let mut roster = Roster::empty(&catalog);
        roster.admit(&catalog, person("Ann", "s1")).unwrap();
        roster.clear();
        assert!(roster.is_empty());
        assert!(roster.session(&"s1".into()).is_some());
        assert_eq!(roster, Roster::empty(&catalog));
    }

    #[test]
    fn test_membership_diff_ignores_order_and_ids() {
        let catalog = catalog();
        let mut a = Roster::empty(&catalog);
        let mut b = Roster::empty(&catalog);

        a.admit(&catalog, person("Ann", "s1")).unwrap();
        a.admit(&catalog, person("Bob", "s1")).unwrap();
        b.admit(&catalog, person("Bob", "s1")).unwrap();
        b.admit(&catalog, person("Ann", "s1")).unwrap();

        assert!(a.membership_diff(&b, &catalog).is_empty());

        b.admit(&catalog, person("Cid", "s1")).unwrap();
        let diff = a.membership_diff(&b, &catalog);
        assert_eq!(diff.diverged, vec![SessionId::from("s1")]);
    }

    #[test]
    fn test_membership_diff_counts_duplicates() {
        let catalog = catalog();
        let a = Roster::from_buckets(
            &catalog,
            BTreeMap::from([("s1".into(), vec![person("Ann", "s1")])]),
            BTreeMap::new(),
        );
        let b = Roster::from_buckets(
            &catalog,
            BTreeMap::from([("s1".into(), vec![person("Ann", "s1"), person("Ann", "s1")])]),
            BTreeMap::new(),
        );
        assert!(!a.membership_diff(&b, &catalog).is_empty());
    }

    #[test]
    fn test_from_buckets_drops_unknown_sessions() {
        let catalog = catalog();
        let roster = Roster::from_buckets(
            &catalog,
            BTreeMap::from([("s7".into(), vec![person("Ann", "s7")])]),
            BTreeMap::from([("s2".into(), vec![person("Bob", "s2")])]),
        );
        assert!(roster.session(&"s7".into()).is_none());
        assert_eq!(roster.session(&"s2".into()).unwrap().queued.len(), 1);
        assert_eq!(roster.session(&"s1".into()), Some(&SessionRoster::default()));
    }
}
