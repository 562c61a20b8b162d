//! Workshop sessions: fixed, pre-configured time slots.

use serde::{Deserialize, Serialize};

use crate::types::SessionId;

/// Default capacity of a session.
pub const DEFAULT_CAPACITY: usize = 8;

/// Static metadata for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub id: SessionId,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub location: String,
    pub capacity: usize,
}

impl SessionInfo {
    pub fn new(id: impl Into<SessionId>, capacity: usize) -> Self {
        Self {
            id: id.into(),
            date: String::new(),
            time: String::new(),
            location: String::new(),
            capacity,
        }
    }
}

/// The ordered set of sessions for a workshop.
///
/// The first session is the default session: data that predates per-session
/// storage, or remote rows without a session, is attributed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SessionInfo>", into = "Vec<SessionInfo>")]
pub struct SessionCatalog {
    sessions: Vec<SessionInfo>,
}

impl SessionCatalog {
    /// Build a catalog. Returns `None` if empty or if ids repeat.
    pub fn new(sessions: Vec<SessionInfo>) -> Option<Self> {
        if sessions.is_empty() {
            return None;
        }
        for (i, s) in sessions.iter().enumerate() {
            if sessions[..i].iter().any(|other| other.id == s.id) {
                return None;
            }
        }
        Some(Self { sessions })
    }

    pub fn get(&self, id: &SessionId) -> Option<&SessionInfo> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.get(id).is_some()
    }

    pub fn capacity(&self, id: &SessionId) -> Option<usize> {
        self.get(id).map(|s| s.capacity)
    }

    pub fn default_session(&self) -> &SessionId {
        &self.sessions[0].id
    }

    pub fn ids(&self) -> impl Iterator<Item = &SessionId> {
        self.sessions.iter().map(|s| &s.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionInfo> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl TryFrom<Vec<SessionInfo>> for SessionCatalog {
    type Error = String;

    fn try_from(sessions: Vec<SessionInfo>) -> Result<Self, Self::Error> {
        Self::new(sessions)
            .ok_or_else(|| "session list must be non-empty with unique ids".to_string())
    }
}

impl From<SessionCatalog> for Vec<SessionInfo> {
    fn from(catalog: SessionCatalog) -> Self {
        catalog.sessions
    }
}

impl Default for SessionCatalog {
    fn default() -> Self {
        Self {
            sessions: vec![
                SessionInfo::new("session1", DEFAULT_CAPACITY),
                SessionInfo::new("session2", DEFAULT_CAPACITY),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog() {
        let catalog = SessionCatalog::default();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.default_session().as_str(), "session1");
        assert_eq!(catalog.capacity(&"session2".into()), Some(8));
        assert!(!catalog.contains(&"session3".into()));
    }

    #[test]
    fn test_catalog_rejects_empty_and_duplicates() {
        assert!(SessionCatalog::new(vec![]).is_none());
        assert!(SessionCatalog::new(vec![
            SessionInfo::new("a", 1),
            SessionInfo::new("a", 2),
        ])
        .is_none());
    }

    #[test]
    fn test_catalog_deserializes_from_list() {
        let json = r#"[{"id":"morning","capacity":4,"location":"Room 1"}]"#;
        let catalog: SessionCatalog = serde_json::from_str(json).unwrap();
        let info = catalog.get(&"morning".into()).unwrap();
        assert_eq!(info.capacity, 4);
        assert_eq!(info.location, "Room 1");
        assert_eq!(info.date, "");

        assert!(serde_json::from_str::<SessionCatalog>("[]").is_err());
    }
}
