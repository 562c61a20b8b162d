//! Participants and the two buckets they can land in.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{ParticipantId, SessionId};

/// A single enrollment.
///
/// Identity is `id`; `name` is stored exactly as submitted after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub name: String,
    /// ISO-8601 creation time, UTC.
    pub timestamp: String,
    pub session: SessionId,
}

impl Participant {
    /// Create a participant with a fresh id and the current time.
    pub fn new(name: impl Into<String>, session: SessionId) -> Self {
        Self {
            id: ParticipantId::generate(),
            name: name.into(),
            timestamp: now_timestamp(),
            session,
        }
    }
}

/// Which list of a session a participant belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Enrolled,
    Queued,
}

impl Bucket {
    /// Both buckets, in the order they are written to remote stores.
    pub const ALL: [Bucket; 2] = [Bucket::Enrolled, Bucket::Queued];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Enrolled => "enrolled",
            Bucket::Queued => "queued",
        }
    }

    /// Parse the wire name of a bucket. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "enrolled" => Some(Bucket::Enrolled),
            "queued" => Some(Bucket::Queued),
            _ => None,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current UTC time as an ISO-8601 string with millisecond precision.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
