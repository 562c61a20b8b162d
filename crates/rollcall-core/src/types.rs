//! Strong type definitions for Rollcall.
//!
//! Identifiers are newtypes over strings so participant and session ids
//! cannot be swapped by accident.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Identifier of a participant, generated client-side.
///
/// The id is the current time in milliseconds rendered in base 36, followed
/// by a random base-36 suffix. Collisions are improbable, not impossible.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Length of the random suffix appended to the time component.
    const RANDOM_LEN: usize = 11;

    /// Generate a fresh id from the wall clock and thread-local randomness.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut rng = rand::thread_rng();
        let suffix: String = (0..Self::RANDOM_LEN)
            .map(|_| base36_digit(rng.gen_range(0..36)))
            .collect();
        Self(format!("{}{}", to_base36(millis), suffix))
    }

    /// Wrap an existing id (e.g. one loaded from storage).
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a configured workshop session, e.g. `session1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn base36_digit(n: u32) -> char {
    char::from_digit(n, 36).unwrap_or('0')
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(base36_digit((n % 36) as u32));
        n /= 36;
    }
    digits.iter().rev().collect()
}
