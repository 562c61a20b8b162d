//! Workshop configuration.
//!
//! Everything has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! {
//!   "workshop_id": "ai-dev-jumpstart-2026",
//!   "environment": "production",
//!   "sessions": [
//!     { "id": "session1", "date": "March 4", "time": "9:00", "location": "Room A", "capacity": 8 },
//!     { "id": "session2", "capacity": 8 }
//!   ],
//!   "sync": { "retry_base_secs": 1, "max_attempts": 3, "reconnect_interval_secs": 30, "probe_timeout_secs": 10 },
//!   "remote": { "url": "https://abc.supabase.co", "api_key": "…" },
//!   "local_path": "rollcall.db"
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use rollcall_core::SessionCatalog;
use rollcall_store::RestConfig;
use rollcall_sync::SyncConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkshopError};

/// Workshop identifier used when none is configured.
pub const DEFAULT_WORKSHOP_ID: &str = "ai-dev-jumpstart-2026";

/// SQLite file used for the local store when none is configured.
pub const DEFAULT_LOCAL_PATH: &str = "rollcall.db";

/// Engine timing, in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub retry_base_secs: u64,
    pub max_attempts: u32,
    pub reconnect_interval_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        let defaults = SyncConfig::default();
        Self {
            retry_base_secs: defaults.retry_base.as_secs(),
            max_attempts: defaults.max_attempts,
            reconnect_interval_secs: defaults.reconnect_interval.as_secs(),
            probe_timeout_secs: defaults.probe_timeout.as_secs(),
        }
    }
}

impl From<&SyncSettings> for SyncConfig {
    fn from(s: &SyncSettings) -> Self {
        SyncConfig {
            retry_base: Duration::from_secs(s.retry_base_secs),
            max_attempts: s.max_attempts,
            reconnect_interval: Duration::from_secs(s.reconnect_interval_secs),
            probe_timeout: Duration::from_secs(s.probe_timeout_secs),
        }
    }
}

/// Configuration for a [`crate::Workshop`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    /// Scopes every remote row.
    pub workshop_id: String,
    /// Free-form label carried into exports.
    pub environment: String,
    pub sessions: SessionCatalog,
    pub sync: SyncSettings,
    /// Remote store; required by [`crate::Workshop::open`].
    pub remote: Option<RestConfig>,
    /// SQLite file backing the local store in [`crate::Workshop::open`].
    pub local_path: PathBuf,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            workshop_id: DEFAULT_WORKSHOP_ID.to_string(),
            environment: "development".to_string(),
            sessions: SessionCatalog::default(),
            sync: SyncSettings::default(),
            remote: None,
            local_path: PathBuf::from(DEFAULT_LOCAL_PATH),
        }
    }
}

impl WorkshopConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| WorkshopError::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            WorkshopError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workshop_id.trim().is_empty() {
            return Err(WorkshopError::Config("workshop_id must not be empty".into()));
        }
        if self.sync.reconnect_interval_secs == 0 {
            return Err(WorkshopError::Config(
                "sync.reconnect_interval_secs must be positive".into(),
            ));
        }
        if self.local_path.as_os_str().is_empty() {
            return Err(WorkshopError::Config("local_path must not be empty".into()));
        }
        if let Some(remote) = &self.remote {
            if remote.url.trim().is_empty() {
                return Err(WorkshopError::Config("remote.url must not be empty".into()));
            }
        }
        Ok(())
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig::from(&self.sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = WorkshopConfig::from_json_str("{}").unwrap();
        assert_eq!(config, WorkshopConfig::default());
        assert_eq!(config.sync_config(), SyncConfig::default());
        assert_eq!(config.local_path, PathBuf::from("rollcall.db"));
    }

    #[test]
    fn test_full_config() {
        let config = WorkshopConfig::from_json_str(
            r#"{
                "workshop_id": "rust-101",
                "environment": "staging",
                "sessions": [{"id": "morning", "capacity": 2}, {"id": "evening", "capacity": 3}],
                "sync": {"max_attempts": 5},
                "remote": {"url": "https://abc.supabase.co", "api_key": "anon"}
            }"#,
        )
        .unwrap();

        assert_eq!(config.workshop_id, "rust-101");
        assert_eq!(config.sessions.default_session().as_str(), "morning");
        assert_eq!(config.sessions.capacity(&"evening".into()), Some(3));
        assert_eq!(config.sync.max_attempts, 5);
        assert_eq!(config.sync.reconnect_interval_secs, 30);
        assert_eq!(config.remote.unwrap().table, "participants");
    }

    #[test]
    fn test_invalid_configs() {
        for json in [
            r#"{"workshop_id": "  "}"#,
            r#"{"sessions": []}"#,
            r#"{"sync": {"reconnect_interval_secs": 0}}"#,
            r#"{"remote": {"url": "", "api_key": "k"}}"#,
            r#"{"local_path": ""}"#,
            "not json",
        ] {
            assert!(
                matches!(WorkshopConfig::from_json_str(json), Err(WorkshopError::Config(_))),
                "{json}"
            );
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollcall.json");
        std::fs::write(&path, r#"{"environment": "production"}"#).unwrap();

        assert_eq!(WorkshopConfig::load(&path).unwrap().environment, "production");
        assert!(WorkshopConfig::load(dir.path().join("missing.json")).is_err());
    }
}
