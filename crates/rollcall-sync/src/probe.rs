//! Remote reachability and credential checks.
//!
//! A probe is two steps, each bounded by the probe timeout:
//!
//! 1. `ping` the endpoint. A timeout or a refusal ends the probe; a
//!    network-level failure is inconclusive (browsers and proxies report
//!    CORS rejections the same way) and falls through to step 2.
//! 2. `select` one row of the workshop and classify the outcome.
//!
//! Classification is deliberately lenient: anything we do not recognise as
//! an auth or network failure counts as connected. A store whose table is
//! missing is reachable, just not provisioned.

use std::sync::Arc;
use std::time::Duration;

use rollcall_core::RecordFilter;
use rollcall_store::{Reachability, RemoteError, RemoteStore};
use serde::Serialize;

use crate::error::ErrorKind;

/// Result of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "error", rename_all = "lowercase")]
pub enum ProbeOutcome {
    Connected,
    Disconnected(ErrorKind),
}

impl ProbeOutcome {
    pub fn is_connected(&self) -> bool {
        matches!(self, ProbeOutcome::Connected)
    }
}

/// Codes and messages meaning "reachable, but the schema is not there".
const SCHEMA_CODES: &[&str] = &["PGRST116", "42P01"];
const SCHEMA_MESSAGES: &[&str] = &["does not exist", "permission denied", "relation"];

const AUTH_CODES: &[&str] = &["401", "PGRST301"];
const AUTH_MESSAGES: &[&str] = &["Invalid API key", "JWT"];

const NETWORK_CODES: &[&str] = &["PGRST000"];
const NETWORK_MESSAGES: &[&str] = &["Failed to fetch", "Network"];

/// Classify a failed probe query.
pub fn classify_query_error(error: &RemoteError) -> ProbeOutcome {
    let (status, code, message) = match error {
        RemoteError::Timeout => return ProbeOutcome::Disconnected(ErrorKind::Timeout),
        RemoteError::Network(_) => return ProbeOutcome::Disconnected(ErrorKind::Network),
        RemoteError::Api {
            status,
            code,
            message,
            ..
        } => (*status, code.as_str(), message.as_str()),
        RemoteError::Transport(message) | RemoteError::Decode(message) => {
            (None, "", message.as_str())
        }
    };

    let has_code = |codes: &[&str]| codes.contains(&code);
    let mentions = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    if has_code(SCHEMA_CODES) || mentions(SCHEMA_MESSAGES) {
        ProbeOutcome::Connected
    } else if status == Some(401) || has_code(AUTH_CODES) || mentions(AUTH_MESSAGES) {
        ProbeOutcome::Disconnected(ErrorKind::Auth)
    } else if has_code(NETWORK_CODES) || mentions(NETWORK_MESSAGES) {
        ProbeOutcome::Disconnected(ErrorKind::Network)
    } else {
        ProbeOutcome::Connected
    }
}

/// Checks whether a remote store is usable for a workshop.
#[derive(Clone)]
pub struct ConnectionProbe {
    remote: Arc<dyn RemoteStore>,
    workshop_id: String,
    timeout: Duration,
}

impl ConnectionProbe {
    pub fn new(remote: Arc<dyn RemoteStore>, workshop_id: impl Into<String>, timeout: Duration) -> Self {
        Self {
            remote,
            workshop_id: workshop_id.into(),
            timeout,
        }
    }

    /// Run both probe steps. No side effects beyond the remote calls.
    pub async fn probe(&self) -> ProbeOutcome {
        if let Some(outcome) = self.check_reachability().await {
            tracing::debug!(?outcome, "probe ended at reachability check");
            return outcome;
        }

        let filter = RecordFilter::workshop(self.workshop_id.clone()).with_limit(1);
        match tokio::time::timeout(self.timeout, self.remote.select(&filter)).await {
            Err(_) => ProbeOutcome::Disconnected(ErrorKind::Timeout),
            Ok(Ok(_)) => ProbeOutcome::Connected,
            Ok(Err(e)) => {
                let outcome = classify_query_error(&e);
                tracing::debug!(error = %e, ?outcome, "probe query failed");
                outcome
            }
        }
    }

    /// Step 1. `None` means continue to the query.
    async fn check_reachability(&self) -> Option<ProbeOutcome> {
        match tokio::time::timeout(self.timeout, self.remote.ping()).await {
            Err(_) | Ok(Err(RemoteError::Timeout)) => {
                Some(ProbeOutcome::Disconnected(ErrorKind::Timeout))
            }
            Ok(Err(RemoteError::Network(reason))) => {
                tracing::debug!(%reason, "reachability check inconclusive");
                None
            }
            Ok(Err(_)) => Some(ProbeOutcome::Disconnected(ErrorKind::Network)),
            Ok(Ok(Reachability::Rejected { status: 401 })) => {
                Some(ProbeOutcome::Disconnected(ErrorKind::Auth))
            }
            Ok(Ok(Reachability::Rejected { .. })) => {
                Some(ProbeOutcome::Disconnected(ErrorKind::Endpoint))
            }
            Ok(Ok(Reachability::Reachable)) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_store::{MemoryRemoteStore, RemoteOp};

    fn probe_for(remote: &Arc<MemoryRemoteStore>) -> ConnectionProbe {
        ConnectionProbe::new(remote.clone(), "ws", Duration::from_secs(10))
    }

    #[test]
    fn test_classification_table() {
        let cases = [
            (RemoteError::api("PGRST116", "no rows"), ProbeOutcome::Connected),
            (
                RemoteError::api("42P01", "relation \"participants\" does not exist"),
                ProbeOutcome::Connected,
            ),
            (
                RemoteError::api("42501", "permission denied for table participants"),
                ProbeOutcome::Connected,
            ),
            (
                RemoteError::api("", "Invalid API key"),
                ProbeOutcome::Disconnected(ErrorKind::Auth),
            ),
            (
                RemoteError::api("PGRST301", "JWT expired"),
                ProbeOutcome::Disconnected(ErrorKind::Auth),
            ),
            (
                RemoteError::api("401", "Unauthorized"),
                ProbeOutcome::Disconnected(ErrorKind::Auth),
            ),
            (
                RemoteError::api("PGRST000", "could not connect"),
                ProbeOutcome::Disconnected(ErrorKind::Network),
            ),
            (
                RemoteError::Transport("TypeError: Failed to fetch".into()),
                ProbeOutcome::Disconnected(ErrorKind::Network),
            ),
            (
                RemoteError::Network("connection refused".into()),
                ProbeOutcome::Disconnected(ErrorKind::Network),
            ),
            (RemoteError::Timeout, ProbeOutcome::Disconnected(ErrorKind::Timeout)),
            // Unrecognised failures fail open.
            (RemoteError::api("XX000", "internal error"), ProbeOutcome::Connected),
            (RemoteError::Decode("unexpected token".into()), ProbeOutcome::Connected),
        ];

        for (error, expected) in cases {
            assert_eq!(classify_query_error(&error), expected, "{error:?}");
        }
    }

    #[tokio::test]
    async fn test_healthy_store_is_connected() {
        let remote = Arc::new(MemoryRemoteStore::new());
        assert_eq!(probe_for(&remote).probe().await, ProbeOutcome::Connected);

        let calls = remote.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].op, RemoteOp::Ping);
        assert!(matches!(&calls[1].op, RemoteOp::Select(f) if f.limit == Some(1)));
    }

    #[tokio::test]
    async fn test_rejected_ping_stops_probe() {
        let remote = Arc::new(MemoryRemoteStore::new());

        remote.set_ping_status(Some(401));
        assert_eq!(
            probe_for(&remote).probe().await,
            ProbeOutcome::Disconnected(ErrorKind::Auth)
        );

        remote.set_ping_status(Some(404));
        assert_eq!(
            probe_for(&remote).probe().await,
            ProbeOutcome::Disconnected(ErrorKind::Endpoint)
        );

        remote.set_ping_status(Some(503));
        assert_eq!(
            probe_for(&remote).probe().await,
            ProbeOutcome::Disconnected(ErrorKind::Endpoint)
        );

        assert!(remote
            .calls()
            .iter()
            .all(|c| c.op == RemoteOp::Ping));
    }

    #[tokio::test]
    async fn test_network_ping_failure_falls_through_to_query() {
        let remote = Arc::new(MemoryRemoteStore::new());
        remote.set_ping_error(Some(RemoteError::Network("CORS".into())));
        assert_eq!(probe_for(&remote).probe().await, ProbeOutcome::Connected);

        remote.set_online(false);
        assert_eq!(
            probe_for(&remote).probe().await,
            ProbeOutcome::Disconnected(ErrorKind::Network)
        );
    }

    #[tokio::test]
    async fn test_other_ping_failure_is_network() {
        let remote = Arc::new(MemoryRemoteStore::new());
        remote.set_ping_error(Some(RemoteError::Transport("tls handshake".into())));
        assert_eq!(
            probe_for(&remote).probe().await,
            ProbeOutcome::Disconnected(ErrorKind::Network)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_ping_times_out() {
        let remote = Arc::new(MemoryRemoteStore::new());
        remote.set_ping_delay(Some(Duration::from_secs(60)));

        let started = tokio::time::Instant::now();
        assert_eq!(
            probe_for(&remote).probe().await,
            ProbeOutcome::Disconnected(ErrorKind::Timeout)
        );
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_missing_table_counts_as_connected() {
        let remote = Arc::new(MemoryRemoteStore::new());
        remote.set_query_error(Some(RemoteError::api(
            "42P01",
            "relation \"public.participants\" does not exist",
        )));
        assert_eq!(probe_for(&remote).probe().await, ProbeOutcome::Connected);
    }

    #[tokio::test]
    async fn test_bad_key_is_auth() {
        let remote = Arc::new(MemoryRemoteStore::new());
        remote.set_query_error(Some(RemoteError::api("", "Invalid API key")));
        assert_eq!(
            probe_for(&remote).probe().await,
            ProbeOutcome::Disconnected(ErrorKind::Auth)
        );
    }
}
