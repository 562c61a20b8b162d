//! PostgREST-style HTTP implementation of [`RemoteStore`].
//!
//! ## Wire conventions
//!
//! - reachability: `HEAD {url}/rest/v1/`
//! - rows: `GET | POST | DELETE {url}/rest/v1/{table}`
//! - filters as query parameters: `workshop_id=eq.…`, `status=eq.…`,
//!   `order=timestamp.asc`, `limit=…`
//! - every request carries `apikey: {key}` and `Authorization: Bearer {key}`
//! - error bodies look like `{ "code", "message", "details", "hint" }`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use rollcall_core::{ParticipantRecord, RecordFilter};
use serde::{Deserialize, Serialize};

use crate::error::{RemoteError, RemoteResult};
use crate::remote::{Reachability, RemoteStore};

/// Table used when none is configured.
pub const DEFAULT_TABLE: &str = "participants";

/// Connection settings for [`RestRemoteStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestConfig {
    /// Project base URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    /// Anonymous or service API key.
    pub api_key: String,
    #[serde(default = "default_table")]
    pub table: String,
    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl RestConfig {
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            table: default_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// HTTP remote store speaking PostgREST.
pub struct RestRemoteStore {
    client: Client,
    base: String,
    table: String,
    api_key: String,
}

impl RestRemoteStore {
    pub fn new(config: RestConfig) -> RemoteResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base: config.url.trim_end_matches('/').to_string(),
            table: config.table,
            api_key: config.api_key,
        })
    }

    /// URL of the API root, used for reachability checks.
    pub fn root_url(&self) -> String {
        format!("{}/rest/v1/", self.base)
    }

    /// URL of the participant table.
    pub fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base, self.table)
    }

    /// Query parameters selecting the rows matched by `filter`.
    pub fn filter_query(filter: &RecordFilter) -> Vec<(&'static str, String)> {
        let mut query = vec![("workshop_id", format!("eq.{}", filter.workshop_id))];
        if let Some(status) = filter.status {
            query.push(("status", format!("eq.{}", status.as_str())));
        }
        query
    }

    /// Query parameters for a `select`.
    pub fn select_query(filter: &RecordFilter) -> Vec<(&'static str, String)> {
        let mut query = vec![("select", "*".to_string())];
        query.extend(Self::filter_query(filter));
        query.push(("order", "timestamp.asc".to_string()));
        if let Some(limit) = filter.limit {
            query.push(("limit", limit.to_string()));
        }
        query
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send(&self, request: RequestBuilder) -> RemoteResult<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(api_error(status, &body))
    }
}

fn map_send_error(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout
    } else if e.is_connect() {
        RemoteError::Network(e.to_string())
    } else {
        RemoteError::Transport(e.to_string())
    }
}

/// Turn an error response into a [`RemoteError::Api`].
///
/// Bodies that are not PostgREST error objects keep the raw text as the
/// message and the numeric status as the code.
pub(crate) fn api_error(status: StatusCode, body: &str) -> RemoteError {
    let parsed: Option<ApiErrorBody> = serde_json::from_str(body).ok();
    let (code, message, details, hint) = match parsed {
        Some(b) => (b.code, b.message, b.details, b.hint),
        None => (None, None, None, None),
    };

    RemoteError::Api {
        status: Some(status.as_u16()),
        code: code.unwrap_or_else(|| status.as_u16().to_string()),
        message: message.unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("error").to_string()
            } else {
                body.to_string()
            }
        }),
        details,
        hint,
    }
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn ping(&self) -> RemoteResult<Reachability> {
        let response = self
            .authorized(self.client.head(self.root_url()))
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            Ok(Reachability::Rejected {
                status: status.as_u16(),
            })
        } else {
            Ok(Reachability::Reachable)
        }
    }

    async fn select(&self, filter: &RecordFilter) -> RemoteResult<Vec<ParticipantRecord>> {
        let request = self
            .client
            .get(self.table_url())
            .query(&Self::select_query(filter));
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    async fn insert(&self, records: &[ParticipantRecord]) -> RemoteResult<()> {
        if records.is_empty() {
            return Ok(());
        }
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=minimal")
            .json(records);
        self.send(request).await?;
        Ok(())
    }

    async fn delete(&self, filter: &RecordFilter) -> RemoteResult<()> {
        let request = self
            .client
            .delete(self.table_url())
            .query(&Self::filter_query(filter));
        self.send(request).await?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.table_url()
    }
}
