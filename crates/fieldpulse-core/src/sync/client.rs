//! REST client for the sync API.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use super::snapshot::{AckEnvelope, PullEnvelope, SyncSnapshot};
use crate::util::{is_http_url, normalize_text_option};

/// Errors surfaced by sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid sync configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Sync HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sync API error: {0}")]
    Api(String),
    #[error("Invalid sync payload: {0}")]
    InvalidPayload(String),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// The remote boundary the sync engine talks to. Seam for tests.
#[allow(async_fn_in_trait)]
pub trait SyncApi {
    /// Fetch the full remote snapshot.
    async fn pull(&self) -> SyncResult<SyncSnapshot>;

    /// Upload the full local snapshot for per-row upsert.
    async fn push(&self, snapshot: &SyncSnapshot) -> SyncResult<()>;

    /// Idempotently ensure the remote schema exists.
    async fn migrate(&self) -> SyncResult<()>;

    /// Liveness plus backing-store connectivity probe.
    async fn health(&self) -> SyncResult<()>;
}

/// Default per-request timeout. A hung request should fail like any other
/// transient network error instead of pinning the engine in Syncing.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// reqwest implementation of [`SyncApi`] against the REST surface.
#[derive(Debug, Clone)]
pub struct HttpSyncClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSyncClient {
    pub fn new(base_url: impl Into<String>) -> SyncResult<Self> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        Ok(Self {
            base_url,
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn check_ack(response: reqwest::Response, what: &str) -> SyncResult<()> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Api(parse_api_error(status, &body)));
        }
        let ack = response.json::<AckEnvelope>().await?;
        if ack.success {
            Ok(())
        } else {
            Err(SyncError::Api(
                ack.message.unwrap_or_else(|| format!("{what} failed")),
            ))
        }
    }
}

impl SyncApi for HttpSyncClient {
    async fn pull(&self) -> SyncResult<SyncSnapshot> {
        let response = self
            .client
            .get(self.url("/sync"))
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Api(parse_api_error(status, &body)));
        }

        let envelope = response.json::<PullEnvelope>().await?;
        if !envelope.success {
            return Err(SyncError::Api(
                envelope.message.unwrap_or_else(|| "pull failed".to_string()),
            ));
        }
        envelope.data.ok_or_else(|| {
            SyncError::InvalidPayload("response did not include data".to_string())
        })
    }

    async fn push(&self, snapshot: &SyncSnapshot) -> SyncResult<()> {
        let response = self
            .client
            .post(self.url("/sync"))
            .json(snapshot)
            .send()
            .await?;
        Self::check_ack(response, "push").await
    }

    async fn migrate(&self) -> SyncResult<()> {
        let response = self.client.post(self.url("/migrate")).send().await?;
        Self::check_ack(response, "migrate").await
    }

    async fn health(&self) -> SyncResult<()> {
        let response = self.client.get(self.url("/health")).send().await?;
        Self::check_ack(response, "health check").await
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        if let Some(message) = payload.message {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> SyncResult<String> {
    let base_url = normalize_text_option(Some(raw)).ok_or_else(|| {
        SyncError::InvalidConfiguration("endpoint must not be empty".to_string())
    })?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(SyncError::InvalidConfiguration(
            "endpoint must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url(String::new()).is_err());
        assert!(normalize_base_url("api.example.com".to_string()).is_err());
    }

    #[test]
    fn normalize_base_url_strips_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://sync.example.com/".to_string()).unwrap(),
            "https://sync.example.com"
        );
    }

    #[test]
    fn parse_api_error_prefers_envelope_message() {
        let message = parse_api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"success":false,"message":"db unavailable"}"#,
        );
        assert_eq!(message, "db unavailable (500)");
    }

    #[test]
    fn parse_api_error_falls_back_to_status() {
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, ""), "HTTP 502");
    }
}
