//! Upstream API client: one authenticated JSON POST per chat message.

use crate::config::UpstreamCredentials;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Body sent upstream. Only `input` is sent today; session or metadata fields go here.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest {
    pub input: String,
}

impl UpstreamRequest {
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Connection failure, timeout, or unreadable response.
    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Upstream answered with a non-success status.
    #[error("upstream api error: {status} {body}")]
    Status { status: u16, body: String },
    /// Success status but the body was not JSON.
    #[error("upstream response was not valid json: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Capability to deliver one message upstream and return its decoded JSON response.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn send(
        &self,
        credentials: &UpstreamCredentials,
        request: &UpstreamRequest,
    ) -> Result<serde_json::Value, UpstreamError>;
}

/// reqwest-backed [`Upstream`] with a bounded per-call timeout.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeout: Option<Duration>) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .timeout(timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    /// POST `request` as JSON to `credentials.api_url` with a bearer token.
    async fn send(
        &self,
        credentials: &UpstreamCredentials,
        request: &UpstreamRequest,
    ) -> Result<serde_json::Value, UpstreamError> {
        let res = self
            .client
            .post(&credentials.api_url)
            .bearer_auth(&credentials.api_key)
            .json(request)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(UpstreamError::Status { status, body });
        }
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
