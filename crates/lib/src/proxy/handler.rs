//! The proxy pipeline: method check, body parse, message check, credentials, upstream call,
//! normalization.

use super::error::ProxyError;
use super::normalize::{normalize, NormalizedReply};
use crate::config::UpstreamCredentials;
use crate::upstream::{Upstream, UpstreamError, UpstreamRequest};
use serde_json::{json, Value};
use std::sync::Arc;

/// One inbound call as the hosting runtime hands it over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: String,
    /// Raw body; `None` or empty is read as `{}`.
    pub body: Option<String>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, body: Option<String>) -> Self {
        Self {
            method: method.into(),
            body,
        }
    }

    /// Shorthand for a POST with the given body.
    pub fn post(body: impl Into<String>) -> Self {
        Self::new("POST", Some(body.into()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Text,
    Json,
}

impl ContentType {
    pub fn as_mime(self) -> &'static str {
        match self {
            ContentType::Text => "text/plain; charset=utf-8",
            ContentType::Json => "application/json",
        }
    }
}

/// Status and serialized body for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyResponse {
    pub status_code: u16,
    pub content_type: ContentType,
    pub body: String,
}

impl ProxyResponse {
    pub fn text(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            content_type: ContentType::Text,
            body: body.into(),
        }
    }

    pub fn json(status_code: u16, body: String) -> Self {
        Self {
            status_code,
            content_type: ContentType::Json,
            body,
        }
    }

    /// `{"error": message}`.
    pub fn error(status_code: u16, message: &str) -> Self {
        Self::json(status_code, json!({ "error": message }).to_string())
    }

    pub fn is_json(&self) -> bool {
        self.content_type == ContentType::Json
    }
}

/// Forwards chat messages to the upstream API. Holds no per-request state; clone freely.
#[derive(Clone)]
pub struct ChatProxy {
    upstream: Arc<dyn Upstream>,
}

impl ChatProxy {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self { upstream }
    }

    /// Process one request. Never fails: every error becomes its mapped response.
    pub async fn handle(
        &self,
        request: &InboundRequest,
        credentials: &UpstreamCredentials,
    ) -> ProxyResponse {
        let result = self.process(request, credentials).await.and_then(|reply| {
            serde_json::to_string(&reply).map_err(|e| ProxyError::Internal(e.to_string()))
        });
        match result {
            Ok(body) => ProxyResponse::json(200, body),
            Err(e) => {
                match &e {
                    ProxyError::Upstream { status, body } => {
                        log::error!("upstream error {} {}", status, body);
                    }
                    ProxyError::Internal(msg) => log::error!("proxy error: {}", msg),
                    ProxyError::Misconfigured => log::warn!("proxy: {}", e),
                    _ => log::debug!("proxy: rejected request: {}", e),
                }
                e.into_response()
            }
        }
    }

    async fn process(
        &self,
        request: &InboundRequest,
        credentials: &UpstreamCredentials,
    ) -> Result<NormalizedReply, ProxyError> {
        if request.method != "POST" {
            return Err(ProxyError::MethodNotAllowed);
        }
        let message = parse_message(request.body.as_deref())?;
        if !credentials.is_complete() {
            return Err(ProxyError::Misconfigured);
        }
        log::debug!("proxy: forwarding message ({} bytes)", message.len());
        let data = self
            .upstream
            .send(credentials, &UpstreamRequest::new(message))
            .await
            .map_err(|e| match e {
                UpstreamError::Status { status, body } => ProxyError::Upstream { status, body },
                other => ProxyError::Internal(other.to_string()),
            })?;
        if data.is_null() {
            return Err(ProxyError::Internal("upstream returned null".to_string()));
        }
        Ok(normalize(&data))
    }
}

/// Trimmed `message` from the body. A non-object body or non-string message counts as missing.
fn parse_message(body: Option<&str>) -> Result<String, ProxyError> {
    let raw = body.filter(|b| !b.is_empty()).unwrap_or("{}");
    let value: Value = serde_json::from_str(raw).map_err(|_| ProxyError::InvalidJson)?;
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    if message.is_empty() {
        return Err(ProxyError::MissingMessage);
    }
    Ok(message.to_string())
}
