//! Gateway HTTP server (single port).

use crate::config::{self, Config, CredentialSource};
use crate::proxy::{ChatProxy, InboundRequest, ProxyError, ProxyResponse};
use crate::upstream::HttpUpstream;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Shared state for the gateway (config and proxy). Credentials are resolved per request.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub proxy: ChatProxy,
    pub credential_source: CredentialSource,
}

impl GatewayState {
    /// State backed by the real HTTP upstream, using `upstream.timeoutSecs` as the call bound.
    pub fn new(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.upstream.timeout_secs);
        let upstream = HttpUpstream::new(Some(timeout)).context("building upstream http client")?;
        Ok(Self::with_proxy(config, ChatProxy::new(Arc::new(upstream))))
    }

    pub fn with_proxy(config: Config, proxy: ChatProxy) -> Self {
        Self {
            config: Arc::new(config),
            proxy,
            credential_source: CredentialSource::default(),
        }
    }

    pub fn with_credential_source(mut self, source: CredentialSource) -> Self {
        self.credential_source = source;
        self
    }
}

/// Routes for the gateway. Exposed so tests can serve it on an ephemeral listener.
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/chat", any(chat_http))
        .route("/.netlify/functions/chat", any(chat_http))
        .with_state(state)
}

pub async fn run_gateway(config: Config) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.bind.trim(), config.server.port);
    let credentials = config::resolve_upstream_credentials(&config);
    if !credentials.is_complete() {
        log::warn!(
            "{} or {} is not set; chat requests will fail until it is",
            config::API_KEY_ENV,
            config::API_URL_ENV
        );
    }
    let state = GatewayState::new(config)?;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.server.port,
    }))
}

/// Any method on /chat. Non-POST methods still reach the proxy so it can answer 405.
async fn chat_http(State(state): State<GatewayState>, method: Method, body: Bytes) -> Response {
    let body = match String::from_utf8(body.to_vec()) {
        Ok(s) if s.is_empty() => None,
        Ok(s) => Some(s),
        Err(_) if method == Method::POST => {
            return to_http(ProxyError::InvalidJson.into_response());
        }
        Err(_) => None,
    };
    let request = InboundRequest::new(method.as_str(), body);
    let credentials = state.credential_source.resolve(&state.config);
    to_http(state.proxy.handle(&request, &credentials).await)
}

fn to_http(res: ProxyResponse) -> Response {
    let status = StatusCode::from_u16(res.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, res.content_type.as_mime())],
        res.body,
    )
        .into_response()
}
