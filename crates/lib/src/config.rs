//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chat-proxy/config.json`) and environment.
//! Upstream credentials are resolved per invocation so a missing key surfaces as a
//! request error rather than a startup failure.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Env var holding the upstream API key. Overrides `upstream.apiKey`.
pub const API_KEY_ENV: &str = "ABACUS_API_KEY";

/// Env var holding the upstream endpoint URL. Overrides `upstream.apiUrl`.
pub const API_URL_ENV: &str = "ABACUS_API_URL";

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream chat API settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Server bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for HTTP (default 8888).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

/// Upstream endpoint and credentials. Both values can be supplied by env instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpstreamConfig {
    /// Bearer token for the upstream API. Overridden by ABACUS_API_KEY env.
    pub api_key: Option<String>,

    /// Full URL the message is POSTed to. Overridden by ABACUS_API_URL env.
    pub api_url: Option<String>,

    /// Upper bound on the upstream round trip, in seconds (default 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_server_port() -> u16 {
    8888
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Credentials for one upstream call. Empty strings mean "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpstreamCredentials {
    pub api_key: String,
    pub api_url: String,
}

impl UpstreamCredentials {
    pub fn new(api_key: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: api_url.into(),
        }
    }

    /// True when both the key and the URL are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.api_key.is_empty() && !self.api_url.is_empty()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Where upstream credentials are read from on each request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CredentialSource {
    /// Env ABACUS_API_KEY / ABACUS_API_URL, falling back to the config file.
    #[default]
    EnvThenConfig,
    /// Config file only; process env is ignored.
    ConfigOnly,
}

impl CredentialSource {
    /// Missing values come back empty; callers check [`UpstreamCredentials::is_complete`].
    pub fn resolve(self, config: &Config) -> UpstreamCredentials {
        let from_env = |name: &str| match self {
            CredentialSource::EnvThenConfig => non_empty_env(name),
            CredentialSource::ConfigOnly => None,
        };
        let api_key = from_env(API_KEY_ENV)
            .or_else(|| non_empty(config.upstream.api_key.as_ref()))
            .unwrap_or_default();
        let api_url = from_env(API_URL_ENV)
            .or_else(|| non_empty(config.upstream.api_url.as_ref()))
            .unwrap_or_default();
        UpstreamCredentials { api_key, api_url }
    }
}

/// Resolve upstream credentials: env ABACUS_API_KEY / ABACUS_API_URL override config.
pub fn resolve_upstream_credentials(config: &Config) -> UpstreamCredentials {
    CredentialSource::EnvThenConfig.resolve(config)
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHAT_PROXY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".chat-proxy").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or CHAT_PROXY_CONFIG_PATH).
/// Missing file => default config.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 8888);
        assert_eq!(s.bind, "127.0.0.1");
        assert_eq!(UpstreamConfig::default().timeout_secs, 30);
    }

    #[test]
    fn parses_camel_case_upstream() {
        let config: Config = serde_json::from_str(
            r#"{"upstream":{"apiKey":"k","apiUrl":"https://api.example/chat","timeoutSecs":5}}"#,
        )
        .unwrap();
        assert_eq!(config.upstream.api_key.as_deref(), Some("k"));
        assert_eq!(
            config.upstream.api_url.as_deref(),
            Some("https://api.example/chat")
        );
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.server.port, 8888);
    }

    #[test]
    fn credentials_complete_only_when_both_set() {
        assert!(UpstreamCredentials::new("k", "http://u").is_complete());
        assert!(!UpstreamCredentials::new("", "http://u").is_complete());
        assert!(!UpstreamCredentials::new("k", "").is_complete());
        assert!(!UpstreamCredentials::default().is_complete());
    }

    #[test]
    fn blank_config_values_are_treated_as_missing() {
        assert_eq!(non_empty(Some(&"  ".to_string())), None);
        assert_eq!(non_empty(Some(&" k ".to_string())), Some("k".to_string()));
        assert_eq!(non_empty(None), None);
    }

    #[test]
    fn config_only_source_reads_trimmed_file_values() {
        let mut config = Config::default();
        config.upstream.api_key = Some(" file-key ".to_string());
        config.upstream.api_url = Some("http://file.example/chat".to_string());
        assert_eq!(
            CredentialSource::ConfigOnly.resolve(&config),
            UpstreamCredentials::new("file-key", "http://file.example/chat")
        );

        config.upstream.api_url = Some("   ".to_string());
        assert!(!CredentialSource::ConfigOnly.resolve(&config).is_complete());
    }

    #[test]
    fn load_config_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("chat-proxy-no-such-dir/config.json");
        let (config, used) = load_config(Some(path.clone())).unwrap();
        assert_eq!(used, path);
        assert_eq!(config.server.port, 8888);
        assert!(config.upstream.api_url.is_none());
    }
}
