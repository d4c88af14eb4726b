//! Runtime configuration.
//!
//! Values come from environment variables and can be overridden by CLI flags
//! (see `main.rs`):
//! - `NOTEBOX_HOST` / `NOTEBOX_PORT` - listen address (default `127.0.0.1:3000`)
//! - `NOTEBOX_DB` - database file (default: platform data dir)
//! - `NOTEBOX_API_KEY` - bearer token required by the API (optional)
//! - `NOTEBOX_CORS_ORIGINS` - comma-separated allowed origins (default: any)
//! - `NOTEBOX_URL` - API base URL used by client commands
//! - `NOTEBOX_POLL_SECS` - refresh interval for `watch` (default 5)

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_POLL_SECS: u64 = 5;

/// Server-side configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `None` selects the platform default location.
    pub db_path: Option<PathBuf>,
    pub security: SecurityConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: get("NOTEBOX_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: get("NOTEBOX_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            db_path: get("NOTEBOX_DB").map(PathBuf::from),
            security: SecurityConfig::from_lookup(get),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// API authentication and CORS settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityConfig {
    /// Bearer token clients must present. No authentication when unset.
    pub api_key: Option<String>,
    /// Allowed CORS origins. Any origin when unset.
    pub cors_origins: Option<Vec<String>>,
}

impl SecurityConfig {
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let api_key = get("NOTEBOX_API_KEY").filter(|k| !k.is_empty());
        let cors_origins = get("NOTEBOX_CORS_ORIGINS").map(|s| {
            s.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        });
        Self {
            api_key,
            cors_origins,
        }
    }

    /// No authentication and permissive CORS, for local use and tests.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            cors_origins: None,
        }
    }
}

/// Configuration for commands that talk to a running server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base including the `/api/v1` prefix.
    pub base_url: String,
    pub api_key: Option<String>,
    pub poll_interval: Duration,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = get("NOTEBOX_URL")
            .unwrap_or_else(|| format!("http://{}:{}/api/v1", DEFAULT_HOST, DEFAULT_PORT));
        let poll_secs = get("NOTEBOX_POLL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_POLL_SECS);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: get("NOTEBOX_API_KEY").filter(|k| !k.is_empty()),
            poll_interval: Duration::from_secs(poll_secs),
        }
    }
}
