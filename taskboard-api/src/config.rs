/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `CORS_ORIGINS`: Comma-separated allowed origins (default: `*`)
/// - `SESSION_IDLE_SECS`: Idle lifetime of a session token (default: 3600)
/// - `UPSTREAM_MODE`: `http` (default) or `memory`
/// - `UPSTREAM_BASE_URL`, `UPSTREAM_PROJECT_ID`, `UPSTREAM_PUBLIC_KEY`:
///   record service access (required in `http` mode)
/// - `UPSTREAM_TIMEOUT_SECS`: Per-call timeout (default: 30, clamped 1..300)
/// - `RUST_LOG`: Log filter (default: taskboard_api=debug,taskboard_shared=info,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use crate::sessions::DEFAULT_SESSION_IDLE;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use taskboard_shared::timeout::CallTimeout;
use taskboard_shared::upstream::UpstreamConfig;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Record service configuration
    pub upstream: UpstreamBackend,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Seconds a session token survives without use
    pub session_idle_secs: u64,
}

/// Which record service the gateway talks to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum UpstreamBackend {
    /// Hosted record service over HTTP
    Http(UpstreamConfig),

    /// Process-local store, for development
    Memory {
        /// Per-call timeout in seconds
        timeout_secs: Option<u64>,
    },
}

impl UpstreamBackend {
    /// Deadline applied to every gateway call
    pub fn call_timeout(&self) -> CallTimeout {
        match self {
            UpstreamBackend::Http(config) => config.call_timeout(),
            UpstreamBackend::Memory { timeout_secs } => CallTimeout::from_secs(*timeout_secs),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let session_idle_secs = match env::var("SESSION_IDLE_SECS") {
            Ok(raw) => raw.trim().parse::<u64>()?,
            Err(_) => DEFAULT_SESSION_IDLE.as_secs(),
        };

        let mode = env::var("UPSTREAM_MODE").unwrap_or_else(|_| "http".to_string());
        let upstream = match mode.trim().to_ascii_lowercase().as_str() {
            "http" => UpstreamBackend::Http(UpstreamConfig::from_env()?),
            "memory" => UpstreamBackend::Memory {
                timeout_secs: env::var("UPSTREAM_TIMEOUT_SECS")
                    .ok()
                    .map(|s| s.parse::<u64>())
                    .transpose()?,
            },
            other => anyhow::bail!("UPSTREAM_MODE must be 'http' or 'memory', got '{}'", other),
        };

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                session_idle_secs,
            },
            upstream,
        })
    }

    /// Configuration over the in-memory record service
    pub fn in_memory() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
                cors_origins: vec!["*".to_string()],
                session_idle_secs: DEFAULT_SESSION_IDLE.as_secs(),
            },
            upstream: UpstreamBackend::Memory { timeout_secs: None },
        }
    }

    /// Idle lifetime of a session token, at least one second
    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.api.session_idle_secs.max(1))
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
