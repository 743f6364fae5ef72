//! Server Configuration
//!
//! Settings are read once at startup from the process environment (after
//! an optional `.env` file) and shared read-only afterwards.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_PROJECT_NAME: &str = "AI 智能出行管家";

/// Startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Process-wide settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_name: String,
    pub deepseek_api_key: String,
    pub deepseek_base_url: String,
    pub tavily_api_key: String,
    /// Rail side-process MCP endpoint, e.g. `http://127.0.0.1:8080/mcp`
    pub mcp_12306_url: Option<String>,
    pub mcp_variflight_url: Option<String>,
    pub amap_api_key: Option<String>,
    pub llm_model: String,
    pub host: String,
    pub port: u16,
    pub session_ttl_secs: u64,
}

/// Merge the nearest `.env` into the process environment. Variables that are
/// already set win. Call before `logging::init` so `RUST_LOG` from the file applies.
pub fn load_env_file() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Same as [`load_env_file`] for an explicit file
pub fn load_env_file_from(path: &Path) -> bool {
    dotenvy::from_path(path).is_ok()
}

impl Settings {
    /// Load `.env` (if present) and read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Some(path) = load_env_file() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as absent.
    pub fn from_source<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::Invalid {
                key: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let session_ttl_secs = match get("SESSION_TTL_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
                key: "SESSION_TTL_SECS",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_SESSION_TTL_SECS,
        };

        Ok(Self {
            project_name: get("PROJECT_NAME").unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            deepseek_api_key: required("DEEPSEEK_API_KEY")?,
            deepseek_base_url: required("DEEPSEEK_BASE_URL")?,
            tavily_api_key: required("TAVILY_API_KEY")?,
            mcp_12306_url: get("MCP_12306_REMOTE_URL"),
            mcp_variflight_url: get("MCP_VARIFLIGHT_REMOTE_URL"),
            amap_api_key: get("AMAP_API_KEY"),
            llm_model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            session_ttl_secs,
        })
    }

    /// `host:port` the listener binds to
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
            key: "HOST",
            value: self.host.clone(),
            reason: e.to_string(),
        })
    }
}
