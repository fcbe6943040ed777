use std::env;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_API_VERSION: &str = "2022-11-28";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing GITHUB_TOKEN, GH_TOKEN or GITHUB_PERSONAL_ACCESS_TOKEN")]
    MissingToken,
    #[error("Invalid GITHUB_API_URL {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },
}

/// Runtime configuration for the GitHub REST client.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub api_version: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn new(token: impl Into<String>, api_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - GITHUB_TOKEN (or GH_TOKEN, GITHUB_PERSONAL_ACCESS_TOKEN) [required]
    /// - GITHUB_API_URL (default: https://api.github.com)
    /// - GITHUB_API_VERSION (default: 2022-11-28)
    /// - GITHUB_HTTP_TIMEOUT_SECS (default: 30)
    /// - GITHUB_USER_AGENT (default: github-discussions-mcp/<version>)
    pub fn from_env() -> Result<Self, ConfigError> {
        let token = ["GITHUB_TOKEN", "GH_TOKEN", "GITHUB_PERSONAL_ACCESS_TOKEN"]
            .iter()
            .find_map(|k| env::var(k).ok().filter(|v| !v.trim().is_empty()))
            .ok_or(ConfigError::MissingToken)?;

        let api_url = env::var("GITHUB_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        url::Url::parse(&api_url).map_err(|e| ConfigError::InvalidApiUrl {
            url: api_url.clone(),
            reason: e.to_string(),
        })?;

        let mut cfg = Self::new(token, api_url);
        if let Ok(v) = env::var("GITHUB_API_VERSION") {
            cfg.api_version = v;
        }
        if let Some(secs) = env::var("GITHUB_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.timeout_secs = secs;
        }
        if let Ok(ua) = env::var("GITHUB_USER_AGENT") {
            cfg.user_agent = ua;
        }
        Ok(cfg)
    }
}

fn default_user_agent() -> String {
    format!("github-discussions-mcp/{}", env!("CARGO_PKG_VERSION"))
}

/// Server-level switches. None of these require credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub read_only: bool,
    pub enable_ping: bool,
    pub include_rate: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            read_only: env_flag("GITHUB_MCP_READ_ONLY"),
            enable_ping: env_flag("GITHUB_MCP_ENABLE_PING"),
            include_rate: env_flag("GITHUB_MCP_INCLUDE_RATE"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| parse_flag(&v)).unwrap_or(false)
}

pub(crate) fn parse_flag(v: &str) -> bool {
    matches!(
        v.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
