use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const API_URL_ENV: &str = "MONGO_CHAT_API_URL";
pub const DATA_DIR_ENV: &str = "MONGO_CHAT_DATA_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Client settings, resolved in order: built-in defaults, `config.toml` in
/// the data directory, the `MONGO_CHAT_API_URL` environment variable, then
/// the `--api-url` flag.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub api_url: String,
    /// Per-request timeout for backend calls. `0` leaves requests unbounded.
    pub request_timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ChatConfig {
    /// `$MONGO_CHAT_DATA_DIR`, or `~/.mongo-chat`.
    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_ENV)
            && !dir.trim().is_empty()
        {
            return PathBuf::from(dir);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".mongo-chat")
    }

    pub fn load() -> Result<Self> {
        let path = Self::data_dir().join(CONFIG_FILE);
        Self::load_from(&path, std::env::var(API_URL_ENV).ok())
    }

    pub fn load_from(path: &Path, env_api_url: Option<String>) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<ChatConfig>(&raw)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            ChatConfig::default()
        };

        if let Some(url) = env_api_url
            && !url.trim().is_empty()
        {
            config.api_url = url.trim().to_string();
        }
        Ok(config)
    }

    pub fn with_api_url_override(mut self, api_url: Option<String>) -> Self {
        if let Some(url) = api_url
            && !url.trim().is_empty()
        {
            self.api_url = url.trim().to_string();
        }
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
