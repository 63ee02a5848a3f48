//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the API base URL, where the session token is kept, and the last
//! used login email.
//!
//! Configuration is stored at `~/.config/modcandy/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "modcandy";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Production API host
pub const DEFAULT_API_BASE_URL: &str = "https://modcandy-api.compani.ai";

/// Environment variable overriding the API base URL
pub const API_BASE_URL_ENV: &str = "MODCANDY_API_BASE_URL";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Where the session token is persisted between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackend {
    /// JSON key-value file in the data directory
    #[default]
    File,
    /// OS keychain
    Keyring,
    /// Not persisted; the session ends with the process
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub token_backend: TokenBackend,
    pub last_email: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file token store and logs
    pub fn data_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Resolve the API base URL: environment, then config file, then the
    /// production default. Trailing slashes are stripped.
    pub fn api_base_url(&self) -> String {
        let from_env = std::env::var(API_BASE_URL_ENV).ok();
        Self::resolve_base_url(from_env.as_deref(), self.api_base_url.as_deref())
    }

    fn resolve_base_url(from_env: Option<&str>, from_file: Option<&str>) -> String {
        [from_env, from_file]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|url| !url.is_empty())
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }

    pub fn request_timeout_secs(&self) -> u64 {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}
