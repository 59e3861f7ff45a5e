//! Application configuration management.
//!
//! Configuration is read from `~/.config/corona-tray/config.json` (every
//! field optional) and then overridden by environment variables:
//!
//! - `CORONA_GEO_URL`: geolocation endpoint
//! - `CORONA_API_BASE`: statistics API base URL
//! - `CORONA_REQUEST_TIMEOUT_SECS`: HTTP timeout
//! - `CORONA_SETTINGS_DIR`: directory holding `settings.json`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::{DEFAULT_API_BASE_URL, DEFAULT_GEOLOCATION_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::api::ApiClient;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "corona-tray";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub geolocation_url: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub settings_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geolocation_url: DEFAULT_GEOLOCATION_URL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            settings_dir: None,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file: {}", path.display()))?
            }
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("CORONA_GEO_URL") {
            self.geolocation_url = url;
        }
        if let Some(url) = lookup("CORONA_API_BASE") {
            self.api_base_url = url;
        }
        if let Some(raw) = lookup("CORONA_REQUEST_TIMEOUT_SECS") {
            match raw.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid CORONA_REQUEST_TIMEOUT_SECS"),
            }
        }
        if let Some(dir) = lookup("CORONA_SETTINGS_DIR") {
            self.settings_dir = Some(PathBuf::from(dir));
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding `settings.json`.
    pub fn settings_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.settings_dir {
            return Ok(dir.clone());
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME))
    }

    /// Directory for rolling log files.
    pub fn log_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME).join("logs"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the HTTP client for the configured endpoints.
    pub fn api_client(&self) -> Result<ApiClient> {
        ApiClient::with_endpoints(&self.geolocation_url, &self.api_base_url, self.request_timeout())
    }
}
