//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the authentication endpoint, session lifetime, request
//! timeout, and last used username.
//!
//! Configuration is stored at `~/.config/sessiongate/config.json`.
//! Environment variables (also read from a `.env` file by the binary)
//! override the file:
//! - `SESSIONGATE_AUTH_URL`
//! - `SESSIONGATE_SESSION_DURATION_SECS`
//! - `SESSIONGATE_USERNAME`

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::client::DEFAULT_REQUEST_TIMEOUT_SECS;

/// Application name used for config/data/cache directory paths
const APP_NAME: &str = "sessiongate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// One hour, matching the default session lifetime.
const DEFAULT_SESSION_DURATION_SECS: u64 = 3600;

/// Longest session lifetime accepted from config: one year.
pub const MAX_SESSION_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

pub const ENV_AUTH_URL: &str = "SESSIONGATE_AUTH_URL";
pub const ENV_SESSION_DURATION_SECS: &str = "SESSIONGATE_SESSION_DURATION_SECS";
pub const ENV_USERNAME: &str = "SESSIONGATE_USERNAME";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub auth_url: Option<String>,
    pub session_duration_secs: u64,
    pub request_timeout_secs: u64,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_url: None,
            session_duration_secs: DEFAULT_SESSION_DURATION_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            last_username: None,
        }
    }
}

impl Config {
    /// Load from disk, then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
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

    /// Apply overrides from a variable lookup (the process environment in
    /// production). Unparseable numbers are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_AUTH_URL).filter(|v| !v.trim().is_empty()) {
            self.auth_url = Some(url.trim().to_string());
        }

        if let Some(raw) = lookup(ENV_SESSION_DURATION_SECS) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if valid_session_secs(secs) => self.session_duration_secs = secs,
                _ => warn!(value = %raw, "Ignoring invalid {}", ENV_SESSION_DURATION_SECS),
            }
        }

        if let Some(username) = lookup(ENV_USERNAME).filter(|v| !v.is_empty()) {
            self.last_username = Some(username);
        }
    }

    /// Session lifetime. Zero or anything beyond a year falls back to the
    /// one-hour default.
    pub fn session_duration(&self) -> chrono::Duration {
        let secs = self.session_duration_secs;
        if !valid_session_secs(secs) {
            warn!(value = secs, "Ignoring invalid session_duration_secs, using default");
            return crate::auth::default_session_duration();
        }
        // Bounded above, so the conversion cannot fail
        chrono::Duration::try_seconds(secs as i64)
            .unwrap_or_else(crate::auth::default_session_duration)
    }

    /// Per-request timeout. Zero falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        if self.request_timeout_secs == 0 {
            warn!("Ignoring zero request_timeout_secs, using default");
            return Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS);
        }
        Duration::from_secs(self.request_timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where the session store lives (the client's "local storage").
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Where log files go.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}

fn valid_session_secs(secs: u64) -> bool {
    secs > 0 && secs <= MAX_SESSION_DURATION_SECS
}
