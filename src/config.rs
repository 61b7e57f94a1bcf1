//! Configuration for retroterm.
//!
//! Loaded from `~/.retroterm/config.toml`; every field has a default so a
//! missing or partial file is fine. The endpoint can also come from the
//! `RETROTERM_ENDPOINT` environment variable or the `--endpoint` flag,
//! which take precedence (CLI over env over file).
//!
//! # Configuration File
//!
//! ```toml
//! # Capability URL of the command service (required to go online)
//! endpoint = "https://sim.example.net/cap/abc-123"
//!
//! [screen]
//! cols = 80
//! rows = 25
//! frame_ms = 33
//!
//! [service]
//! pull_interval_ms = 400
//! request_timeout_secs = 10
//! ```

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Capability URL of the command service
    pub endpoint: Option<String>,
    /// Screen settings
    pub screen: ScreenConfig,
    /// Command service settings
    pub service: ServiceConfig,
}

/// Screen settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub cols: u16,
    pub rows: u16,
    /// Target frame duration in milliseconds
    pub frame_ms: u64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            cols: crate::core::grid::DEFAULT_COLS,
            rows: crate::core::grid::DEFAULT_ROWS,
            frame_ms: 33,
        }
    }
}

/// Command service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Delay between boot message pulls
    pub pull_interval_ms: u64,
    /// Per-request HTTP timeout
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            pull_interval_ms: 400,
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                if let Ok(content) = fs::read_to_string(&path) {
                    match Self::from_toml(&content) {
                        Ok(config) => return config,
                        Err(e) => tracing::error!("ignoring bad config file: {e}"),
                    }
                }
            }
        }
        Self::default()
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".retroterm").join("config.toml"))
    }
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
