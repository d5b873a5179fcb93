//! Configuration management for wechat-ax.
//!
//! Loads configuration from a TOML file and falls back to defaults for
//! anything missing. Command-line flags override what is loaded here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::chat::UnreadPolicy;
use crate::locator::DEFAULT_MAX_DEPTH;
use crate::render::OutputFormat;
use crate::roles::DEFAULT_DIALECT;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub decoder: DecoderConfig,

    #[serde(default)]
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// WeChat layout dialect (v38, v40)
    #[serde(default = "default_dialect")]
    pub dialect: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format (text, json)
    #[serde(default)]
    pub output: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            dialect: default_dialect(),
            log_level: default_log_level(),
            output: OutputFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// How parsed unread counts are credited to chats
    #[serde(default)]
    pub unread_policy: UnreadPolicy,

    /// Depth ceiling for role-path searches
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            unread_policy: UnreadPolicy::BudgetGated,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Notifications closer together than this are not reported
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl MonitorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

// Default value functions for serde
fn default_dialect() -> String {
    DEFAULT_DIALECT.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_debounce_ms() -> u64 {
    500
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Self {
        Self::load_from_path(&Self::default_config_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("[WX-CONFIG] Loaded configuration from {:?}", path);
                    config
                }
                Err(e) => {
                    log::warn!("[WX-CONFIG] Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("[WX-CONFIG] No config file found at {:?}, using defaults", path);
                Self::default()
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wechat-ax")
            .join("config.toml")
    }
}
