//! Configuration Management
//!
//! Handles persistent configuration storage for tcms.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Base URL used when nothing else names one
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Environment fallbacks, below the CLI and the config file
pub const ENV_BASE_URL: &str = "TCMS_BASE_URL";
pub const ENV_TOKEN: &str = "TCMS_TOKEN";

fn default_cache_ttl_secs() -> u64 {
    60
}

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API root the `/admin/cms` namespace lives under
    #[serde(default)]
    pub base_url: Option<String>,
    /// Last active tab
    #[serde(default)]
    pub last_tab: Option<String>,
    /// Freshness window of cached collections
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            last_tab: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            notifications: NotificationConfig::default(),
        }
    }
}

/// Toast and history settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "NotificationConfig::default_detail_level")]
    pub detail_level: String,
    #[serde(default = "NotificationConfig::default_toast_duration")]
    pub toast_duration_secs: u64,
    #[serde(default = "NotificationConfig::default_max_history")]
    pub max_history: usize,
}

impl NotificationConfig {
    fn default_detail_level() -> String {
        "detailed".to_string()
    }

    fn default_toast_duration() -> u64 {
        5
    }

    fn default_max_history() -> usize {
        50
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            detail_level: Self::default_detail_level(),
            toast_duration_secs: Self::default_toast_duration(),
            max_history: Self::default_max_history(),
        }
    }
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tcms").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            },
        }
    }

    fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed config: {}", e);
            Self::default()
        })
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Effective base URL (CLI > config > environment > default)
    pub fn effective_base_url(&self, cli: Option<&str>) -> String {
        resolve(cli, self.base_url.as_deref(), std::env::var(ENV_BASE_URL).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// Bearer token (CLI > environment); never persisted
    pub fn effective_token(cli: Option<&str>) -> Option<String> {
        resolve(cli, None, std::env::var(ENV_TOKEN).ok())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Remember the active tab and save
    pub fn set_last_tab(&mut self, tab: &str) -> Result<()> {
        self.last_tab = Some(tab.to_string());
        self.save()
    }
}

/// First non-blank value in precedence order
fn resolve(cli: Option<&str>, config: Option<&str>, env: Option<String>) -> Option<String> {
    cli.map(str::to_string)
        .into_iter()
        .chain(config.map(str::to_string))
        .chain(env)
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence() {
        let env = || Some("http://env".to_string());
        assert_eq!(
            resolve(Some("http://cli"), Some("http://file"), env()).as_deref(),
            Some("http://cli")
        );
        assert_eq!(
            resolve(None, Some("http://file"), env()).as_deref(),
            Some("http://file")
        );
        assert_eq!(resolve(None, None, env()).as_deref(), Some("http://env"));
        assert_eq!(resolve(Some("  "), None, None), None);
    }

    #[test]
    fn test_partial_config_gets_defaults() {
        let config = Config::parse(r#"{"last_tab": "email-templates"}"#);
        assert_eq!(config.last_tab.as_deref(), Some("email-templates"));
        assert_eq!(config.cache_ttl_secs, 60);
        assert_eq!(config.notifications.max_history, 50);
        assert_eq!(config.notifications.detail_level, "detailed");
    }

    #[test]
    fn test_malformed_config_falls_back() {
        let config = Config::parse("not json");
        assert!(config.base_url.is_none());
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
    }
}
