//! Configuration management for OH.
//!
//! Loads configuration from ${OH_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the backend base URL.
pub const BACKEND_URL_ENV: &str = "OH_BACKEND_BASE_URL";

/// Returns the default config template with comments.
///
/// This is embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

pub mod paths {
    //! Path resolution for OH configuration and data directories.
    //!
    //! OH_HOME resolution order:
    //! 1. OH_HOME environment variable (if set)
    //! 2. ~/.config/oh (default)

    use std::path::PathBuf;

    /// Returns the OH home directory.
    ///
    /// Checks OH_HOME env var first, falls back to ~/.config/oh
    pub fn oh_home() -> PathBuf {
        if let Ok(home) = std::env::var("OH_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("oh"))
            .unwrap_or_else(|| PathBuf::from(".oh"))
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        oh_home().join("config.toml")
    }

    /// Returns the path to the stored OAuth credentials.
    pub fn auth_path() -> PathBuf {
        oh_home().join("auth.json")
    }

    /// Returns the directory for log files.
    pub fn log_dir() -> PathBuf {
        oh_home().join("logs")
    }
}

/// Split orientation of the two-pane layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Regions side by side; the handle is a vertical bar.
    #[default]
    Horizontal,
    /// Regions stacked; the handle is a horizontal bar.
    Vertical,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Host (and optional scheme) of the backend, e.g. `localhost:3000`.
    pub base_url: Option<String>,
    /// Consecutive reconnect attempts before giving up (unset = forever).
    pub reconnect_attempts: Option<u32>,
    /// First reconnect delay in milliseconds.
    pub reconnect_delay_ms: u64,
    /// Upper bound for the reconnect delay in milliseconds.
    pub reconnect_delay_max_ms: u64,
}

impl BackendConfig {
    pub const DEFAULT_BASE_URL: &str = "localhost:3000";

    /// Returns the backend base URL: env var, then config, then default.
    pub fn effective_base_url(&self) -> String {
        resolve_base_url(std::env::var(BACKEND_URL_ENV).ok(), self.base_url.as_deref())
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn reconnect_delay_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_max_ms.max(self.reconnect_delay_ms))
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            reconnect_attempts: None,
            reconnect_delay_ms: 1000,
            reconnect_delay_max_ms: 5000,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn resolve_base_url(env: Option<String>, configured: Option<&str>) -> String {
    non_empty(env.as_deref())
        .or_else(|| non_empty(configured))
        .unwrap_or(BackendConfig::DEFAULT_BASE_URL)
        .to_string()
}

/// Split-pane layout settings, in terminal cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub orientation: Orientation,
    /// Initial size of the first (chat) region.
    pub initial_size: u16,
    /// Minimum width of the first region when side by side.
    pub horizontal_min: u16,
    /// Maximum width of the first region as a fraction of the viewport.
    pub horizontal_max_ratio: f32,
    /// Minimum height of the first region when stacked.
    pub vertical_min: u16,
    /// Minimum height of the second region when stacked.
    pub vertical_second_min: u16,
    /// Maximum height of the first region as a fraction of the viewport.
    pub vertical_max_ratio: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            orientation: Orientation::Horizontal,
            initial_size: 60,
            horizontal_min: 40,
            horizontal_max_ratio: 0.5,
            vertical_min: 8,
            vertical_second_min: 8,
            vertical_max_ratio: 0.7,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `OH_LOG` is unset (e.g. "info", "oh_core=debug").
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings.
    pub backend: BackendConfig,

    /// Split-pane layout settings.
    pub layout: LayoutConfig,

    /// Logging settings.
    pub log: LogConfig,
}

impl Config {
    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Creates a default config file at the given path.
    /// Returns an error if the file already exists.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        Self::write_config(path, default_config_template())
    }

    /// Writes config content to a file, creating parent directories as needed.
    /// Uses atomic write (temp file + rename) to prevent corruption.
    fn write_config(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let tmp_path = path.with_extension("toml.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("Failed to write config to {}", tmp_path.display()))?;
        fs::rename(&tmp_path, path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            )
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.backend.base_url, None);
        assert_eq!(config.backend.reconnect_delay_ms, 1000);
        assert_eq!(config.layout.orientation, Orientation::Horizontal);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "[layout]\norientation = \"vertical\"\nvertical_min = 12\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.layout.orientation, Orientation::Vertical);
        assert_eq!(config.layout.vertical_min, 12);
        assert_eq!(config.layout.vertical_second_min, 8);
        assert_eq!(config.backend.reconnect_delay_max_ms, 5000);
    }

    #[test]
    fn test_init_creates_config_from_template() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::init(&config_path).unwrap();

        assert!(config_path.exists());
        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# OH Configuration"));
        assert!(contents.contains("[backend]"));

        // The template must parse back into the defaults.
        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.layout.horizontal_min, 40);
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(&config_path, "").unwrap();

        let result = Config::init(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_base_url_env_wins_over_config() {
        assert_eq!(
            resolve_base_url(Some("remote:8000".into()), Some("config:1")),
            "remote:8000"
        );
    }

    #[test]
    fn test_base_url_blank_values_fall_through() {
        assert_eq!(resolve_base_url(Some("  ".into()), Some("config:1")), "config:1");
        assert_eq!(resolve_base_url(None, Some("")), "localhost:3000");
        assert_eq!(resolve_base_url(None, None), "localhost:3000");
    }

    #[test]
    fn test_reconnect_delay_max_never_below_base() {
        let backend = BackendConfig {
            reconnect_delay_ms: 3000,
            reconnect_delay_max_ms: 100,
            ..Default::default()
        };
        assert_eq!(backend.reconnect_delay_max(), Duration::from_millis(3000));
    }
}
