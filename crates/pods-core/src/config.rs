use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub player: PlayerConfig,
}

/// Where the read-only podcast catalog lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout. Requests are never retried.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// User-configurable paths for persisted preferences and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding favorites, listening history and the log file.
    /// Defaults to `~/.local/share/pods` (or portable `data/` on Windows).
    #[serde(default = "platform::data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Sort label applied to show lists when none is given on the command line.
    #[serde(default = "default_sort")]
    pub default_sort: String,
    /// Sort label for the favorites listing.
    #[serde(default = "default_favorites_sort")]
    pub favorites_sort: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Extra arguments passed to mpv before the audio URL.
    #[serde(default = "default_mpv_args")]
    pub mpv_args: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: platform::data_dir(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            default_sort: default_sort(),
            favorites_sort: default_favorites_sort(),
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            mpv_args: default_mpv_args(),
        }
    }
}

fn default_base_url() -> String {
    "https://podcast-api.netlify.app".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_sort() -> String {
    "a-z".to_string()
}

fn default_favorites_sort() -> String {
    "newest".to_string()
}

fn default_mpv_args() -> Vec<String> {
    vec!["--no-video".to_string()]
}

impl Config {
    /// Load from the default location, writing a default file on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn log_path(&self) -> PathBuf {
        self.paths.data_dir.join("pods.log")
    }
}
