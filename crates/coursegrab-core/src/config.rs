//! TOML-based application configuration.
//!
//! Stores the API root and the user's preferred paging/refresh defaults.
//! Configuration is stored at `~/.config/coursegrab/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/coursegrab/config.toml`. Every
/// field has a default, so a missing or partial file is fine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root of the dashboard API, e.g. `http://localhost:8000/api`.
    #[serde(default = "default_api_root")]
    pub api_root: String,
    /// Catalog page size.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Auto-refresh interval for the task table, in seconds.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: f64,
}

fn default_api_root() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_page_size() -> u32 {
    20
}

fn default_refresh_secs() -> f64 {
    5.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            page_size: default_page_size(),
            refresh_secs: default_refresh_secs(),
        }
    }
}

/// Returns `~/.config/coursegrab[-dev]/` based on COURSEGRAB_ENV.
///
/// Set COURSEGRAB_ENV=dev to use a development data directory.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("COURSEGRAB_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("coursegrab-dev")
    } else {
        base_dir.join("coursegrab")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, falling back to defaults when no file
    /// exists yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| {
            Error::DataFormat(format!("bad configuration at {}: {e}", path.display()))
        })
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self)
            .map_err(|e| Error::DataFormat(format!("unserializable configuration: {e}")))?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
