//! Application configuration management.
//!
//! Tuning knobs for the cache and retry layers plus the location of the
//! durable store. Configuration lives at
//! `~/.config/trainerdock/config.json`; the durable store and the legacy
//! flat store live in the platform data directory.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "trainerdock";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Durable store document name
const STORAGE_FILE: &str = "app_data.json";

/// Flat store document written by pre-0.3 releases, migrated on startup
const LEGACY_STORAGE_FILE: &str = "local_storage.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long cached catalog pages and search results stay servable.
    pub cache_ttl_minutes: i64,
    /// Maximum attempts per backend call.
    pub max_retries: u32,
    /// Base backoff delay between attempts, in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Override for the data directory (used by tests and portable installs).
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: crate::cache::CACHE_TTL_MINUTES,
            max_retries: crate::retry::DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: crate::retry::DEFAULT_BASE_DELAY.as_millis() as u64,
            data_dir: None,
        }
    }
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

    fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Path of the structured durable store.
    pub fn storage_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(STORAGE_FILE))
    }

    /// Path of the legacy flat store, if an older release left one behind.
    pub fn legacy_storage_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join(LEGACY_STORAGE_FILE))
    }

    pub fn retry_base_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cache_ttl_minutes)
    }
}
