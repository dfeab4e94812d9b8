//! Engine configuration.
//!
//! Everything has a default, so an empty or partial TOML file is valid.

use crate::time::TimeOfDay;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tunables for the reminder engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Width of the near window in seconds.
    ///
    /// A fire time this close to "now" gets a one-shot bootstrap trigger
    /// instead of a repeating one.
    pub near_window_secs: u32,
    /// One-shot fire times closer than this to "now" are nudged forward.
    pub nudge_threshold_secs: u32,
    /// How far a too-close one-shot is nudged, in seconds.
    pub nudge_secs: u32,
    /// Time used for unparsable preference times (`"HH:mm"`).
    pub fallback_time: String,
    /// Maximum live triggers per label for a custom (weekly) category.
    pub custom_cap: usize,
    /// Maximum live triggers per label for a daily category.
    pub daily_cap: usize,
    /// Prefix for persisted keys (`{prefix}.ids.{category}`, `{prefix}.signature`).
    pub key_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            near_window_secs: 300,
            nudge_threshold_secs: 3,
            nudge_secs: 2,
            fallback_time: "09:00".to_owned(),
            custom_cap: 7,
            daily_cap: 1,
            key_prefix: "reminders".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parsed fallback time; a malformed value degrades to 09:00.
    #[must_use]
    pub fn fallback_time(&self) -> TimeOfDay {
        TimeOfDay::parse_or(&self.fallback_time, TimeOfDay::new(9, 0))
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::CadenceError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::CadenceError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config file path: `<config dir>/cadence/engine.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        crate::cadence_dirs::config_file()
    }
}
