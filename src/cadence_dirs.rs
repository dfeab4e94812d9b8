//! Centralized directory paths for cadence.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! # Environment Overrides
//!
//! - `CADENCE_DATA_DIR`: overrides [`data_dir`]
//! - `CADENCE_CONFIG_DIR`: overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the persisted trigger store. Resolves to `dirs::data_dir()/cadence/`
/// by default.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("CADENCE_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("cadence"))
        .unwrap_or_else(|| PathBuf::from("/tmp/cadence-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/cadence/` by default.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("CADENCE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("cadence"))
        .unwrap_or_else(|| PathBuf::from("/tmp/cadence-config"))
}

/// Engine config file path (`config_dir()/engine.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("engine.toml")
}

/// Trigger store file path (`data_dir()/triggers.json`).
#[must_use]
pub fn store_file() -> PathBuf {
    data_dir().join("triggers.json")
}
