//! Configuration management (`aurafx.toml`)
//!
//! Settings are stored in TOML format in the platform-specific config
//! directory. Every section falls back to defaults field by field.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sync::DEFAULT_MAX_FRAME_BYTES;

/// File name inside [`config_dir`]
pub const CONFIG_FILE: &str = "aurafx.toml";

/// File name of the authored store inside [`data_dir`]
pub const AUTHORED_FILE: &str = "authored.afxa";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(#[from] std::io::Error),
}

/// Node configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FxConfig {
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Editing preview settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Quiet period before a preview rebuild (default: 100)
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

/// Sync framing limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Largest accepted frame payload (default: 4 MiB)
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Authored store location (default: `<data_dir>/authored.afxa`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authored_path: Option<PathBuf>,
    /// Built-in pack to load at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_pack: Option<PathBuf>,
}

fn default_debounce_ms() -> u64 {
    100
}
fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl PreviewConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl StorageConfig {
    /// Configured authored store path, or the default under [`data_dir`].
    pub fn authored_path(&self) -> Option<PathBuf> {
        self.authored_path
            .clone()
            .or_else(|| data_dir().map(|dir| dir.join(AUTHORED_FILE)))
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Linux: `~/.config/Aurafx`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.aurafx", "", "Aurafx")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Returns the platform-specific data directory for the authored store.
pub fn data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.aurafx", "", "Aurafx")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

/// Loads the configuration from disk.
///
/// Returns default values if the file doesn't exist or cannot be parsed.
pub fn load() -> FxConfig {
    let Some(path) = config_dir().map(|dir| dir.join(CONFIG_FILE)) else {
        return FxConfig::default();
    };
    match load_from(&path) {
        Ok(config) => config,
        Err(ConfigError::Read { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            FxConfig::default()
        }
        Err(e) => {
            tracing::warn!("Using default config: {}", e);
            FxConfig::default()
        }
    }
}

/// Loads the configuration from `path`.
pub fn load_from(path: &Path) -> Result<FxConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Saves the configuration to the platform's configuration directory.
///
/// Creates the directory if it doesn't exist.
pub fn save(config: &FxConfig) -> Result<(), ConfigError> {
    if let Some(dir) = config_dir() {
        save_to(config, &dir.join(CONFIG_FILE))?;
    }
    Ok(())
}

/// Saves the configuration to `path`.
pub fn save_to(config: &FxConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
