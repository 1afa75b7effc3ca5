//! Configuration settings

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::scanner::DEFAULT_PREVIEW_CHARS;

/// Error-variable fragments recognised when nothing is configured
pub const DEFAULT_ERROR_VARIABLES: &[&str] = &["err", "error"];

/// Config file names probed by [`Settings::discover`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &["errfold.toml", ".errfold.toml"];

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Guard header detection
    pub detection: DetectionSettings,
    /// Result cache and debounce timing
    pub cache: CacheSettings,
    /// Collapsed preview rendering
    pub display: DisplaySettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Look for a config file in `dir`.
    ///
    /// Returns `Ok(None)` when none of [`CONFIG_FILE_NAMES`] exists.
    pub fn discover(dir: &Path) -> Result<Option<Self>> {
        for name in CONFIG_FILE_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Self::load(&candidate).map(Some);
            }
        }
        Ok(None)
    }
}

/// Guard header detection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Substrings that mark a condition variable as an error variable
    pub error_variables: Vec<String>,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            error_variables: DEFAULT_ERROR_VARIABLES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Result cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Age after which a cached scan is stale even if the version matches
    pub ttl_ms: u64,
    /// Quiet period before a debounced rescan fires
    pub debounce_ms: u64,
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_ms: 5000,
            debounce_ms: 300,
        }
    }
}

/// Preview rendering settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Body characters kept in `collapsed_text` before the ellipsis
    pub max_preview_chars: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            max_preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}
