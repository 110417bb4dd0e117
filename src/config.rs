// SPDX-License-Identifier: GPL-3.0-only

//! User preferences that persist between page loads.
//!
//! The preference file is a small JSON document with camelCase keys, matching
//! what the extension's control surface writes:
//!
//! ```json
//! { "keyboardEnabled": true, "showOnFocus": true, "autoHide": true }
//! ```
//!
//! Missing keys fall back to their defaults, so an empty object or a file
//! written by an older version still loads.

use crate::app_settings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Config
// ============================================================================

/// User configuration for the keyboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Gate for all showing behavior. Defaults to `true` on first install.
    pub keyboard_enabled: bool,
    /// Open the keyboard automatically when a text field gains focus.
    pub show_on_focus: bool,
    /// Close the keyboard on clicks outside of it.
    pub auto_hide: bool,
    /// Undo snapshots kept per field.
    pub history_limit: usize,
    /// Characters shown in the preview header before truncation.
    pub preview_max_length: usize,
    /// Timer tuning.
    pub timings: Timings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            keyboard_enabled: true,
            show_on_focus: true,
            auto_hide: true,
            history_limit: app_settings::HISTORY_LIMIT,
            preview_max_length: app_settings::PREVIEW_MAX_LENGTH,
            timings: Timings::default(),
        }
    }
}

/// Timer durations, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Timings {
    pub double_fire_ms: u64,
    pub repeat_delay_ms: u64,
    pub repeat_interval_ms: u64,
    pub outside_click_grace_ms: u64,
    pub direct_control_ms: u64,
    pub preview_debounce_ms: u64,
    pub selection_throttle_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            double_fire_ms: app_settings::DOUBLE_FIRE_WINDOW_MS,
            repeat_delay_ms: app_settings::REPEAT_DELAY_MS,
            repeat_interval_ms: app_settings::REPEAT_INTERVAL_MS,
            outside_click_grace_ms: app_settings::OUTSIDE_CLICK_GRACE_MS,
            direct_control_ms: app_settings::DIRECT_CONTROL_MS,
            preview_debounce_ms: app_settings::PREVIEW_DEBOUNCE_MS,
            selection_throttle_ms: app_settings::SELECTION_THROTTLE_MS,
        }
    }
}

impl Timings {
    pub fn double_fire(&self) -> Duration {
        Duration::from_millis(self.double_fire_ms)
    }

    pub fn repeat_delay(&self) -> Duration {
        Duration::from_millis(self.repeat_delay_ms)
    }

    /// Never zero; tokio intervals need a period.
    pub fn repeat_interval(&self) -> Duration {
        Duration::from_millis(self.repeat_interval_ms.max(1))
    }

    pub fn outside_click_grace(&self) -> Duration {
        Duration::from_millis(self.outside_click_grace_ms)
    }

    pub fn direct_control(&self) -> Duration {
        Duration::from_millis(self.direct_control_ms)
    }

    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }

    pub fn selection_throttle(&self) -> Duration {
        Duration::from_millis(self.selection_throttle_ms.max(1))
    }

    /// Rejects periods that must not be zero.
    ///
    /// # Returns
    ///
    /// The camelCase key of the first offending value.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.repeat_interval_ms == 0 {
            return Err("repeatIntervalMs");
        }
        if self.selection_throttle_ms == 0 {
            return Err("selectionThrottleMs");
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Errors that can occur while loading or saving preferences.
#[derive(Debug)]
pub enum ConfigError {
    /// Reading or writing the preference file failed.
    Io {
        source: std::io::Error,
        path: PathBuf,
    },
    /// The preference file is not valid JSON for `Config`.
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    /// The preference file holds a value the keyboard cannot run with.
    Invalid { key: &'static str, path: PathBuf },
    /// No location could be derived for the preference file.
    NoConfigDir,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { source, path } => {
                write!(f, "preference file {}: {}", path.display(), source)
            }
            ConfigError::Json { source, path } => {
                write!(f, "malformed preference file {}: {}", path.display(), source)
            }
            ConfigError::Invalid { key, path } => {
                write!(f, "preference file {}: {} must be greater than zero", path.display(), key)
            }
            ConfigError::NoConfigDir => {
                write!(f, "cannot locate a config directory (set {})", app_settings::CONFIG_PATH_ENV)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Invalid { .. } | ConfigError::NoConfigDir => None,
        }
    }
}

// ============================================================================
// Preference Store
// ============================================================================

/// Reads and writes `Config` as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Creates a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Resolves the default location.
    ///
    /// `KLAVYE_CONFIG` wins, otherwise `klavye/config.json` under the
    /// platform config directory (`$XDG_CONFIG_HOME` or `~/.config` on Linux).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(
            std::env::var_os(app_settings::CONFIG_PATH_ENV).map(PathBuf::from),
            dirs::config_dir(),
        )
    }

    fn resolve(
        override_path: Option<PathBuf>,
        config_dir: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = override_path {
            return Ok(Self::new(path));
        }

        let base = config_dir.ok_or(ConfigError::NoConfigDir)?;
        Ok(Self::new(
            base.join(app_settings::CONFIG_DIR_NAME)
                .join(app_settings::CONFIG_FILE_NAME),
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the configuration. A missing file yields the defaults.
    pub fn load(&self) -> Result<Config, ConfigError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No preference file at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    source,
                    path: self.path.clone(),
                });
            }
        };

        let config: Config = serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            source,
            path: self.path.clone(),
        })?;
        config.timings.validate().map_err(|key| ConfigError::Invalid {
            key,
            path: self.path.clone(),
        })?;
        Ok(config)
    }

    /// Writes the configuration, creating parent directories as needed.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            source,
            path: self.path.clone(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Json {
            source,
            path: self.path.clone(),
        })?;
        fs::write(&self.path, json).map_err(io_err)?;

        tracing::debug!(
            "Preferences saved to {} (enabled={})",
            self.path.display(),
            config.keyboard_enabled
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Defaults match the first-install values
    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.keyboard_enabled);
        assert!(config.show_on_focus);
        assert!(config.auto_hide);
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.preview_max_length, 100);
        assert_eq!(config.timings.double_fire_ms, 150);
    }

    /// The persisted flag uses the extension's key name
    #[test]
    fn test_camel_case_keys() {
        let config = Config {
            keyboard_enabled: false,
            ..Config::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"keyboardEnabled\":false"));
        assert!(json.contains("\"doubleFireMs\":150"));
    }

    /// Partial documents fill the rest from defaults
    #[test]
    fn test_partial_document() {
        let config: Config = serde_json::from_str(r#"{"keyboardEnabled": false}"#).unwrap();
        assert!(!config.keyboard_enabled);
        assert!(config.auto_hide);
        assert_eq!(config.timings, Timings::default());
    }

    /// Missing file loads defaults
    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("absent.json"));
        assert_eq!(store.load().unwrap(), Config::default());
    }

    /// Save then load keeps the toggle, creating directories on the way
    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let store = PreferenceStore::new(dir.path().join("nested").join("config.json"));

        let config = Config {
            keyboard_enabled: false,
            auto_hide: false,
            ..Config::default()
        };
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap(), config);
    }

    /// Zero periods are refused at load time and clamped when set in code
    #[test]
    fn test_zero_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"timings":{"repeatIntervalMs":0}}"#).unwrap();

        let err = PreferenceStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "repeatIntervalMs", .. }));
        assert!(err.to_string().contains("repeatIntervalMs"));

        let timings = Timings {
            repeat_interval_ms: 0,
            selection_throttle_ms: 0,
            ..Timings::default()
        };
        assert_eq!(timings.repeat_interval(), Duration::from_millis(1));
        assert_eq!(timings.selection_throttle(), Duration::from_millis(1));
        assert_eq!(timings.validate(), Err("repeatIntervalMs"));
    }

    /// The override path wins over the platform config directory
    #[test]
    fn test_resolve_location() {
        let store = PreferenceStore::resolve(
            Some(PathBuf::from("/tmp/custom.json")),
            Some(PathBuf::from("/home/ada/.config")),
        )
        .unwrap();
        assert_eq!(store.path(), Path::new("/tmp/custom.json"));

        let store = PreferenceStore::resolve(None, Some(PathBuf::from("/home/ada/.config"))).unwrap();
        assert_eq!(store.path(), Path::new("/home/ada/.config/klavye/config.json"));

        assert!(matches!(
            PreferenceStore::resolve(None, None),
            Err(ConfigError::NoConfigDir)
        ));
    }

    /// Malformed JSON reports the path
    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = PreferenceStore::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().contains("config.json"));
    }
}
