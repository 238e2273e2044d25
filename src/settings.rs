use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, PoisonError, RwLock};

use crate::pdf::{DEFAULT_MAX_ATTEMPTS, DEFAULT_VIEWPORT_WIDTH, RenderStrategy, ViewerConfig};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "dox";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Multiplier for the first (sharpest) render attempt
    #[serde(default = "default_high_dpi_scale")]
    pub high_dpi_scale: f32,

    /// Layout width while the viewport has no usable size
    #[serde(default = "default_fallback_viewport_width")]
    pub fallback_viewport_width: u32,

    #[serde(default = "default_max_password_attempts")]
    pub max_password_attempts: u32,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_high_dpi_scale() -> f32 {
    RenderStrategy::HIGH_DPI_SCALE
}

fn default_fallback_viewport_width() -> u32 {
    DEFAULT_VIEWPORT_WIDTH
}

fn default_max_password_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            high_dpi_scale: default_high_dpi_scale(),
            fallback_viewport_width: default_fallback_viewport_width(),
            max_password_attempts: default_max_password_attempts(),
            log_level: default_log_level(),
        }
    }
}

impl From<&Settings> for ViewerConfig {
    fn from(settings: &Settings) -> Self {
        let defaults = ViewerConfig::default();
        Self {
            high_dpi_scale: if settings.high_dpi_scale.is_finite() && settings.high_dpi_scale > 0.0
            {
                settings.high_dpi_scale
            } else {
                defaults.high_dpi_scale
            },
            fallback_viewport_width: settings.fallback_viewport_width.max(2),
            max_password_attempts: settings.max_password_attempts.max(1),
        }
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        save_settings_to_path(&current(), &path);
    }
}

/// Replace the global settings with the contents of `path`. Unreadable or
/// malformed files leave the current settings in place.
pub fn load_settings_from_path(path: &Path) {
    match fs::read_to_string(path) {
        Ok(content) => match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");

                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_path(&settings, path);
                }

                *SETTINGS.write().unwrap_or_else(PoisonError::into_inner) = settings;
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
            }
        },
        Err(e) => {
            error!("Failed to read settings file {path:?}: {e}");
        }
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );
    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_path(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::from(SETTINGS_HEADER);

    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str("\n# Scale multiplier for the sharpest render attempt\n");
    content.push_str(&format!("high_dpi_scale: {:?}\n", settings.high_dpi_scale));
    content.push_str("\n# Layout width (pixels) until the window reports its size\n");
    content.push_str(&format!(
        "fallback_viewport_width: {}\n",
        settings.fallback_viewport_width
    ));
    content.push_str("\n# Wrong passwords accepted before an encrypted file is closed\n");
    content.push_str(&format!(
        "max_password_attempts: {}\n",
        settings.max_password_attempts
    ));
    content.push_str("\n# off, error, warn, info, debug or trace\n");
    content.push_str(&format!("log_level: \"{}\"\n", settings.log_level));

    content
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# dox configuration
# ============================================================================
"#;

// Public API for accessing/modifying settings

/// Snapshot of the global settings
pub fn current() -> Settings {
    SETTINGS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn viewer_config() -> ViewerConfig {
    ViewerConfig::from(&current())
}

pub fn get_log_level() -> String {
    SETTINGS
        .read()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| default_log_level())
}

/// Restore defaults in memory without touching the file
pub fn reset_to_defaults() {
    *SETTINGS.write().unwrap_or_else(PoisonError::into_inner) = Settings::default();
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn partial_file_fills_defaults() {
        reset_to_defaults();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 1\nmax_password_attempts: 5\n").unwrap();

        load_settings_from_path(&path);

        let settings = current();
        assert_eq!(settings.max_password_attempts, 5);
        assert_eq!(settings.high_dpi_scale, 2.0);
        assert_eq!(settings.fallback_viewport_width, 800);
        assert_eq!(settings.log_level, "info");
        reset_to_defaults();
    }

    #[test]
    #[serial]
    fn malformed_file_keeps_current_settings() {
        reset_to_defaults();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "max_password_attempts: [not a number\n").unwrap();

        load_settings_from_path(&path);

        assert_eq!(current(), Settings::default());
    }

    #[test]
    #[serial]
    fn old_version_is_migrated_and_rewritten() {
        reset_to_defaults();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "version: 0\nlog_level: debug\n").unwrap();

        load_settings_from_path(&path);

        assert_eq!(current().version, CURRENT_VERSION);
        assert_eq!(get_log_level(), "debug");
        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("version: 1"));
        reset_to_defaults();
    }

    #[test]
    fn generated_yaml_parses_back() {
        let settings = Settings {
            high_dpi_scale: 1.5,
            max_password_attempts: 3,
            ..Settings::default()
        };
        let yaml = generate_settings_yaml(&settings);
        let parsed: Settings = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn viewer_config_sanitizes_values() {
        let settings = Settings {
            high_dpi_scale: -1.0,
            fallback_viewport_width: 0,
            max_password_attempts: 0,
            ..Settings::default()
        };
        let config = ViewerConfig::from(&settings);
        assert_eq!(config.high_dpi_scale, 2.0);
        assert_eq!(config.fallback_viewport_width, 2);
        assert_eq!(config.max_password_attempts, 1);
    }
}
