//! Configuration file handling for camerpi.
//!
//! Loads configuration from `~/.config/camerpi/config.toml` or a custom path.
//! Every setting has a built-in default, so the file is optional and may be
//! partial. camerpi never writes it.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::capture::SensorMode;

/// Configuration file structure for camerpi.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub still: StillConfig,
    #[serde(default)]
    pub timelapse: TimelapseConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Capture executable to run
    #[serde(default = "default_binary")]
    pub binary: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StillConfig {
    #[serde(default, deserialize_with = "de_sensor_mode")]
    pub mode: SensorMode,
    /// File name passed to `--latest`
    #[serde(default = "default_latest")]
    pub latest: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TimelapseConfig {
    #[serde(default, deserialize_with = "de_sensor_mode")]
    pub mode: SensorMode,
    /// Frame file name pattern passed to `-o`
    #[serde(default = "default_timelapse_output")]
    pub output: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
        }
    }
}

impl Default for StillConfig {
    fn default() -> Self {
        Self {
            mode: SensorMode::default(),
            latest: default_latest(),
        }
    }
}

impl Default for TimelapseConfig {
    fn default() -> Self {
        Self {
            mode: SensorMode::default(),
            output: default_timelapse_output(),
        }
    }
}

fn default_binary() -> String {
    "libcamera-still".to_string()
}

fn default_latest() -> String {
    "latest.jpg".to_string()
}

fn default_timelapse_output() -> String {
    "timelapse_%04d.jpg".to_string()
}

fn de_sensor_mode<'de, D>(deserializer: D) -> Result<SensorMode, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

impl Config {
    /// Load configuration from the default path.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            log::debug!("no config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    /// Load configuration from an explicit path, which must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("camerpi").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/camerpi/config.toml")
        })
}
