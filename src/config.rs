// SPDX-License-Identifier: GPL-3.0-only

//! User configuration
//!
//! Stored as JSON at `<config_dir>/inapp-camera/config.json`. A missing file
//! yields defaults; unknown or missing fields fall back to their defaults too.

use crate::backends::camera::Lens;
use crate::constants::{BitratePreset, platform};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const APP_DIR: &str = "inapp-camera";
const CONFIG_FILE: &str = "config.json";

/// Recording format settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    /// Upper bound on the recorded width
    pub max_width: u32,
    /// Upper bound on the recorded height
    pub max_height: u32,
    /// Recording framerate
    pub framerate: u32,
    /// Encoder bitrate preset
    pub bitrate_preset: BitratePreset,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            max_width: 400,
            max_height: 400,
            framerate: 10,
            bitrate_preset: BitratePreset::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Device node for the front lens; `None` uses a test pattern
    pub front_device: Option<String>,
    /// Device node for the back lens; `None` uses a test pattern
    pub back_device: Option<String>,
    /// Lens selected when the session starts
    pub default_lens: Lens,
    /// Root below which `DCIM/InAppCamera/` is created
    pub output_root: Option<PathBuf>,
    /// Platform level; levels at or below 28 need an explicit storage grant
    pub platform_level: u32,
    /// Record the microphone alongside video
    pub record_audio: bool,
    pub video: VideoSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            front_device: Some("/dev/video0".to_string()),
            back_device: None,
            default_lens: Lens::Front,
            output_root: None,
            platform_level: platform::DEFAULT_LEVEL,
            record_audio: true,
            video: VideoSettings::default(),
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load from `path`; a missing file gives the defaults
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Load from the default location, logging and falling back to defaults on error
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            warn!("No configuration directory, using defaults");
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => {
                info!(path = %path.display(), "Configuration loaded");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable configuration");
                Self::default()
            }
        }
    }

    /// Write to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Write to the default location
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Root directory for recordings
    pub fn output_root(&self) -> PathBuf {
        self.output_root
            .clone()
            .unwrap_or_else(crate::storage::default_output_root)
    }
}
