// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::types::{CameraBackendType, Facing};
use crate::constants::{storage as storage_consts, ui as ui_consts};
use crate::errors::{AppError, AppResult};
use crate::flash::FlashMode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// File format of saved photos
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum PhotoOutputFormat {
    #[default]
    Jpeg,
    Png,
}

/// Frame source for the virtual backend
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum VirtualSourceConfig {
    /// Animated color bars
    #[default]
    TestPattern,
    /// Still image at the given path
    Image(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder created under the Pictures directory
    pub save_folder: String,
    /// Absolute directory overriding `save_folder`
    pub photo_directory: Option<PathBuf>,
    /// Saved photo format
    pub output_format: PhotoOutputFormat,
    /// Capture quality forwarded with every capture (0.0 - 1.0)
    pub capture_quality: f32,
    /// Keep the sensor's raw orientation
    pub skip_processing: bool,
    /// Camera facing at startup
    pub default_facing: Facing,
    /// Flash mode at startup
    pub default_flash: FlashMode,
    /// Show failures on the status line in addition to logging them
    pub show_error_notices: bool,
    /// How long status line notices stay visible
    pub notice_duration_ms: u64,
    /// Camera backend to use (V4L2 or virtual)
    pub backend: CameraBackendType,
    /// What the virtual backend shows
    pub virtual_source: VirtualSourceConfig,
    /// Mirror the front camera preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Save front camera photos mirrored, as seen in the preview
    pub mirror_front_camera: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_folder: storage_consts::DEFAULT_SAVE_FOLDER.to_string(),
            photo_directory: None,
            output_format: PhotoOutputFormat::default(),
            capture_quality: 1.0,
            skip_processing: false,
            default_facing: Facing::default(),
            default_flash: FlashMode::default(),
            show_error_notices: true,
            notice_duration_ms: ui_consts::DEFAULT_NOTICE_DURATION_MS,
            backend: CameraBackendType::default(),
            virtual_source: VirtualSourceConfig::default(),
            mirror_preview: true,
            mirror_front_camera: false,
        }
    }
}

impl Config {
    /// Default config file location (`$XDG_CONFIG_HOME/polaroid/config.json`)
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("polaroid").join("config.json"))
    }

    /// Load the user's config, falling back to defaults on any problem
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            debug!("No config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load a config file; missing fields take their defaults
    pub fn load_from(path: &Path) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&text)?;
        config.validated()
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    fn validated(self) -> AppResult<Self> {
        if !(0.0..=1.0).contains(&self.capture_quality) {
            return Err(AppError::Config(format!(
                "capture_quality must be between 0.0 and 1.0, got {}",
                self.capture_quality
            )));
        }
        if self.photo_directory.is_none() && self.save_folder.trim().is_empty() {
            return Err(AppError::Config("save_folder must not be empty".into()));
        }
        Ok(self)
    }

    /// Directory photos are saved to
    pub fn photo_directory(&self) -> PathBuf {
        match &self.photo_directory {
            Some(dir) => dir.clone(),
            None => crate::storage::photo_directory(&self.save_folder),
        }
    }

    pub fn notice_duration(&self) -> Duration {
        Duration::from_millis(self.notice_duration_ms)
    }
}
