use crate::camera::CameraSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors from loading a viewer configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Startup configuration. Every field has a default, so a config file
/// only needs the values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window_width: u32,
    pub window_height: u32,
    pub title: String,
    /// Root directory for textures and models.
    pub resources_dir: PathBuf,
    /// Where program state is read at startup and written at shutdown.
    pub state_file: PathBuf,
    pub camera: CameraSettings,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_width: 1600,
            window_height: 900,
            title: "skyisle".into(),
            resources_dir: PathBuf::from("resources"),
            state_file: PathBuf::from("resources/program_state.txt"),
            camera: CameraSettings::default(),
        }
    }
}

impl ViewerConfig {
    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path)?;
        let config: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} must be non-zero",
                self.window_width, self.window_height
            )));
        }
        let cam = &self.camera;
        if !(cam.min_zoom > 0.0 && cam.min_zoom <= cam.max_zoom && cam.max_zoom < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "zoom bounds [{}, {}] must satisfy 0 < min <= max < 180",
                cam.min_zoom, cam.max_zoom
            )));
        }
        if !(cam.speed.is_finite() && cam.sensitivity.is_finite()) {
            return Err(ConfigError::Invalid("camera speed and sensitivity must be finite".into()));
        }
        Ok(())
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}
