use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UpscaleError};

pub const DEFAULT_PYTHON_RUNTIME: &str = "/environment/miniconda3/envs/video_4k/bin/python";
pub const DEFAULT_INFERENCE_SCRIPT: &str = "inference_realesrgan_video.py";

/// Collaborator locations and encoding settings, loadable from YAML.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpscaleConfig {
    pub python_runtime: PathBuf,
    pub inference_script: PathBuf,
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    /// Promote collaborator failures to hard errors.
    pub strict: bool,
    pub crop: CropSettings,
}

impl Default for UpscaleConfig {
    fn default() -> Self {
        Self {
            python_runtime: PathBuf::from(DEFAULT_PYTHON_RUNTIME),
            inference_script: PathBuf::from(DEFAULT_INFERENCE_SCRIPT),
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
            strict: false,
            crop: CropSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CropSettings {
    pub hwaccel: Option<String>,
    pub codec: String,
    pub pixel_format: String,
    pub loglevel: String,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            hwaccel: Some("cuda".to_string()),
            codec: "libx264".to_string(),
            pixel_format: "yuv420p".to_string(),
            loglevel: "error".to_string(),
        }
    }
}

impl UpscaleConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            UpscaleError::Config(format!(
                "Failed to read config file {}: {err}",
                path.display()
            ))
        })?;
        let location = path.display();
        Self::from_yaml(&content).map_err(|err| match err {
            UpscaleError::Config(msg) => UpscaleError::Config(format!("{msg} ({location})")),
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: UpscaleConfig = serde_yaml::from_str(content)
            .map_err(|err| UpscaleError::Config(format!("Failed to parse config YAML: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.crop.codec.trim().is_empty() {
            return Err(UpscaleError::Config("crop.codec cannot be empty".into()));
        }
        if self.crop.pixel_format.trim().is_empty() {
            return Err(UpscaleError::Config("crop.pixel_format cannot be empty".into()));
        }
        if self.python_runtime.as_os_str().is_empty() {
            return Err(UpscaleError::Config("python_runtime cannot be empty".into()));
        }
        Ok(())
    }
}
