//! Configuration for reach label extraction.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration for the labelling pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Acquisition rate of the behaviour trace in Hz
    pub sample_rate_hz: f64,

    /// Names of the behaviour channels
    pub channels: ChannelConfig,

    /// How analog channels are turned into binary ones
    pub binarise: BinariseMode,

    /// Camera views used for reach-onset detection
    pub camera_views: Vec<CameraView>,

    /// Path for storing the processing log
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reach-labels");

        Self {
            sample_rate_hz: 1000.0,
            channels: ChannelConfig::default(),
            binarise: BinariseMode::default(),
            camera_views: vec![
                CameraView::new("LeftCam", ViewSide::Left),
                CameraView::new("RightCam", ViewSide::Right),
            ],
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a specific file, falling back to defaults if absent.
    pub fn load_from(config_path: &std::path::Path) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reach-labels")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Path of the persisted processing log.
    pub fn processing_log_path(&self) -> PathBuf {
        self.data_path.join("processing.json")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate_hz > 0.0) {
            return Err(ConfigError::ParseError(format!(
                "sample_rate_hz must be positive (got {})",
                self.sample_rate_hz
            )));
        }
        Ok(())
    }
}

/// Behaviour trace channel names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// LED cue channel
    pub cue: String,
    /// Channel carrying the cue on recordings made before the sensor upgrade
    pub cue_fallback: String,
    /// Probe sync channel that can bleed into the cue channel
    pub sync: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            cue: "/'ReachLEDs'/'0'".to_string(),
            cue_fallback: "/'Back_Sensor'/'0'".to_string(),
            sync: "/'NpxlSync_Signal'/'0'".to_string(),
        }
    }
}

/// Threshold used to binarise analog channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "mode", content = "value")]
pub enum BinariseMode {
    /// Halfway between each channel's minimum and maximum
    #[default]
    Midpoint,
    /// A fixed voltage for all channels
    Fixed(f64),
}

/// Which side of the reaching box a camera films from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSide {
    Left,
    Right,
}

/// A camera view with its tracking project name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraView {
    pub name: String,
    pub side: ViewSide,
}

impl CameraView {
    pub fn new(name: impl Into<String>, side: ViewSide) -> Self {
        Self {
            name: name.into(),
            side,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sample_rate_hz, 1000.0);
        assert_eq!(config.binarise, BinariseMode::Midpoint);
        assert_eq!(config.camera_views.len(), 2);
        assert_eq!(config.camera_views[0].side, ViewSide::Left);
        assert_eq!(config.channels.cue, "/'ReachLEDs'/'0'");
    }

    #[test]
    fn test_json_roundtrip() {
        let mut config = Config::default();
        config.binarise = BinariseMode::Fixed(2.5);
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.binarise, BinariseMode::Fixed(2.5));
        assert_eq!(parsed.camera_views, config.camera_views);
        assert_eq!(parsed.channels.sync, config.channels.sync);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("reach-labels-test-no-such-config.json");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.sample_rate_hz, 1000.0);
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let path = std::env::temp_dir().join("reach-labels-test-bad-rate.json");
        let mut config = Config::default();
        config.sample_rate_hz = 0.0;
        std::fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();

        let result = Config::load_from(&path);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
        let _ = std::fs::remove_file(&path);
    }
}
