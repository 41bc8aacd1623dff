//! Configuration management
//!
//! Session format, recording settings, and storage preferences, loadable from
//! a TOML file and validated before use.

use crate::errors::CaptureError;
use crate::recording::{RecordingConfig, RecordingQuality};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacecapConfig {
    pub session: SessionConfig,
    pub recording: RecordingSettings,
    pub storage: StorageConfig,
}

/// Capture session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Capture resolution [width, height]
    pub resolution: [u32; 2],
    /// Frames per second
    pub fps: f64,
    /// Audio sample rate in Hz
    pub audio_sample_rate: u32,
    /// Audio channel count
    pub audio_channels: u16,
}

/// Recording preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// Quality preset
    pub quality: RecordingQuality,
    /// Target bitrate in bits per second (0 = preset default)
    pub bitrate: u32,
}

/// Storage preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Output directory; empty means the system temporary directory
    pub output_directory: String,
}

impl Default for FacecapConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                resolution: [1280, 720],
                fps: 30.0,
                audio_sample_rate: 48_000,
                audio_channels: 2,
            },
            recording: RecordingSettings {
                quality: RecordingQuality::Medium,
                bitrate: 0,
            },
            storage: StorageConfig {
                output_directory: String::new(),
            },
        }
    }
}

impl FacecapConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            CaptureError::ConfigurationError(format!("failed to read config file: {}", e))
        })?;

        let config: FacecapConfig = toml::from_str(&contents).map_err(|e| {
            CaptureError::ConfigurationError(format!("failed to parse config file: {}", e))
        })?;

        log::info!("loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::ConfigurationError(format!("failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self).map_err(|e| {
            CaptureError::ConfigurationError(format!("failed to serialize config: {}", e))
        })?;

        fs::write(path, toml_string).map_err(|e| {
            CaptureError::ConfigurationError(format!("failed to write config file: {}", e))
        })?;

        log::info!("saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config file path
    pub fn default_path() -> PathBuf {
        PathBuf::from("facecap.toml")
    }

    /// Load from the default location, falling back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        if self.session.resolution[0] == 0 || self.session.resolution[1] == 0 {
            return Err("Invalid capture resolution".to_string());
        }
        if self.session.fps <= 0.0 || self.session.fps > 240.0 {
            return Err("Invalid FPS (must be 1-240)".to_string());
        }
        if self.session.audio_sample_rate == 0 {
            return Err("Invalid audio sample rate".to_string());
        }
        if self.session.audio_channels == 0 || self.session.audio_channels > 8 {
            return Err("Audio channels must be between 1 and 8".to_string());
        }
        Ok(())
    }

    /// Derive the recording configuration for this session setup
    pub fn recording_config(&self) -> RecordingConfig {
        let mut config = RecordingConfig::new(
            self.session.resolution[0],
            self.session.resolution[1],
            self.session.fps,
        )
        .with_audio(self.session.audio_sample_rate, self.session.audio_channels);
        if self.recording.bitrate > 0 {
            config = config.with_bitrate(self.recording.bitrate);
        } else {
            config = config.with_bitrate(self.recording.quality.bitrate());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FacecapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.resolution, [1280, 720]);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = FacecapConfig::default();
        config.session.resolution = [0, 0];
        assert!(config.validate().is_err());

        let mut config = FacecapConfig::default();
        config.session.fps = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("facecap.toml");

        let config = FacecapConfig::default();
        config.save_to_file(&path).expect("save");

        let loaded = FacecapConfig::load_from_file(&path).expect("load");
        assert_eq!(loaded.session.fps, config.session.fps);
        assert_eq!(loaded.session.audio_sample_rate, config.session.audio_sample_rate);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let result = FacecapConfig::load_from_file("nonexistent_facecap.toml");
        assert!(result.is_ok());
        assert_eq!(result.unwrap().session.fps, 30.0);
    }

    #[test]
    fn test_recording_config_uses_preset_bitrate() {
        let config = FacecapConfig::default();
        let recording = config.recording_config();
        assert_eq!(recording.width, 1280);
        assert_eq!(recording.bitrate, RecordingQuality::Medium.bitrate());
    }
}
