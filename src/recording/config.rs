//! Recording configuration types

use serde::{Deserialize, Serialize};

/// Quality presets for video recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordingQuality {
    /// 720p, lower bitrate - good for previews
    Low,
    /// 1080p, standard bitrate - balanced quality
    Medium,
    /// 1080p, high bitrate
    High,
    /// Custom settings
    Custom,
}

impl RecordingQuality {
    /// Recommended bitrate in bits per second
    pub fn bitrate(&self) -> u32 {
        match self {
            RecordingQuality::Low => 2_500_000,
            RecordingQuality::Medium => 5_000_000,
            RecordingQuality::High => 10_000_000,
            RecordingQuality::Custom => 5_000_000,
        }
    }

    /// Recommended resolution (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            RecordingQuality::Low => (1280, 720),
            RecordingQuality::Medium => (1920, 1080),
            RecordingQuality::High => (1920, 1080),
            RecordingQuality::Custom => (1920, 1080),
        }
    }
}

impl Default for RecordingQuality {
    fn default() -> Self {
        RecordingQuality::Medium
    }
}

/// Configuration shared by both recording strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Video width in pixels
    pub width: u32,
    /// Video height in pixels
    pub height: u32,
    /// Frames per second
    pub fps: f64,
    /// Target bitrate in bits per second
    pub bitrate: u32,
    /// Quality preset used
    pub quality: RecordingQuality,
    /// Audio sample rate in Hz
    pub audio_sample_rate: u32,
    /// Audio channel count
    pub audio_channels: u16,
}

impl RecordingConfig {
    /// Create a configuration with explicit dimensions
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            bitrate: 5_000_000,
            quality: RecordingQuality::Custom,
            audio_sample_rate: 48_000,
            audio_channels: 2,
        }
    }

    /// Create a configuration from a quality preset
    pub fn from_quality(quality: RecordingQuality) -> Self {
        let (width, height) = quality.resolution();
        Self {
            width,
            height,
            fps: 30.0,
            bitrate: quality.bitrate(),
            quality,
            audio_sample_rate: 48_000,
            audio_channels: 2,
        }
    }

    /// Override the bitrate
    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = bitrate;
        self
    }

    /// Override the audio format
    pub fn with_audio(mut self, sample_rate: u32, channels: u16) -> Self {
        self.audio_sample_rate = sample_rate;
        self.audio_channels = channels;
        self
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self::from_quality(RecordingQuality::Medium)
    }
}

/// Statistics reported after a recording finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingStats {
    /// Total number of video frames written
    pub video_frames: u64,
    /// Total number of audio buffers written
    pub audio_frames: u64,
    /// Duration in seconds
    pub duration_secs: f64,
    /// Total bytes written to file
    pub bytes_written: u64,
    /// Number of dropped frames (if any)
    pub dropped_frames: u64,
    /// Output file path
    pub output_path: String,
}

impl RecordingStats {
    /// Average bitrate achieved over the recording
    pub fn avg_bitrate(&self) -> f64 {
        if self.duration_secs > 0.0 {
            (self.bytes_written as f64 * 8.0) / self.duration_secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_resolutions() {
        assert_eq!(RecordingQuality::Low.resolution(), (1280, 720));
        assert_eq!(RecordingQuality::Medium.resolution(), (1920, 1080));
    }

    #[test]
    fn test_config_builders() {
        let config = RecordingConfig::new(640, 480, 30.0)
            .with_bitrate(1_000_000)
            .with_audio(44_100, 1);
        assert_eq!(config.width, 640);
        assert_eq!(config.bitrate, 1_000_000);
        assert_eq!(config.audio_sample_rate, 44_100);
        assert_eq!(config.audio_channels, 1);
    }

    #[test]
    fn test_avg_bitrate() {
        let stats = RecordingStats {
            video_frames: 60,
            audio_frames: 100,
            duration_secs: 2.0,
            bytes_written: 1_000_000,
            dropped_frames: 0,
            output_path: "movie.mov".to_string(),
        };
        assert!((stats.avg_bitrate() - 4_000_000.0).abs() < 1.0);
    }

    #[test]
    fn test_zero_duration_bitrate() {
        let stats = RecordingStats {
            video_frames: 0,
            audio_frames: 0,
            duration_secs: 0.0,
            bytes_written: 0,
            dropped_frames: 0,
            output_path: String::new(),
        };
        assert_eq!(stats.avg_bitrate(), 0.0);
    }
}
