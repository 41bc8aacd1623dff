//! Synthetic capture data for offline testing
//!
//! Frame content varies per frame number so temporal paths (encoders, late
//! frame discarding) see realistic change between frames.

use crate::types::{AudioFrame, FaceRegion, NormalizedRect, VideoFrame};

/// Create a synthetic RGB video frame with a per-frame gradient pattern
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32, fps: f64) -> VideoFrame {
    let mut data = vec![0u8; (width * height * 3) as usize];

    let base = (frame_number % 256) as u8;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y * width + x) * 3) as usize;
            data[idx] = base.wrapping_add((x % 256) as u8);
            data[idx + 1] = base.wrapping_add((y % 256) as u8);
            data[idx + 2] = base.wrapping_add(((x + y) % 256) as u8);
        }
    }

    let timestamp = frame_number as f64 / fps;
    VideoFrame::new(data, width, height, timestamp, "synthetic".to_string())
}

/// Create a synthetic audio buffer: a 440Hz sine at moderate amplitude
pub fn synthetic_audio_frame(frame_number: u64, samples_per_frame: usize) -> AudioFrame {
    let sample_rate = 48_000.0;
    let frequency = 440.0;
    let channels = 2usize;

    let mut samples = vec![0.0f32; samples_per_frame * channels];
    for i in 0..samples_per_frame {
        let t = (frame_number as f64 * samples_per_frame as f64 + i as f64) / sample_rate;
        let value = (2.0 * std::f64::consts::PI * frequency * t).sin() as f32 * 0.3;
        samples[i * channels] = value;
        samples[i * channels + 1] = value;
    }

    AudioFrame {
        samples,
        sample_rate: 48_000,
        channels: 2,
        timestamp: (frame_number as f64 * samples_per_frame as f64) / sample_rate,
    }
}

/// Create a synthetic face region drifting slowly across the frame
pub fn synthetic_face_region(frame_number: u64) -> FaceRegion {
    let drift = (frame_number % 100) as f32 / 1000.0;
    FaceRegion {
        bounds: NormalizedRect::new(0.3 + drift, 0.25, 0.25, 0.33),
        tracking_id: Some(1),
        timestamp: frame_number as f64 / 30.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_frame_size_and_timestamp() {
        let frame = synthetic_video_frame(30, 320, 240, 30.0);
        assert_eq!(frame.data.len(), 320 * 240 * 3);
        assert!((frame.timestamp - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_video_frames_differ() {
        let a = synthetic_video_frame(0, 64, 64, 30.0);
        let b = synthetic_video_frame(1, 64, 64, 30.0);
        assert_ne!(a.data[0], b.data[0]);
    }

    #[test]
    fn test_audio_has_signal_without_clipping() {
        let frame = synthetic_audio_frame(0, 960);
        let peak = frame.samples.iter().map(|s| s.abs()).fold(0.0, f32::max);
        assert!(peak > 0.1, "audio should carry signal, got {}", peak);
        assert!(peak < 0.5, "audio shouldn't clip, got {}", peak);
    }

    #[test]
    fn test_face_regions_stay_normalized() {
        for n in 0..200 {
            let face = synthetic_face_region(n);
            assert!(face.bounds.x + face.bounds.width <= 1.0);
            assert!(face.bounds.y + face.bounds.height <= 1.0);
        }
    }
}
