//! Built-in frame writer producing an MP4 container
//!
//! A concrete [`FrameWriter`] for deployments that want this crate to produce
//! a playable file itself rather than hand frames to an external muxer.
//! Presentation timestamps come straight from the shared capture clock,
//! rebased so the first frame lands at zero.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use muxide::api::{Metadata, MuxerBuilder, VideoCodec};

use super::config::{RecordingConfig, RecordingStats};
use super::encoder::H264Encoder;
use super::writer::{FrameWriter, WriterDelegate};
use crate::errors::CaptureError;
use crate::types::{AudioFrame, VideoFrame};

pub struct MovieWriter {
    encoder: H264Encoder,
    muxer: Option<muxide::api::Muxer<BufWriter<File>>>,
    config: RecordingConfig,
    output_path: PathBuf,
    first_pts: Option<f64>,
    last_pts: f64,
    video_frames: u64,
    audio_frames: u64,
    dropped_frames: u64,
    delegate: Option<Arc<dyn WriterDelegate>>,
}

impl MovieWriter {
    pub fn new<P: AsRef<Path>>(
        output_path: P,
        config: RecordingConfig,
    ) -> Result<Self, CaptureError> {
        let output_path = output_path.as_ref().to_path_buf();

        let file = File::create(&output_path)
            .map_err(|e| CaptureError::IoError(format!("failed to create output file: {}", e)))?;
        let writer = BufWriter::new(file);

        let encoder = H264Encoder::new(config.width, config.height, config.fps, config.bitrate)?;

        let muxer = MuxerBuilder::new(writer)
            .video(VideoCodec::H264, config.width, config.height, config.fps)
            .with_fast_start(true)
            .with_metadata(Metadata::new().with_current_time())
            .build()
            .map_err(|e| CaptureError::MuxingError(format!("failed to create muxer: {}", e)))?;

        Ok(Self {
            encoder,
            muxer: Some(muxer),
            config,
            output_path,
            first_pts: None,
            last_pts: 0.0,
            video_frames: 0,
            audio_frames: 0,
            dropped_frames: 0,
            delegate: None,
        })
    }

    /// Rebase a capture-clock timestamp onto the recording's own time base
    fn rebase(&mut self, timestamp: f64) -> f64 {
        let first = *self.first_pts.get_or_insert(timestamp);
        let pts = (timestamp - first).max(0.0);
        // Timestamps must never run backwards in the container.
        let pts = pts.max(self.last_pts);
        self.last_pts = pts;
        pts
    }

    fn finalize(&mut self) -> Result<RecordingStats, CaptureError> {
        let muxer = self.muxer.take().ok_or_else(|| {
            CaptureError::MuxingError("movie writer already finalized".to_string())
        })?;

        let stats = muxer
            .finish_with_stats()
            .map_err(|e| CaptureError::MuxingError(format!("failed to finalize: {}", e)))?;

        Ok(RecordingStats {
            video_frames: stats.video_frames,
            audio_frames: self.audio_frames,
            duration_secs: stats.duration_secs,
            bytes_written: stats.bytes_written,
            dropped_frames: self.dropped_frames,
            output_path: self.output_path.to_string_lossy().to_string(),
        })
    }
}

impl FrameWriter for MovieWriter {
    fn write_video(&mut self, frame: &VideoFrame) -> Result<(), CaptureError> {
        if self.muxer.is_none() {
            return Err(CaptureError::MuxingError(
                "write after finalize".to_string(),
            ));
        }
        if frame.width != self.config.width || frame.height != self.config.height {
            return Err(CaptureError::EncodingError(format!(
                "frame dimensions {}x{} don't match recording config {}x{}",
                frame.width, frame.height, self.config.width, self.config.height
            )));
        }

        let encoded = self.encoder.encode_rgb(&frame.data)?;
        if encoded.data.is_empty() {
            // The encoder may emit nothing for a frame; skip it.
            self.dropped_frames += 1;
            return Ok(());
        }

        let pts = self.rebase(frame.timestamp);
        if let Some(muxer) = self.muxer.as_mut() {
            muxer
                .write_video(pts, &encoded.data, encoded.is_keyframe)
                .map_err(|e| CaptureError::MuxingError(format!("failed to write frame: {}", e)))?;
        }
        self.video_frames += 1;
        Ok(())
    }

    fn write_audio(&mut self, frame: &AudioFrame) -> Result<(), CaptureError> {
        // The container carries video only; audio buffers share the video
        // time base and are counted for the final stats.
        self.audio_frames += 1;
        log::trace!(
            "audio buffer at {:.3}s ({} samples) noted",
            frame.timestamp,
            frame.samples.len()
        );
        Ok(())
    }

    fn set_delegate(&mut self, delegate: Arc<dyn WriterDelegate>) {
        self.delegate = Some(delegate);
    }

    fn stop(&mut self) {
        if self.muxer.is_none() {
            return;
        }
        let result = self.finalize().map(|stats| {
            log::info!(
                "movie writer finished: {} frames, {:.2}s, {} bytes",
                stats.video_frames,
                stats.duration_secs,
                stats.bytes_written
            );
            self.output_path.clone()
        });
        if let Some(delegate) = self.delegate.take() {
            delegate.writer_did_finish(result);
        } else if let Err(e) = result {
            log::error!("movie writer failed with no delegate attached: {}", e);
        }
    }
}

impl std::fmt::Debug for MovieWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MovieWriter")
            .field("output_path", &self.output_path)
            .field("video_frames", &self.video_frames)
            .field("finalized", &self.muxer.is_none())
            .finish()
    }
}
