//! Built-in movie writer integration
//!
//! Run with: cargo test --test movie_writer_test --features recording

use std::sync::{Arc, Mutex};

use facecap::recording::{FrameWriter, MovieWriter, RecordingConfig, WriterDelegate};
use facecap::testing::synthetic_video_frame;
use facecap::CaptureError;

struct CapturedResult {
    result: Mutex<Option<Result<std::path::PathBuf, CaptureError>>>,
}

impl WriterDelegate for CapturedResult {
    fn writer_did_finish(&self, result: Result<std::path::PathBuf, CaptureError>) {
        *self.result.lock().unwrap() = Some(result);
    }
}

#[test]
fn test_movie_writer_produces_playable_container() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("movie.mov");

    let config = RecordingConfig::new(320, 240, 30.0);
    let mut writer = MovieWriter::new(&path, config).expect("writer");

    for i in 0..30 {
        let frame = synthetic_video_frame(i, 320, 240, 30.0);
        writer.write_video(&frame).expect("frame write");
    }

    let delegate = Arc::new(CapturedResult {
        result: Mutex::new(None),
    });
    writer.set_delegate(delegate.clone());
    writer.stop();

    let finished = delegate
        .result
        .lock()
        .unwrap()
        .take()
        .expect("completion delivered")
        .expect("successful finalize");
    assert_eq!(finished, path);

    let len = std::fs::metadata(&path).expect("output exists").len();
    assert!(len > 1000, "container should hold encoded frames, got {} bytes", len);
}

#[test]
fn test_movie_writer_counts_audio_buffers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("movie.mov");

    let mut writer =
        MovieWriter::new(&path, RecordingConfig::new(320, 240, 30.0)).expect("writer");

    let audio = facecap::testing::synthetic_audio_frame(0, 960);
    writer.write_audio(&audio).expect("audio write");
    writer.write_video(&synthetic_video_frame(0, 320, 240, 30.0)).expect("video write");
    writer.stop();
}
