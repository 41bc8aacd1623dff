//! Recording session bookkeeping and output file handling

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fixed output filename inside the temporary-files area
pub const RECORDED_FILE_NAME: &str = "movie.mov";

/// Which strategy drives the recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RecordingStrategy {
    /// The platform backend encodes and writes the file itself
    DirectFile,
    /// Raw frames are forwarded to an external frame writer
    FrameWriter,
}

/// One in-progress or completed recording attempt
///
/// Created on the start-recording command; destroyed on stop, cancel, or
/// restart. At most one is active at a time.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    /// Unique id for log correlation
    pub id: Uuid,
    pub strategy: RecordingStrategy,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
}

impl RecordingSession {
    pub fn new(strategy: RecordingStrategy, output_path: PathBuf) -> Self {
        Self {
            id: Uuid::new_v4(),
            strategy,
            output_path,
            started_at: Utc::now(),
        }
    }
}

/// The fixed recording target: `<temp dir>/movie.mov`, overwritten each
/// session
pub fn default_output_path() -> PathBuf {
    std::env::temp_dir().join(RECORDED_FILE_NAME)
}

/// Best-effort removal of a previously recorded file
///
/// A missing file is not an error, and a failed deletion is logged without
/// escalating: a stale file never blocks a new recording.
pub fn remove_stale_recording(path: &Path) {
    if !path.exists() {
        return;
    }
    match fs::remove_file(path) {
        Ok(()) => log::info!("removed stale recording at {:?}", path),
        Err(e) => log::warn!("could not delete stale recording {:?}: {}", path, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_uses_fixed_filename() {
        let path = default_output_path();
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(RECORDED_FILE_NAME)
        );
    }

    #[test]
    fn test_remove_missing_file_is_silent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("does-not-exist.mov");
        // Must not panic or surface an error.
        remove_stale_recording(&path);
    }

    #[test]
    fn test_remove_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(RECORDED_FILE_NAME);
        fs::write(&path, b"stale").expect("write stale file");

        remove_stale_recording(&path);
        assert!(!path.exists());
    }

    #[test]
    fn test_sessions_have_unique_ids() {
        let a = RecordingSession::new(RecordingStrategy::FrameWriter, default_output_path());
        let b = RecordingSession::new(RecordingStrategy::FrameWriter, default_output_path());
        assert_ne!(a.id, b.id);
    }
}
