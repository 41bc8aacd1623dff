//! Direct-file recording strategy
//!
//! The platform backend encodes and writes frames to the target file without
//! passing them through application code. Completion is asynchronous: the
//! result, success or failure, is delivered on the sink's fixed queue.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::CaptureError;
use crate::orientation::VideoConnection;
use crate::queues::SerialQueue;

/// Opaque movie-file backend driven by the capture hardware
pub trait MovieFileOutput: Send {
    /// Start encoding to the given path
    fn begin(&mut self, path: &Path) -> Result<(), CaptureError>;

    /// Stop encoding and finalize the file
    fn finish(&mut self) -> Result<(), CaptureError>;
}

/// Completion signal for one direct recording: the target path and an
/// optional error
pub type DirectCompletion = Box<dyn FnOnce(PathBuf, Option<CaptureError>) + Send>;

/// Records directly to a file through a [`MovieFileOutput`] backend
pub struct DirectFileSink {
    queue: Arc<SerialQueue>,
    backend: Mutex<Box<dyn MovieFileOutput>>,
    recording: AtomicBool,
    pending: Mutex<Option<(PathBuf, DirectCompletion)>>,
    connection: Arc<VideoConnection>,
}

impl DirectFileSink {
    pub fn new(queue: Arc<SerialQueue>, backend: Box<dyn MovieFileOutput>) -> Self {
        let connection = Arc::new(VideoConnection::new(true));
        // Front camera convention applies to the file output too.
        connection.set_mirrored(true);
        Self {
            queue,
            backend: Mutex::new(backend),
            recording: AtomicBool::new(false),
            pending: Mutex::new(None),
            connection,
        }
    }

    pub fn connection(&self) -> &Arc<VideoConnection> {
        &self.connection
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Begin writing to `path`; `completion` fires on the sink's queue once
    /// the recording finishes or fails
    pub fn start(&self, path: PathBuf, completion: DirectCompletion) -> Result<(), CaptureError> {
        if self.recording.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::RecordingError(
                "movie file output is already recording".to_string(),
            ));
        }
        let begun = self
            .backend
            .lock()
            .expect("movie output backend lock poisoned")
            .begin(&path);
        if let Err(e) = begun {
            self.recording.store(false, Ordering::SeqCst);
            return Err(e);
        }
        log::info!("direct recording started to {:?}", path);
        *self.pending.lock().expect("direct completion lock poisoned") = Some((path, completion));
        Ok(())
    }

    /// Stop writing and deliver the completion signal asynchronously
    ///
    /// Stopping while not recording is a no-op.
    pub fn stop(&self) {
        if !self.recording.swap(false, Ordering::SeqCst) {
            return;
        }
        let pending = self
            .pending
            .lock()
            .expect("direct completion lock poisoned")
            .take();
        let result = self
            .backend
            .lock()
            .expect("movie output backend lock poisoned")
            .finish();

        if let Some((path, completion)) = pending {
            self.queue.dispatch(move || {
                completion(path, result.err());
            });
        }
    }
}

impl std::fmt::Debug for DirectFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectFileSink")
            .field("recording", &self.is_recording())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::AtomicUsize;

    /// Backend that writes a small placeholder file
    struct StubOutput {
        fail_finish: bool,
        path: Option<PathBuf>,
    }

    impl StubOutput {
        fn new(fail_finish: bool) -> Self {
            Self {
                fail_finish,
                path: None,
            }
        }
    }

    impl MovieFileOutput for StubOutput {
        fn begin(&mut self, path: &Path) -> Result<(), CaptureError> {
            fs::write(path, b"container header").map_err(|e| {
                CaptureError::RecordingError(format!("cannot create output: {}", e))
            })?;
            self.path = Some(path.to_path_buf());
            Ok(())
        }

        fn finish(&mut self) -> Result<(), CaptureError> {
            if self.fail_finish {
                return Err(CaptureError::RecordingError("simulated write fault".into()));
            }
            Ok(())
        }
    }

    #[test]
    fn test_completion_fires_on_queue_with_success() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("movie.mov");
        let queue = Arc::new(SerialQueue::new("test-direct"));
        let sink = DirectFileSink::new(queue.clone(), Box::new(StubOutput::new(false)));

        let completions = Arc::new(AtomicUsize::new(0));
        let c = completions.clone();
        sink.start(
            path.clone(),
            Box::new(move |done_path, error| {
                assert!(error.is_none());
                assert!(done_path.exists());
                c.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();
        assert!(sink.is_recording());

        sink.stop();
        queue.dispatch_sync(|| {});
        assert_eq!(completions.load(Ordering::SeqCst), 1);
        assert!(!sink.is_recording());
    }

    #[test]
    fn test_completion_carries_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("movie.mov");
        let queue = Arc::new(SerialQueue::new("test-direct-fail"));
        let sink = DirectFileSink::new(queue.clone(), Box::new(StubOutput::new(true)));

        let failures = Arc::new(AtomicUsize::new(0));
        let f = failures.clone();
        sink.start(
            path,
            Box::new(move |_path, error| {
                assert!(error.is_some());
                f.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

        sink.stop();
        queue.dispatch_sync(|| {});
        assert_eq!(failures.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_double_start_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let queue = Arc::new(SerialQueue::new("test-direct-double"));
        let sink = DirectFileSink::new(queue, Box::new(StubOutput::new(false)));

        sink.start(dir.path().join("a.mov"), Box::new(|_, _| {})).unwrap();
        let err = sink
            .start(dir.path().join("b.mov"), Box::new(|_, _| {}))
            .unwrap_err();
        assert!(matches!(err, CaptureError::RecordingError(_)));
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let queue = Arc::new(SerialQueue::new("test-direct-noop"));
        let sink = DirectFileSink::new(queue.clone(), Box::new(StubOutput::new(false)));
        sink.stop();
        queue.dispatch_sync(|| {});
        assert!(!sink.is_recording());
    }

    #[test]
    fn test_output_connection_is_mirrored() {
        let queue = Arc::new(SerialQueue::new("test-direct-mirror"));
        let sink = DirectFileSink::new(queue, Box::new(StubOutput::new(false)));
        assert!(sink.connection().state().mirrored);
    }
}
