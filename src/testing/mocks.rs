//! Mock collaborators for driving the controller without hardware

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::authorization::PermissionRequester;
use crate::controller::{FaceConsumer, OrientationSource, PlaybackPresenter, WriterFactory};
use crate::errors::CaptureError;
use crate::orientation::DeviceOrientation;
use crate::recording::{FrameWriter, MovieFileOutput, RecordingConfig, WriterDelegate};
use crate::recovery::{CaptureFault, RecoveryChoice, RecoveryDelegate};
use crate::session::DeviceProvider;
use crate::types::{AudioFrame, DeviceDescriptor, DevicePosition, MediaKind, FaceRegion, VideoFrame};

/// Fixed device list standing in for real hardware
pub struct MockDeviceProvider {
    devices: Vec<DeviceDescriptor>,
}

impl MockDeviceProvider {
    /// One front camera and one microphone, the minimum viable setup
    pub fn standard() -> Self {
        Self {
            devices: vec![
                DeviceDescriptor::new(
                    "cam0",
                    "Mock Front Camera",
                    MediaKind::Video,
                    Some(DevicePosition::Front),
                ),
                DeviceDescriptor::new("mic0", "Mock Microphone", MediaKind::Audio, None),
            ],
        }
    }

    /// No devices at all
    pub fn empty() -> Self {
        Self { devices: vec![] }
    }

    /// A camera but no microphone
    pub fn without_audio() -> Self {
        Self {
            devices: vec![DeviceDescriptor::new(
                "cam0",
                "Mock Front Camera",
                MediaKind::Video,
                Some(DevicePosition::Front),
            )],
        }
    }
}

impl DeviceProvider for MockDeviceProvider {
    fn devices(&self, kind: MediaKind) -> Vec<DeviceDescriptor> {
        self.devices
            .iter()
            .filter(|d| d.kind == kind)
            .cloned()
            .collect()
    }
}

/// Permission requester answering from a fixed script
pub struct MockRequester {
    grants: HashMap<MediaKind, bool>,
}

impl MockRequester {
    pub fn granting_all() -> Self {
        Self {
            grants: [(MediaKind::Video, true), (MediaKind::Audio, true)]
                .into_iter()
                .collect(),
        }
    }

    pub fn denying(kind: MediaKind) -> Self {
        let mut requester = Self::granting_all();
        requester.grants.insert(kind, false);
        requester
    }
}

impl PermissionRequester for MockRequester {
    fn request_access(&self, kind: MediaKind, callback: Box<dyn FnOnce(bool) + Send>) {
        callback(*self.grants.get(&kind).unwrap_or(&false));
    }
}

/// Everything a mock writer observed, shared across writer segments
#[derive(Debug, Clone, PartialEq)]
pub enum WriterLogEntry {
    Video { writer: u64, timestamp: f64 },
    Audio { writer: u64, timestamp: f64 },
    Stopped { writer: u64 },
}

#[derive(Debug, Default)]
pub struct WriterLog {
    entries: Mutex<Vec<WriterLogEntry>>,
}

impl WriterLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, entry: WriterLogEntry) {
        self.entries.lock().expect("writer log poisoned").push(entry);
    }

    pub fn entries(&self) -> Vec<WriterLogEntry> {
        self.entries.lock().expect("writer log poisoned").clone()
    }

    pub fn video_count(&self, writer: u64) -> usize {
        self.entries()
            .iter()
            .filter(|e| matches!(e, WriterLogEntry::Video { writer: w, .. } if *w == writer))
            .count()
    }

    pub fn stopped(&self, writer: u64) -> bool {
        self.entries()
            .iter()
            .any(|e| matches!(e, WriterLogEntry::Stopped { writer: w } if *w == writer))
    }

    /// Span between first and last video timestamp a writer saw
    pub fn video_duration(&self, writer: u64) -> f64 {
        let stamps: Vec<f64> = self
            .entries()
            .iter()
            .filter_map(|e| match e {
                WriterLogEntry::Video { writer: w, timestamp } if *w == writer => Some(*timestamp),
                _ => None,
            })
            .collect();
        match (stamps.first(), stamps.last()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }
}

/// Frame writer that records every interaction and writes a placeholder file
/// when stopped
pub struct RecordingWriter {
    id: u64,
    log: Arc<WriterLog>,
    output_path: PathBuf,
    delegate: Option<Arc<dyn WriterDelegate>>,
    fail_writes: bool,
}

impl RecordingWriter {
    /// Writer factory handing out sequentially numbered writers
    pub fn factory(log: Arc<WriterLog>) -> WriterFactory {
        let next_id = AtomicU64::new(1);
        Box::new(move |path: &Path, _config: &RecordingConfig| {
            Ok(Box::new(RecordingWriter {
                id: next_id.fetch_add(1, Ordering::SeqCst),
                log: log.clone(),
                output_path: path.to_path_buf(),
                delegate: None,
                fail_writes: false,
            }) as Box<dyn FrameWriter>)
        })
    }

    /// Factory whose writers fail every write call
    pub fn failing_factory(log: Arc<WriterLog>) -> WriterFactory {
        let next_id = AtomicU64::new(1);
        Box::new(move |path: &Path, _config: &RecordingConfig| {
            Ok(Box::new(RecordingWriter {
                id: next_id.fetch_add(1, Ordering::SeqCst),
                log: log.clone(),
                output_path: path.to_path_buf(),
                delegate: None,
                fail_writes: true,
            }) as Box<dyn FrameWriter>)
        })
    }
}

impl FrameWriter for RecordingWriter {
    fn write_video(&mut self, frame: &VideoFrame) -> Result<(), CaptureError> {
        if self.fail_writes {
            return Err(CaptureError::RecordingError("simulated write failure".into()));
        }
        self.log.push(WriterLogEntry::Video {
            writer: self.id,
            timestamp: frame.timestamp,
        });
        Ok(())
    }

    fn write_audio(&mut self, frame: &AudioFrame) -> Result<(), CaptureError> {
        if self.fail_writes {
            return Err(CaptureError::RecordingError("simulated write failure".into()));
        }
        self.log.push(WriterLogEntry::Audio {
            writer: self.id,
            timestamp: frame.timestamp,
        });
        Ok(())
    }

    fn set_delegate(&mut self, delegate: Arc<dyn WriterDelegate>) {
        self.delegate = Some(delegate);
    }

    fn stop(&mut self) {
        self.log.push(WriterLogEntry::Stopped { writer: self.id });
        let result = fs::write(&self.output_path, format!("segment {}", self.id))
            .map(|_| self.output_path.clone())
            .map_err(|e| CaptureError::RecordingError(e.to_string()));
        if let Some(delegate) = self.delegate.take() {
            delegate.writer_did_finish(result);
        }
    }
}

/// Movie-file backend writing a placeholder container
pub struct MockMovieOutput {
    fail_finish: bool,
}

impl MockMovieOutput {
    pub fn new() -> Self {
        Self { fail_finish: false }
    }

    pub fn failing() -> Self {
        Self { fail_finish: true }
    }
}

impl Default for MockMovieOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieFileOutput for MockMovieOutput {
    fn begin(&mut self, path: &Path) -> Result<(), CaptureError> {
        fs::write(path, b"mock movie container")
            .map_err(|e| CaptureError::RecordingError(format!("cannot create output: {}", e)))
    }

    fn finish(&mut self) -> Result<(), CaptureError> {
        if self.fail_finish {
            return Err(CaptureError::RecordingError(
                "simulated container fault".to_string(),
            ));
        }
        Ok(())
    }
}

/// Recovery delegate answering from a script and logging faults
pub struct ScriptedRecovery {
    choice: Mutex<RecoveryChoice>,
    seen: Mutex<Vec<CaptureFault>>,
}

impl ScriptedRecovery {
    pub fn answering(choice: RecoveryChoice) -> Arc<Self> {
        Arc::new(Self {
            choice: Mutex::new(choice),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn set_choice(&self, choice: RecoveryChoice) {
        *self.choice.lock().expect("recovery choice poisoned") = choice;
    }

    pub fn faults_seen(&self) -> Vec<CaptureFault> {
        self.seen.lock().expect("recovery faults poisoned").clone()
    }
}

impl RecoveryDelegate for ScriptedRecovery {
    fn choose(&self, fault: &CaptureFault) -> RecoveryChoice {
        self.seen
            .lock()
            .expect("recovery faults poisoned")
            .push(fault.clone());
        *self.choice.lock().expect("recovery choice poisoned")
    }
}

/// Playback presenter remembering every presented path
#[derive(Default)]
pub struct RecordingPlayback {
    presented: Mutex<Vec<PathBuf>>,
}

impl RecordingPlayback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn presented(&self) -> Vec<PathBuf> {
        self.presented.lock().expect("playback log poisoned").clone()
    }
}

impl PlaybackPresenter for RecordingPlayback {
    fn present(&self, path: &Path) {
        self.presented
            .lock()
            .expect("playback log poisoned")
            .push(path.to_path_buf());
    }
}

/// Playback presenter that ignores everything
pub struct NullPlayback;

impl PlaybackPresenter for NullPlayback {
    fn present(&self, _path: &Path) {}
}

/// Face consumer remembering every routed region
#[derive(Default)]
pub struct RecordingFaceConsumer {
    faces: Mutex<Vec<FaceRegion>>,
}

impl RecordingFaceConsumer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn faces(&self) -> Vec<FaceRegion> {
        self.faces.lock().expect("face log poisoned").clone()
    }
}

impl FaceConsumer for RecordingFaceConsumer {
    fn faces_detected(&self, faces: Vec<FaceRegion>) {
        self.faces.lock().expect("face log poisoned").extend(faces);
    }
}

/// Face consumer that ignores everything
pub struct NullFaceConsumer;

impl FaceConsumer for NullFaceConsumer {
    fn faces_detected(&self, _faces: Vec<FaceRegion>) {}
}

/// Orientation source returning a settable fixed value
pub struct FixedOrientation {
    orientation: Mutex<DeviceOrientation>,
}

impl FixedOrientation {
    pub fn new(orientation: DeviceOrientation) -> Arc<Self> {
        Arc::new(Self {
            orientation: Mutex::new(orientation),
        })
    }

    pub fn set(&self, orientation: DeviceOrientation) {
        *self.orientation.lock().expect("orientation poisoned") = orientation;
    }
}

impl OrientationSource for FixedOrientation {
    fn current(&self) -> DeviceOrientation {
        *self.orientation.lock().expect("orientation poisoned")
    }
}
