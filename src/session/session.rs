//! The capture session: owned inputs, attached sinks, running state

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::CaptureError;
use crate::recording::DirectFileSink;
use crate::recovery::{CaptureFault, FaultHub};
use crate::types::{AudioFrame, DeviceDescriptor, MediaKind, MetadataObject, VideoFrame};

use super::sinks::{AudioFrameSink, FaceMetadataSink, VideoFrameSink};

/// A capture device wrapped for attachment to a session
#[derive(Debug, Clone)]
pub struct DeviceInput {
    device: DeviceDescriptor,
}

impl DeviceInput {
    pub fn new(device: DeviceDescriptor) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &DeviceDescriptor {
        &self.device
    }
}

/// Aggregates device inputs and output sinks with a running/stopped state
///
/// The session is an explicit owned instance: the controller constructs it,
/// holds it for the session's lifetime, and tears it down deliberately. It
/// accepts at most one input per media kind and at most one sink per category
/// — this system drives exactly one camera and one microphone.
pub struct CaptureSession {
    running: AtomicBool,
    inputs: Mutex<Vec<DeviceInput>>,
    video_sink: Mutex<Option<Arc<VideoFrameSink>>>,
    audio_sink: Mutex<Option<Arc<AudioFrameSink>>>,
    metadata_sink: Mutex<Option<Arc<FaceMetadataSink>>>,
    direct_sink: Mutex<Option<Arc<DirectFileSink>>>,
    faults: Arc<FaultHub>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            inputs: Mutex::new(Vec::new()),
            video_sink: Mutex::new(None),
            audio_sink: Mutex::new(None),
            metadata_sink: Mutex::new(None),
            direct_sink: Mutex::new(None),
            faults: Arc::new(FaultHub::new()),
        }
    }

    /// True when no input of this device's media kind is attached yet
    pub fn can_add_input(&self, input: &DeviceInput) -> bool {
        let inputs = self.inputs.lock().expect("session inputs lock poisoned");
        !inputs.iter().any(|i| i.device().kind == input.device().kind)
    }

    /// Attach a device input
    ///
    /// Refusal is a configuration fault: the device setup does not meet the
    /// session's requirements and the session must not run partially wired.
    pub fn add_input(&self, input: DeviceInput) -> Result<(), CaptureError> {
        if !self.can_add_input(&input) {
            return Err(CaptureError::ConfigurationError(format!(
                "cannot add {} input '{}'",
                input.device().kind,
                input.device().name
            )));
        }
        log::info!(
            "adding {} input '{}'",
            input.device().kind,
            input.device().name
        );
        self.inputs
            .lock()
            .expect("session inputs lock poisoned")
            .push(input);
        Ok(())
    }

    pub fn input_count(&self, kind: MediaKind) -> usize {
        self.inputs
            .lock()
            .expect("session inputs lock poisoned")
            .iter()
            .filter(|i| i.device().kind == kind)
            .count()
    }

    pub fn inputs(&self) -> Vec<DeviceDescriptor> {
        self.inputs
            .lock()
            .expect("session inputs lock poisoned")
            .iter()
            .map(|i| i.device().clone())
            .collect()
    }

    pub fn attach_video_sink(&self, sink: VideoFrameSink) -> Result<Arc<VideoFrameSink>, CaptureError> {
        let mut slot = self.video_sink.lock().expect("video sink lock poisoned");
        if slot.is_some() {
            return Err(CaptureError::ConfigurationError(
                "video sink already attached".to_string(),
            ));
        }
        let sink = Arc::new(sink);
        *slot = Some(sink.clone());
        Ok(sink)
    }

    pub fn attach_audio_sink(&self, sink: AudioFrameSink) -> Result<Arc<AudioFrameSink>, CaptureError> {
        let mut slot = self.audio_sink.lock().expect("audio sink lock poisoned");
        if slot.is_some() {
            return Err(CaptureError::ConfigurationError(
                "audio sink already attached".to_string(),
            ));
        }
        let sink = Arc::new(sink);
        *slot = Some(sink.clone());
        Ok(sink)
    }

    pub fn attach_metadata_sink(
        &self,
        sink: FaceMetadataSink,
    ) -> Result<Arc<FaceMetadataSink>, CaptureError> {
        let mut slot = self
            .metadata_sink
            .lock()
            .expect("metadata sink lock poisoned");
        if slot.is_some() {
            return Err(CaptureError::ConfigurationError(
                "metadata sink already attached".to_string(),
            ));
        }
        let sink = Arc::new(sink);
        *slot = Some(sink.clone());
        Ok(sink)
    }

    pub fn attach_direct_sink(
        &self,
        sink: DirectFileSink,
    ) -> Result<Arc<DirectFileSink>, CaptureError> {
        let mut slot = self.direct_sink.lock().expect("direct sink lock poisoned");
        if slot.is_some() {
            return Err(CaptureError::ConfigurationError(
                "movie file output already attached".to_string(),
            ));
        }
        let sink = Arc::new(sink);
        *slot = Some(sink.clone());
        Ok(sink)
    }

    pub fn video_sink(&self) -> Option<Arc<VideoFrameSink>> {
        self.video_sink
            .lock()
            .expect("video sink lock poisoned")
            .clone()
    }

    pub fn audio_sink(&self) -> Option<Arc<AudioFrameSink>> {
        self.audio_sink
            .lock()
            .expect("audio sink lock poisoned")
            .clone()
    }

    pub fn metadata_sink(&self) -> Option<Arc<FaceMetadataSink>> {
        self.metadata_sink
            .lock()
            .expect("metadata sink lock poisoned")
            .clone()
    }

    pub fn direct_sink(&self) -> Option<Arc<DirectFileSink>> {
        self.direct_sink
            .lock()
            .expect("direct sink lock poisoned")
            .clone()
    }

    pub fn start_running(&self) {
        if !self.running.swap(true, Ordering::SeqCst) {
            log::info!("capture session started");
        }
    }

    pub fn stop_running(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::info!("capture session stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Route a captured video frame to the video sink's delivery queue
    ///
    /// A stopped session drops payloads.
    pub fn deliver_video_frame(&self, frame: VideoFrame) {
        if !self.is_running() {
            return;
        }
        if let Some(sink) = self.video_sink() {
            sink.deliver(frame);
        }
    }

    /// Route a captured audio buffer to the audio sink's delivery queue
    pub fn deliver_audio_frame(&self, frame: AudioFrame) {
        if !self.is_running() {
            return;
        }
        if let Some(sink) = self.audio_sink() {
            sink.deliver(frame);
        }
    }

    /// Route detector metadata to the metadata sink's delivery queue
    pub fn deliver_face_metadata(&self, objects: Vec<MetadataObject>) {
        if !self.is_running() {
            return;
        }
        if let Some(sink) = self.metadata_sink() {
            sink.deliver(objects);
        }
    }

    /// Hub where runtime faults are observed
    pub fn faults(&self) -> &Arc<FaultHub> {
        &self.faults
    }

    /// Signal an asynchronous device-level fault to observers
    pub fn report_fault(&self, fault: CaptureFault) {
        self.faults.report(&fault);
    }

    /// Release all inputs and outputs
    ///
    /// Called by `Drop`, or explicitly when the owning controller is torn
    /// down early.
    pub fn teardown(&self) {
        self.stop_running();
        self.inputs
            .lock()
            .expect("session inputs lock poisoned")
            .clear();
        self.video_sink
            .lock()
            .expect("video sink lock poisoned")
            .take();
        self.audio_sink
            .lock()
            .expect("audio sink lock poisoned")
            .take();
        self.metadata_sink
            .lock()
            .expect("metadata sink lock poisoned")
            .take();
        self.direct_sink
            .lock()
            .expect("direct sink lock poisoned")
            .take();
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queues::SerialQueue;
    use crate::types::DevicePosition;
    use std::sync::atomic::AtomicUsize;

    fn camera() -> DeviceInput {
        DeviceInput::new(DeviceDescriptor::new(
            "cam0",
            "Front Camera",
            MediaKind::Video,
            Some(DevicePosition::Front),
        ))
    }

    fn microphone() -> DeviceInput {
        DeviceInput::new(DeviceDescriptor::new(
            "mic0",
            "Microphone",
            MediaKind::Audio,
            None,
        ))
    }

    #[test]
    fn test_one_input_per_media_kind() {
        let session = CaptureSession::new();
        session.add_input(camera()).unwrap();
        session.add_input(microphone()).unwrap();

        let err = session.add_input(camera()).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationError(_)));
        assert_eq!(session.input_count(MediaKind::Video), 1);
        assert_eq!(session.input_count(MediaKind::Audio), 1);
    }

    #[test]
    fn test_second_sink_attach_is_refused() {
        let session = CaptureSession::new();
        let queue = Arc::new(SerialQueue::new("test-session-sink"));
        session
            .attach_video_sink(VideoFrameSink::new(queue.clone(), true, |_| {}))
            .unwrap();
        let err = session
            .attach_video_sink(VideoFrameSink::new(queue, true, |_| {}))
            .unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationError(_)));
    }

    #[test]
    fn test_stopped_session_drops_frames() {
        let session = CaptureSession::new();
        let queue = Arc::new(SerialQueue::new("test-stopped"));
        let handled = Arc::new(AtomicUsize::new(0));
        let h = handled.clone();
        session
            .attach_video_sink(VideoFrameSink::new(queue.clone(), false, move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        session.deliver_video_frame(VideoFrame::new(vec![0; 12], 2, 2, 0.0, "cam0".into()));
        queue.dispatch_sync(|| {});
        assert_eq!(handled.load(Ordering::SeqCst), 0, "not running yet");

        session.start_running();
        session.deliver_video_frame(VideoFrame::new(vec![0; 12], 2, 2, 0.1, "cam0".into()));
        queue.dispatch_sync(|| {});
        assert_eq!(handled.load(Ordering::SeqCst), 1);

        session.stop_running();
        session.deliver_video_frame(VideoFrame::new(vec![0; 12], 2, 2, 0.2, "cam0".into()));
        queue.dispatch_sync(|| {});
        assert_eq!(handled.load(Ordering::SeqCst), 1, "stopped session drops");
    }

    #[test]
    fn test_teardown_releases_everything() {
        let session = CaptureSession::new();
        let queue = Arc::new(SerialQueue::new("test-teardown"));
        session.add_input(camera()).unwrap();
        session
            .attach_video_sink(VideoFrameSink::new(queue, true, |_| {}))
            .unwrap();
        session.start_running();

        session.teardown();
        assert!(!session.is_running());
        assert!(session.inputs().is_empty());
        assert!(session.video_sink().is_none());
    }
}
