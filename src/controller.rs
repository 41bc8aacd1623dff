//! The capture controller: authorization, configuration, recording commands,
//! and runtime fault recovery
//!
//! The controller owns the capture session, the queue set, and the recording
//! state, and exposes the five-operation command surface through
//! [`CaptureControl`]. Construction is explicit and so is teardown; nothing
//! here is a process-wide singleton.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde::{Deserialize, Serialize};

use crate::authorization::{
    request_device_authorization, AuthorizationGate, AuthorizationProgress, PermissionRequester,
};
use crate::clock::CaptureClock;
use crate::errors::CaptureError;
use crate::orientation::{
    apply_preview_mirroring, apply_rotation, DeviceOrientation, StabilizationMode,
    VideoConnection, VideoOrientation,
};
use crate::queues::QueueSet;
use crate::recording::{
    default_output_path, remove_stale_recording, DirectFileSink, FrameWriter, MovieFileOutput,
    RecordingConfig, RecordingPhase, RecordingSession, RecordingState, RecordingStrategy,
    WriterDelegate, WriterSlot,
};
use crate::recovery::{CaptureFault, FaultKind, FaultSubscription, RecoveryChoice, RecoveryDelegate};
use crate::session::{
    device_with_media_kind, AudioFrameSink, CaptureSession, DeviceInput, DeviceProvider,
    FaceMetadataSink, VideoFrameSink,
};
use crate::types::{DevicePosition, FaceRegion, MediaKind};

/// The capability surface this core exposes, regardless of UI framework
///
/// The concrete controller implements it; tests mock it without real devices.
pub trait CaptureControl {
    fn start_recording(&self);
    fn stop_recording(&self);
    fn start_capture_session(&self);
    fn stop_capture_session(&self);
    fn start_metadata_session(&self);
}

/// Presents a completed recording for playback
///
/// Invoked only after a successful direct-file completion.
pub trait PlaybackPresenter: Send + Sync {
    fn present(&self, path: &Path);
}

/// Consumes routed face-region metadata
pub trait FaceConsumer: Send + Sync {
    fn faces_detected(&self, faces: Vec<FaceRegion>);
}

/// Reports the device's current physical orientation
pub trait OrientationSource: Send + Sync {
    fn current(&self) -> DeviceOrientation;
}

/// Builds a fresh frame writer for one recording segment
pub type WriterFactory =
    Box<dyn Fn(&Path, &RecordingConfig) -> Result<Box<dyn FrameWriter>, CaptureError> + Send + Sync>;

/// Builds the opaque backend for the direct-file strategy
pub type MovieOutputFactory = Box<dyn Fn() -> Box<dyn MovieFileOutput> + Send + Sync>;

/// External collaborators wired into the controller at construction
pub struct Collaborators {
    pub devices: Arc<dyn DeviceProvider>,
    pub requester: Arc<dyn PermissionRequester>,
    pub playback: Arc<dyn PlaybackPresenter>,
    pub recovery: Arc<dyn RecoveryDelegate>,
    pub faces: Arc<dyn FaceConsumer>,
    pub orientation: Arc<dyn OrientationSource>,
    pub writer_factory: WriterFactory,
    /// Absent when the deployment never uses the direct-file strategy
    pub movie_output: Option<MovieOutputFactory>,
}

/// Writer factory backed by the built-in movie writer
///
/// Without the `recording` feature there is no built-in writer, so the
/// factory reports a configuration error and deployments must supply their
/// own [`FrameWriter`].
pub fn platform_writer_factory() -> WriterFactory {
    #[cfg(feature = "recording")]
    {
        Box::new(|path: &Path, config: &RecordingConfig| {
            Ok(Box::new(crate::recording::MovieWriter::new(path, config.clone())?)
                as Box<dyn FrameWriter>)
        })
    }
    #[cfg(not(feature = "recording"))]
    {
        Box::new(|_path: &Path, _config: &RecordingConfig| {
            Err(CaptureError::ConfigurationError(
                "no frame writer backend compiled in (enable the 'recording' feature)".to_string(),
            ))
        })
    }
}

/// Serializable snapshot of the controller for status queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerStatus {
    pub session_running: bool,
    pub phase: RecordingPhase,
    pub recording_id: Option<uuid::Uuid>,
    pub output_path: String,
    pub authorized_grants: usize,
}

pub struct CaptureController {
    weak_self: Weak<CaptureController>,
    queues: Arc<QueueSet>,
    session: Arc<CaptureSession>,
    clock: CaptureClock,
    gate: Arc<AuthorizationGate>,
    state: Arc<RecordingState>,
    // Guarded by the camera queue: every read/write happens inside a
    // synchronous camera-queue dispatch.
    recording_active: Arc<AtomicBool>,
    writer_slot: Arc<WriterSlot>,
    current: Mutex<Option<RecordingSession>>,
    output_path: PathBuf,
    recording_config: RecordingConfig,
    preview_connection: Arc<VideoConnection>,
    fault_subscription: Mutex<Option<FaultSubscription>>,
    collaborators: Collaborators,
}

impl CaptureController {
    /// Controller writing to the fixed path in the temporary-files area
    pub fn new(recording_config: RecordingConfig, collaborators: Collaborators) -> Arc<Self> {
        Self::with_output_path(recording_config, collaborators, default_output_path())
    }

    /// Controller writing to `movie.mov` under a caller-chosen directory
    pub fn with_output_dir(
        recording_config: RecordingConfig,
        collaborators: Collaborators,
        dir: &Path,
    ) -> Arc<Self> {
        Self::with_output_path(
            recording_config,
            collaborators,
            dir.join(crate::recording::RECORDED_FILE_NAME),
        )
    }

    fn with_output_path(
        recording_config: RecordingConfig,
        collaborators: Collaborators,
        output_path: PathBuf,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            weak_self: weak.clone(),
            queues: Arc::new(QueueSet::new()),
            session: Arc::new(CaptureSession::new()),
            clock: CaptureClock::new(),
            gate: Arc::new(AuthorizationGate::new()),
            state: Arc::new(RecordingState::new()),
            recording_active: Arc::new(AtomicBool::new(false)),
            writer_slot: Arc::new(WriterSlot::new()),
            current: Mutex::new(None),
            output_path,
            recording_config,
            preview_connection: Arc::new(VideoConnection::new(true)),
            fault_subscription: Mutex::new(None),
            collaborators,
        })
    }

    /// Shared timebase stamped onto every captured frame
    pub fn clock(&self) -> &CaptureClock {
        &self.clock
    }

    pub fn session(&self) -> &Arc<CaptureSession> {
        &self.session
    }

    pub fn queues(&self) -> &Arc<QueueSet> {
        &self.queues
    }

    pub fn preview_connection(&self) -> &Arc<VideoConnection> {
        &self.preview_connection
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn phase(&self) -> RecordingPhase {
        self.state.phase()
    }

    /// Read the recording-active flag through the camera queue
    pub fn recording_flag(&self) -> bool {
        let flag = self.recording_active.clone();
        self.queues
            .camera
            .dispatch_sync(move || flag.load(Ordering::Relaxed))
    }

    pub fn status(&self) -> ControllerStatus {
        ControllerStatus {
            session_running: self.session.is_running(),
            phase: self.state.phase(),
            recording_id: self
                .current
                .lock()
                .expect("recording session lock poisoned")
                .as_ref()
                .map(|s| s.id),
            output_path: self.output_path.to_string_lossy().to_string(),
            authorized_grants: self.gate.grant_count(),
        }
    }

    // ---- authorization bootstrap ----

    /// Request both device permissions and start capture once granted
    ///
    /// When the gate is already satisfied the devices were set up earlier, so
    /// the session just starts running again. Otherwise both permissions are
    /// requested; once the second grant lands, device setup runs exactly once
    /// on the main queue so the grant callback's thread is never blocked.
    pub fn setup_device_capture(&self) {
        if self.gate.is_satisfied() {
            self.start_capture_session();
            return;
        }

        let weak = self.weak_self.clone();
        request_device_authorization(&*self.collaborators.requester, move |granted| {
            let Some(controller) = weak.upgrade() else {
                return;
            };
            match controller.gate.record_grant(granted) {
                Ok(AuthorizationProgress::Complete) => {
                    let gate = controller.gate.clone();
                    gate.try_setup(|| {
                        let main = controller.queues.main.clone();
                        let weak = controller.weak_self.clone();
                        main.dispatch(move || {
                            if let Some(controller) = weak.upgrade() {
                                if let Err(e) = controller.run_device_capture(true) {
                                    log::error!("device capture setup failed: {}", e);
                                }
                            }
                        });
                    });
                }
                Ok(AuthorizationProgress::Pending(count)) => {
                    log::debug!("authorization progress: {}/2 grants", count);
                }
                Err(e) => {
                    // Unrecoverable: capture never starts without both devices.
                    log::error!("{}", e);
                }
            }
        });
    }

    /// Configure devices and, optionally, run the initial session operations
    pub fn run_device_capture(&self, start_session: bool) -> Result<(), CaptureError> {
        self.configure()?;
        if start_session {
            let weak = self.weak_self.clone();
            self.queues.main.dispatch(move || {
                if let Some(controller) = weak.upgrade() {
                    if let Err(e) = controller.initial_session_operations() {
                        log::error!("initial session operations failed: {}", e);
                    }
                }
            });
        }
        Ok(())
    }

    /// Select devices and wire both inputs into the session
    ///
    /// Failures here mean the device setup does not meet minimum
    /// requirements; nothing is retried.
    pub fn configure(&self) -> Result<(), CaptureError> {
        let camera = device_with_media_kind(
            &*self.collaborators.devices,
            MediaKind::Video,
            Some(DevicePosition::Front),
        )?;
        self.session.add_input(DeviceInput::new(camera))?;

        let microphone =
            device_with_media_kind(&*self.collaborators.devices, MediaKind::Audio, None)?;
        self.session.add_input(DeviceInput::new(microphone))?;

        Ok(())
    }

    fn initial_session_operations(&self) -> Result<(), CaptureError> {
        self.attach_buffered_outputs()?;
        self.start_capture_session();
        self.attach_metadata_output()?;
        Ok(())
    }

    /// Attach the buffered-frame output set: a late-frame-discarding video
    /// sink on the output queue and an audio sink on the audio queue
    pub fn attach_buffered_outputs(&self) -> Result<(), CaptureError> {
        let camera_queue = self.queues.camera.clone();
        let flag = self.recording_active.clone();
        let slot = self.writer_slot.clone();
        let session = Arc::downgrade(&self.session);
        let video_sink = VideoFrameSink::new(self.queues.output.clone(), true, move |frame| {
            let flag = flag.clone();
            let active = camera_queue.dispatch_sync(move || flag.load(Ordering::Relaxed));
            if !active {
                return;
            }
            if let Err(e) = slot.write_video(&frame) {
                log::error!("video write failed: {}", e);
                if let Some(session) = session.upgrade() {
                    session.report_fault(CaptureFault::new(FaultKind::MediaWrite, e.to_string()));
                }
            }
        });
        let video_sink = self.session.attach_video_sink(video_sink)?;

        // The frame-delivery connection follows the front-camera convention
        // from the moment it exists.
        if let Some(o) = VideoOrientation::from_device(self.collaborators.orientation.current()) {
            video_sink.connection().set_orientation(o);
        }
        video_sink.connection().set_mirrored(true);
        video_sink
            .connection()
            .set_stabilization(StabilizationMode::Standard);

        let camera_queue = self.queues.camera.clone();
        let flag = self.recording_active.clone();
        let slot = self.writer_slot.clone();
        let session = Arc::downgrade(&self.session);
        let audio_sink = AudioFrameSink::new(self.queues.audio.clone(), move |frame| {
            let flag = flag.clone();
            let active = camera_queue.dispatch_sync(move || flag.load(Ordering::Relaxed));
            if !active {
                return;
            }
            if let Err(e) = slot.write_audio(&frame) {
                log::error!("audio write failed: {}", e);
                if let Some(session) = session.upgrade() {
                    session.report_fault(CaptureFault::new(FaultKind::MediaWrite, e.to_string()));
                }
            }
        });
        self.session.attach_audio_sink(audio_sink)?;
        Ok(())
    }

    fn attach_metadata_output(&self) -> Result<(), CaptureError> {
        let consumer = self.collaborators.faces.clone();
        let sink = FaceMetadataSink::new(self.queues.session.clone(), move |faces| {
            consumer.faces_detected(faces);
        });
        self.session.attach_metadata_sink(sink)?;
        Ok(())
    }

    // ---- recording: writer-based strategy ----

    /// Retire any previous writer, install a fresh segment, and raise the
    /// recording-active flag
    ///
    /// Ordering: the flag clear and writer removal happen synchronously on
    /// the camera queue, the old writer finalizes on the output queue ahead
    /// of any frame destined for the new segment, and only then does the flag
    /// rise again.
    fn activate_writer_segment(&self) -> Result<(), CaptureError> {
        let flag = self.recording_active.clone();
        let slot = self.writer_slot.clone();
        let output_queue = self.queues.output.clone();
        self.queues.camera.dispatch_sync(move || {
            flag.store(false, Ordering::Relaxed);
            if let Some(mut writer) = slot.take() {
                output_queue.dispatch(move || writer.stop());
            }
        });

        remove_stale_recording(&self.output_path);

        let writer =
            (self.collaborators.writer_factory)(&self.output_path, &self.recording_config)?;
        self.writer_slot.install(writer);

        *self
            .current
            .lock()
            .expect("recording session lock poisoned") = Some(RecordingSession::new(
            RecordingStrategy::FrameWriter,
            self.output_path.clone(),
        ));

        let flag = self.recording_active.clone();
        self.queues
            .camera
            .dispatch_sync(move || flag.store(true, Ordering::Relaxed));
        Ok(())
    }

    fn completion_delegate(&self) -> Arc<dyn WriterDelegate> {
        Arc::new(WriterCompletion {
            controller: self.weak_self.clone(),
        })
    }

    // ---- recording: direct-file strategy ----

    /// Begin a direct-file recording through the movie output backend
    pub fn start_direct_recording(&self) {
        if !self.state.begin_recording() {
            return;
        }
        let sink = match self.ensure_direct_sink() {
            Ok(sink) => sink,
            Err(e) => {
                log::error!("cannot start direct recording: {}", e);
                self.state.finish_recording();
                return;
            }
        };

        *self
            .current
            .lock()
            .expect("recording session lock poisoned") = Some(RecordingSession::new(
            RecordingStrategy::DirectFile,
            self.output_path.clone(),
        ));

        let weak = self.weak_self.clone();
        let started = sink.start(
            self.output_path.clone(),
            Box::new(move |path, error| {
                if let Some(controller) = weak.upgrade() {
                    controller.direct_recording_finished(path, error);
                }
            }),
        );
        if let Err(e) = started {
            log::error!("direct recording failed to start: {}", e);
            self.state.finish_recording();
            self.current
                .lock()
                .expect("recording session lock poisoned")
                .take();
        }
    }

    /// Stop a direct-file recording; a no-op when none is active
    pub fn stop_direct_recording(&self) {
        if !self.state.finish_recording() {
            return;
        }
        if let Some(sink) = self.session.direct_sink() {
            sink.stop();
        }
        self.current
            .lock()
            .expect("recording session lock poisoned")
            .take();
        log::info!("stopped direct recording");
    }

    fn ensure_direct_sink(&self) -> Result<Arc<DirectFileSink>, CaptureError> {
        if let Some(sink) = self.session.direct_sink() {
            return Ok(sink);
        }
        let factory = self.collaborators.movie_output.as_ref().ok_or_else(|| {
            CaptureError::ConfigurationError("no movie file backend configured".to_string())
        })?;
        self.session
            .attach_direct_sink(DirectFileSink::new(self.queues.output.clone(), factory()))
    }

    fn direct_recording_finished(&self, path: PathBuf, error: Option<CaptureError>) {
        match error {
            None => {
                log::info!("finished recording to {:?}", path);
                self.collaborators.playback.present(&path);
            }
            Some(e) => {
                log::error!("error occurred during recording: {}", e);
                self.handle_runtime_fault(CaptureFault::new(FaultKind::MediaWrite, e.to_string()));
            }
        }
    }

    // ---- fault recovery ----

    /// Surface a runtime fault and execute the chosen recovery
    pub fn handle_runtime_fault(&self, fault: CaptureFault) {
        match self.collaborators.recovery.choose(&fault) {
            RecoveryChoice::Cancel => {
                log::info!("recovery: cancelling after fault ({})", fault);
                if self.state.begin_cancel() {
                    self.halt_writer_recording();
                    self.state.finish_cancel();
                }
                if let Some(sink) = self.session.direct_sink() {
                    sink.stop();
                }
                self.current
                    .lock()
                    .expect("recording session lock poisoned")
                    .take();
                self.stop_capture_session();
            }
            RecoveryChoice::Restart => {
                log::info!("recovery: restarting after fault ({})", fault);
                let resume_recording = self.state.begin_restart();
                let weak = self.weak_self.clone();
                self.queues.session.dispatch(move || {
                    let Some(controller) = weak.upgrade() else {
                        return;
                    };
                    controller.session.start_running();
                    if resume_recording {
                        controller.resume_recording_after_restart();
                    }
                });
            }
        }
    }

    fn resume_recording_after_restart(&self) {
        if !self.state.finish_restart() {
            return;
        }
        match self.activate_writer_segment() {
            Ok(()) => log::info!("recording resumed with a fresh writer segment"),
            Err(e) => {
                log::error!("could not resume recording after restart: {}", e);
                self.state.finish_recording();
            }
        }
    }

    /// Clear the flag and finalize the writer, in the split-stop order
    fn halt_writer_recording(&self) {
        let flag = self.recording_active.clone();
        let slot = self.writer_slot.clone();
        let output_queue = self.queues.output.clone();
        let delegate = self.completion_delegate();
        self.queues.camera.dispatch_sync(move || {
            if flag.swap(false, Ordering::Relaxed) {
                if let Some(mut writer) = slot.take() {
                    writer.set_delegate(delegate);
                    output_queue.dispatch(move || writer.stop());
                }
            }
        });
    }

    // ---- orientation ----

    /// Recompute and apply orientation/mirroring; called on every rotation or
    /// layout event
    pub fn handle_rotation(&self) {
        let orientation = self.collaborators.orientation.current();
        if let Some(video_sink) = self.session.video_sink() {
            apply_rotation(orientation, &self.preview_connection, video_sink.connection());
        } else if let Some(o) = VideoOrientation::from_device(orientation) {
            self.preview_connection.set_orientation(o);
        }
    }

    /// Release the session and stop all queues
    ///
    /// Equivalent to dropping the controller, for callers that want teardown
    /// at a deterministic point.
    pub fn teardown(&self) {
        self.stop_capture_session();
        self.halt_writer_recording();
        self.session.teardown();
    }
}

impl CaptureControl for CaptureController {
    /// Start a writer-based recording
    ///
    /// Starting while already recording re-asserts the active flag and
    /// nothing else; a second writer is never attached.
    fn start_recording(&self) {
        if !self.state.begin_recording() {
            let flag = self.recording_active.clone();
            self.queues
                .camera
                .dispatch_sync(move || flag.store(true, Ordering::Relaxed));
            return;
        }
        match self.activate_writer_segment() {
            Ok(()) => log::info!("recording started to {:?}", self.output_path),
            Err(e) => {
                log::error!("recording failed to start: {}", e);
                self.state.finish_recording();
            }
        }
    }

    /// Stop a writer-based recording
    ///
    /// The flag falls synchronously, so no frame is forwarded after this
    /// returns; the writer finalizes asynchronously on the output queue.
    fn stop_recording(&self) {
        if !self.state.finish_recording() {
            return;
        }
        self.halt_writer_recording();
        self.current
            .lock()
            .expect("recording session lock poisoned")
            .take();
        log::info!("stopped recording");
    }

    fn start_capture_session(&self) {
        self.session.start_running();
        apply_preview_mirroring(&self.preview_connection);
        self.handle_rotation();

        let weak = self.weak_self.clone();
        let subscription = self.session.faults().observe(move |fault| {
            if let Some(controller) = weak.upgrade() {
                controller.handle_runtime_fault(fault.clone());
            }
        });
        *self
            .fault_subscription
            .lock()
            .expect("fault subscription lock poisoned") = Some(subscription);
    }

    fn stop_capture_session(&self) {
        self.session.stop_running();
        // A stopped session must not hold a dangling observer.
        self.fault_subscription
            .lock()
            .expect("fault subscription lock poisoned")
            .take();
    }

    fn start_metadata_session(&self) {
        if let Err(e) = self.attach_metadata_output() {
            log::error!("cannot add metadata capture output: {}", e);
        }
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.session.stop_running();
        self.fault_subscription
            .lock()
            .expect("fault subscription lock poisoned")
            .take();
        self.session.teardown();
    }
}

/// Writer completion delegate routing failures into the recovery flow
struct WriterCompletion {
    controller: Weak<CaptureController>,
}

impl WriterDelegate for WriterCompletion {
    fn writer_did_finish(&self, result: Result<PathBuf, CaptureError>) {
        match result {
            Ok(path) => log::info!("writer finalized {:?}", path),
            Err(e) => {
                log::error!("writer failed to finalize: {}", e);
                if let Some(controller) = self.controller.upgrade() {
                    controller.handle_runtime_fault(CaptureFault::new(
                        FaultKind::MediaWrite,
                        e.to_string(),
                    ));
                }
            }
        }
    }
}
