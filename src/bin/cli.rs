//! Headless demo: drives the capture controller end-to-end with synthetic
//! frames and mock devices, no hardware required.
//!
//! Usage: facecap-cli [seconds]

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use facecap::config::FacecapConfig;
use facecap::controller::{CaptureControl, CaptureController, Collaborators};
use facecap::testing::{
    synthetic_audio_frame, synthetic_face_region, synthetic_video_frame, FixedOrientation,
    MockDeviceProvider, MockRequester, RecordingFaceConsumer, RecordingPlayback, RecordingWriter,
    ScriptedRecovery, WriterLog,
};
use facecap::orientation::DeviceOrientation;
use facecap::recovery::RecoveryChoice;
use facecap::types::{MediaKind, MetadataObject};

fn main() -> Result<()> {
    facecap::init_logging();

    let seconds: u64 = std::env::args()
        .nth(1)
        .map(|arg| arg.parse().context("seconds must be a number"))
        .transpose()?
        .unwrap_or(2);

    let config = FacecapConfig::load_or_default();
    if let Err(e) = config.validate() {
        bail!("invalid configuration: {}", e);
    }
    let recording_config = config.recording_config();
    let fps = recording_config.fps;
    let (width, height) = (recording_config.width, recording_config.height);

    let writer_log = WriterLog::new();
    let playback = RecordingPlayback::new();
    let faces = RecordingFaceConsumer::new();
    let controller = CaptureController::new(
        recording_config,
        Collaborators {
            devices: Arc::new(MockDeviceProvider::standard()),
            requester: Arc::new(MockRequester::granting_all()),
            playback: playback.clone(),
            recovery: ScriptedRecovery::answering(RecoveryChoice::Cancel),
            faces: faces.clone(),
            orientation: FixedOrientation::new(DeviceOrientation::Portrait),
            writer_factory: RecordingWriter::factory(writer_log.clone()),
            movie_output: None,
        },
    );

    println!("facecap {} - simulated capture run", facecap::VERSION);
    controller.setup_device_capture();

    // Authorization and setup hop through the main queue; wait for them.
    controller.queues().main.dispatch_sync(|| {});
    controller.queues().main.dispatch_sync(|| {});

    let session = controller.session().clone();
    if !session.is_running() {
        bail!("capture session failed to start");
    }
    println!(
        "session running with {} video / {} audio input(s)",
        session.input_count(MediaKind::Video),
        session.input_count(MediaKind::Audio)
    );

    controller.start_recording();

    let frame_count = (seconds as f64 * fps) as u64;
    let samples_per_buffer = 960; // 20ms at 48kHz
    let audio_buffers = seconds * 50;
    println!("recording {} frames over {}s", frame_count, seconds);

    for i in 0..frame_count {
        session.deliver_video_frame(synthetic_video_frame(i, width, height, fps));
        session.deliver_face_metadata(vec![MetadataObject::face(synthetic_face_region(i))]);
        // Frame pacing keeps the output queue from discarding everything.
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
    for i in 0..audio_buffers {
        session.deliver_audio_frame(synthetic_audio_frame(i, samples_per_buffer));
    }

    // Let both delivery queues drain before stopping.
    controller.queues().output.dispatch_sync(|| {});
    controller.queues().audio.dispatch_sync(|| {});

    controller.stop_recording();
    controller.queues().output.dispatch_sync(|| {});

    let status = controller.status();
    println!("phase after stop: {:?}", status.phase);
    println!("writer events: {}", writer_log.entries().len());
    println!(
        "faces routed: {} (first at {:?})",
        faces.faces().len(),
        faces.faces().first().map(|f| f.bounds)
    );

    let output = controller.output_path();
    if output.exists() {
        println!("recording written to {:?}", output);
    } else {
        bail!("no recording was written to {:?}", output);
    }

    controller.stop_capture_session();
    controller.teardown();
    Ok(())
}
