//! Recording state machine semantics driven through the controller

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use facecap::controller::{CaptureControl, CaptureController, Collaborators};
use facecap::orientation::DeviceOrientation;
use facecap::recording::{RecordingConfig, RecordingPhase, RECORDED_FILE_NAME};
use facecap::recovery::RecoveryChoice;
use facecap::testing::{
    synthetic_video_frame, FixedOrientation, MockDeviceProvider, MockMovieOutput, MockRequester,
    RecordingFaceConsumer, RecordingPlayback, RecordingWriter, ScriptedRecovery, WriterLog,
    WriterLogEntry,
};

struct Harness {
    controller: Arc<CaptureController>,
    log: Arc<WriterLog>,
}

fn harness(dir: &Path, choice: RecoveryChoice) -> Harness {
    let log = WriterLog::new();
    let controller = CaptureController::with_output_dir(
        RecordingConfig::new(64, 64, 30.0),
        Collaborators {
            devices: Arc::new(MockDeviceProvider::standard()),
            requester: Arc::new(MockRequester::granting_all()),
            playback: RecordingPlayback::new(),
            recovery: ScriptedRecovery::answering(choice),
            faces: RecordingFaceConsumer::new(),
            orientation: FixedOrientation::new(DeviceOrientation::Portrait),
            writer_factory: RecordingWriter::factory(log.clone()),
            movie_output: Some(Box::new(|| Box::new(MockMovieOutput::new()))),
        },
        dir,
    );

    controller.setup_device_capture();
    // Setup and the initial session operations each hop through the main
    // queue once.
    controller.queues().main.dispatch_sync(|| {});
    controller.queues().main.dispatch_sync(|| {});
    assert!(controller.session().is_running(), "session must be running");

    Harness { controller, log }
}

fn deliver_frames(controller: &CaptureController, range: std::ops::Range<u64>) {
    for i in range {
        controller
            .session()
            .deliver_video_frame(synthetic_video_frame(i, 64, 64, 30.0));
        thread::sleep(Duration::from_millis(3));
    }
    controller.queues().output.dispatch_sync(|| {});
}

#[test]
fn test_start_while_recording_attaches_no_second_writer() {
    let dir = tempfile::tempdir().expect("tempdir");
    let h = harness(dir.path(), RecoveryChoice::Cancel);

    h.controller.start_recording();
    deliver_frames(&h.controller, 0..3);

    // Second start: a no-op other than re-asserting the flag.
    h.controller.start_recording();
    assert!(h.controller.recording_flag());
    deliver_frames(&h.controller, 3..6);

    h.controller.stop_recording();
    h.controller.queues().output.dispatch_sync(|| {});

    let entries = h.log.entries();
    assert!(
        entries.iter().all(|e| match e {
            WriterLogEntry::Video { writer, .. } => *writer == 1,
            WriterLogEntry::Audio { writer, .. } => *writer == 1,
            WriterLogEntry::Stopped { writer } => *writer == 1,
        }),
        "only the first writer may ever see traffic: {:?}",
        entries
    );
    assert!(h.log.stopped(1));
}

#[test]
fn test_stop_then_immediate_start_isolates_segments() {
    let dir = tempfile::tempdir().expect("tempdir");
    let h = harness(dir.path(), RecoveryChoice::Cancel);

    h.controller.start_recording();
    deliver_frames(&h.controller, 0..5);

    // Stop and start back-to-back, no waiting in between.
    h.controller.stop_recording();
    h.controller.start_recording();

    deliver_frames(&h.controller, 100..105);
    h.controller.stop_recording();
    h.controller.queues().output.dispatch_sync(|| {});

    let entries = h.log.entries();

    // No frame captured before the stop may reach the second writer.
    for entry in &entries {
        if let WriterLogEntry::Video { writer: 2, timestamp } = entry {
            assert!(
                *timestamp >= 100.0 / 30.0,
                "pre-stop frame leaked into the new segment: {:?}",
                entry
            );
        }
    }

    // The first writer finalizes before the second writer sees any frame:
    // serial output-queue ordering.
    let stop1_index = entries
        .iter()
        .position(|e| matches!(e, WriterLogEntry::Stopped { writer: 1 }))
        .expect("first writer must finalize");
    let first_video2_index = entries
        .iter()
        .position(|e| matches!(e, WriterLogEntry::Video { writer: 2, .. }));
    if let Some(video2) = first_video2_index {
        assert!(
            stop1_index < video2,
            "finalize must precede the new segment's frames: {:?}",
            entries
        );
    }
}

#[test]
fn test_recording_flag_falls_synchronously_on_stop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let h = harness(dir.path(), RecoveryChoice::Cancel);

    h.controller.start_recording();
    assert!(h.controller.recording_flag());

    h.controller.stop_recording();
    // The flag is clear the moment stop returns, even though the writer
    // finalizes asynchronously.
    assert!(!h.controller.recording_flag());
    assert_eq!(h.controller.phase(), RecordingPhase::Idle);
}

#[test]
fn test_stop_while_idle_is_noop() {
    let dir = tempfile::tempdir().expect("tempdir");
    let h = harness(dir.path(), RecoveryChoice::Cancel);

    h.controller.stop_recording();
    assert_eq!(h.controller.phase(), RecordingPhase::Idle);
    assert!(h.log.entries().is_empty());
}

#[test]
fn test_stale_file_replaced_on_start() {
    let dir = tempfile::tempdir().expect("tempdir");
    let stale = dir.path().join(RECORDED_FILE_NAME);
    fs::write(&stale, b"stale recording from a previous run").expect("stale file");

    let h = harness(dir.path(), RecoveryChoice::Cancel);
    h.controller.start_recording();
    deliver_frames(&h.controller, 0..2);
    h.controller.stop_recording();
    h.controller.queues().output.dispatch_sync(|| {});

    let contents = fs::read_to_string(&stale).expect("new recording");
    assert_eq!(contents, "segment 1", "stale file must be replaced");
}

#[test]
fn test_start_works_when_no_stale_file_exists() {
    // Deleting a missing target must never surface an error.
    let dir = tempfile::tempdir().expect("tempdir");
    let h = harness(dir.path(), RecoveryChoice::Cancel);

    h.controller.start_recording();
    assert_eq!(h.controller.phase(), RecordingPhase::Recording);
    h.controller.stop_recording();
}

#[test]
fn test_at_most_one_recording_session() {
    let dir = tempfile::tempdir().expect("tempdir");
    let h = harness(dir.path(), RecoveryChoice::Cancel);

    h.controller.start_recording();
    let first_id = h.controller.status().recording_id.expect("active session");

    h.controller.start_recording();
    let second_id = h.controller.status().recording_id.expect("still active");
    assert_eq!(first_id, second_id, "no second session may be created");

    h.controller.stop_recording();
    assert!(h.controller.status().recording_id.is_none());
}
