//! Tauri commands for the capture/record lifecycle

use std::path::Path;
use std::sync::Arc;

use tauri::command;
use tokio::sync::RwLock;

use crate::controller::{
    platform_writer_factory, CaptureControl, CaptureController, Collaborators, ControllerStatus,
    FaceConsumer, PlaybackPresenter,
};
use crate::orientation::DeviceOrientation;
use crate::permissions::PlatformRequester;
use crate::platform::PlatformDevices;
use crate::recording::RecordingConfig;
use crate::recovery::{CaptureFault, RecoveryChoice, RecoveryDelegate};
use crate::testing::FixedOrientation;
use crate::types::FaceRegion;

struct PluginState {
    controller: Arc<CaptureController>,
    orientation: Arc<FixedOrientation>,
}

lazy_static::lazy_static! {
    static ref STATE: RwLock<Option<PluginState>> = RwLock::new(None);
}

/// Playback presenter that surfaces the finished file in the log; apps
/// embedding the plugin react to the recorded file themselves.
struct LogPlayback;

impl PlaybackPresenter for LogPlayback {
    fn present(&self, path: &Path) {
        log::info!("recording ready for playback: {:?}", path);
    }
}

struct LogFaces;

impl FaceConsumer for LogFaces {
    fn faces_detected(&self, faces: Vec<FaceRegion>) {
        log::debug!("{} face(s) in frame", faces.len());
    }
}

/// Without a UI to ask, a fault cancels; apps override via their own
/// controller wiring.
struct CancelOnFault;

impl RecoveryDelegate for CancelOnFault {
    fn choose(&self, fault: &CaptureFault) -> RecoveryChoice {
        log::warn!("capture fault, cancelling: {}", fault);
        RecoveryChoice::Cancel
    }
}

/// Create the controller and request device authorization
#[command]
pub async fn initialize_capture(width: u32, height: u32, fps: f64) -> Result<(), String> {
    let mut state = STATE.write().await;
    if state.is_some() {
        return Err("capture controller already initialized".to_string());
    }

    let orientation = FixedOrientation::new(DeviceOrientation::Portrait);
    let controller = CaptureController::new(
        RecordingConfig::new(width, height, fps),
        Collaborators {
            devices: Arc::new(PlatformDevices),
            requester: Arc::new(PlatformRequester),
            playback: Arc::new(LogPlayback),
            recovery: Arc::new(CancelOnFault),
            faces: Arc::new(LogFaces),
            orientation: orientation.clone(),
            writer_factory: platform_writer_factory(),
            movie_output: None,
        },
    );
    controller.setup_device_capture();

    *state = Some(PluginState {
        controller,
        orientation,
    });
    Ok(())
}

/// Tear the controller down
#[command]
pub async fn release_capture() -> Result<(), String> {
    let mut state = STATE.write().await;
    if let Some(state) = state.take() {
        state.controller.teardown();
    }
    Ok(())
}

async fn with_controller<T>(
    f: impl FnOnce(&Arc<CaptureController>) -> T,
) -> Result<T, String> {
    let state = STATE.read().await;
    let state = state
        .as_ref()
        .ok_or_else(|| "capture controller not initialized".to_string())?;
    Ok(f(&state.controller))
}

#[command]
pub async fn start_recording() -> Result<(), String> {
    with_controller(|c| c.start_recording()).await
}

#[command]
pub async fn stop_recording() -> Result<(), String> {
    with_controller(|c| c.stop_recording()).await
}

#[command]
pub async fn start_capture_session() -> Result<(), String> {
    with_controller(|c| c.start_capture_session()).await
}

#[command]
pub async fn stop_capture_session() -> Result<(), String> {
    with_controller(|c| c.stop_capture_session()).await
}

#[command]
pub async fn start_metadata_session() -> Result<(), String> {
    with_controller(|c| c.start_metadata_session()).await
}

#[command]
pub async fn start_direct_recording() -> Result<(), String> {
    with_controller(|c| c.start_direct_recording()).await
}

#[command]
pub async fn stop_direct_recording() -> Result<(), String> {
    with_controller(|c| c.stop_direct_recording()).await
}

/// Feed a rotation/layout event into the orientation adjuster
#[command]
pub async fn device_rotated(orientation: DeviceOrientation) -> Result<(), String> {
    let state = STATE.read().await;
    let state = state
        .as_ref()
        .ok_or_else(|| "capture controller not initialized".to_string())?;
    state.orientation.set(orientation);
    state.controller.handle_rotation();
    Ok(())
}

#[command]
pub async fn capture_status() -> Result<ControllerStatus, String> {
    with_controller(|c| c.status()).await
}
