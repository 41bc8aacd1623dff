//! Facecap: front-facing camera capture and recording controller
//!
//! This crate drives one live capture session — one front camera, one
//! microphone — and coordinates concurrent delivery of video frames, audio
//! buffers, and face-region metadata while managing a recording lifecycle
//! that persists captured media to a file.
//!
//! # Features
//! - Authorization gating: capture starts only once camera and microphone
//!   are both granted
//! - Multi-queue frame routing: video, audio, and metadata each ride their
//!   own serial delivery queue
//! - Two recording strategies: direct-file output and writer-based frame
//!   forwarding
//! - Cancel-or-restart recovery from runtime capture faults
//! - Orientation and mirroring adjustment on rotation
//!
//! # Usage
//! ```rust,ignore
//! use std::sync::Arc;
//! use facecap::controller::{CaptureControl, CaptureController, Collaborators};
//!
//! let controller = CaptureController::new(recording_config, collaborators);
//! controller.setup_device_capture();
//! // ...user taps record...
//! controller.start_recording();
//! controller.stop_recording();
//! ```

pub mod authorization;
pub mod clock;
pub mod config;
pub mod controller;
pub mod errors;
pub mod orientation;
pub mod permissions;
pub mod platform;
pub mod queues;
pub mod recording;
pub mod recovery;
pub mod session;
pub mod types;

#[cfg(feature = "plugin")]
pub mod commands;

// Testing utilities - mock collaborators and synthetic data for offline use
pub mod testing;

// Re-exports for convenience
pub use clock::CaptureClock;
pub use controller::{CaptureControl, CaptureController, Collaborators};
pub use errors::CaptureError;
pub use queues::{QueueSet, SerialQueue};
pub use recording::{RecordingPhase, RecordingStrategy};
pub use session::CaptureSession;
pub use types::{
    AudioFrame, CaptureFormat, DeviceDescriptor, DevicePosition, FaceRegion, MediaKind, VideoFrame,
};

/// Initialize the plugin with all capture commands
#[cfg(feature = "plugin")]
pub fn init<R: tauri::Runtime>() -> tauri::plugin::TauriPlugin<R> {
    tauri::plugin::Builder::new("facecap")
        .invoke_handler(tauri::generate_handler![
            // Lifecycle commands
            commands::control::initialize_capture,
            commands::control::release_capture,
            commands::control::capture_status,
            // Recording commands
            commands::control::start_recording,
            commands::control::stop_recording,
            commands::control::start_direct_recording,
            commands::control::stop_direct_recording,
            // Session commands
            commands::control::start_capture_session,
            commands::control::stop_capture_session,
            commands::control::start_metadata_session,
            commands::control::device_rotated,
            // Permission commands
            commands::permissions::check_capture_permission,
            commands::permissions::check_capture_permission_detailed,
        ])
        .build()
}

/// Initialize logging for the capture system
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "facecap=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_metadata() {
        assert_eq!(NAME, "facecap");
        assert!(!VERSION.is_empty());
        assert!(!DESCRIPTION.is_empty());
    }
}
