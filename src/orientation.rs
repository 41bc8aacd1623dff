//! Video orientation and mirroring adjustment
//!
//! Recomputed from the device's physical orientation on every rotation or
//! layout event and applied to both the preview connection and the
//! frame-delivery connection. Front-camera convention: the frame-delivery
//! connection is always mirrored horizontally, and automatic mirroring on the
//! preview connection is disabled so manual mirroring stays authoritative.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Physical orientation of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
    Unknown,
}

/// Orientation applied to a video connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

impl VideoOrientation {
    /// Map a physical orientation onto a connection orientation
    ///
    /// Face-up, face-down, and unknown have no video equivalent and leave the
    /// connection unchanged.
    pub fn from_device(orientation: DeviceOrientation) -> Option<Self> {
        match orientation {
            DeviceOrientation::Portrait => Some(VideoOrientation::Portrait),
            DeviceOrientation::PortraitUpsideDown => Some(VideoOrientation::PortraitUpsideDown),
            DeviceOrientation::LandscapeLeft => Some(VideoOrientation::LandscapeLeft),
            DeviceOrientation::LandscapeRight => Some(VideoOrientation::LandscapeRight),
            DeviceOrientation::FaceUp
            | DeviceOrientation::FaceDown
            | DeviceOrientation::Unknown => None,
        }
    }
}

/// Video stabilization preference for a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StabilizationMode {
    Off,
    Standard,
}

/// Mutable settings of one video connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionState {
    pub orientation: VideoOrientation,
    pub mirrored: bool,
    pub auto_mirroring: bool,
    pub stabilization: StabilizationMode,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self {
            orientation: VideoOrientation::Portrait,
            mirrored: false,
            auto_mirroring: true,
            stabilization: StabilizationMode::Off,
        }
    }
}

/// A connection between a capture output (or preview surface) and the session
///
/// Orientation control is a capability of the underlying route; connections
/// that do not support it ignore orientation writes.
#[derive(Debug)]
pub struct VideoConnection {
    supports_orientation: bool,
    state: Mutex<ConnectionState>,
}

impl VideoConnection {
    pub fn new(supports_orientation: bool) -> Self {
        Self {
            supports_orientation,
            state: Mutex::new(ConnectionState::default()),
        }
    }

    pub fn supports_orientation(&self) -> bool {
        self.supports_orientation
    }

    /// Snapshot of the current settings
    pub fn state(&self) -> ConnectionState {
        *self.state.lock().expect("connection state lock poisoned")
    }

    pub fn set_orientation(&self, orientation: VideoOrientation) {
        if !self.supports_orientation {
            return;
        }
        self.state
            .lock()
            .expect("connection state lock poisoned")
            .orientation = orientation;
    }

    pub fn set_mirrored(&self, mirrored: bool) {
        self.state
            .lock()
            .expect("connection state lock poisoned")
            .mirrored = mirrored;
    }

    pub fn set_auto_mirroring(&self, enabled: bool) {
        self.state
            .lock()
            .expect("connection state lock poisoned")
            .auto_mirroring = enabled;
    }

    pub fn set_stabilization(&self, mode: StabilizationMode) {
        self.state
            .lock()
            .expect("connection state lock poisoned")
            .stabilization = mode;
    }
}

/// Apply the current physical orientation to the preview and frame-delivery
/// connections
///
/// Idempotent: re-applying with an unchanged orientation leaves both
/// connections in the same state.
pub fn apply_rotation(
    orientation: DeviceOrientation,
    preview: &VideoConnection,
    output: &VideoConnection,
) {
    let video_orientation = VideoOrientation::from_device(orientation);

    if preview.supports_orientation() {
        if let Some(o) = video_orientation {
            preview.set_orientation(o);
        }
    }
    if output.supports_orientation() {
        if let Some(o) = video_orientation {
            output.set_orientation(o);
        }
        output.set_mirrored(true);
    }
}

/// Apply the fixed preview mirroring convention at session start
///
/// Manual mirroring is authoritative: automatic adjustment is disabled and
/// the preview mirrors horizontally like a front camera.
pub fn apply_preview_mirroring(preview: &VideoConnection) {
    preview.set_auto_mirroring(false);
    preview.set_mirrored(true);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_up_has_no_video_orientation() {
        assert_eq!(VideoOrientation::from_device(DeviceOrientation::FaceUp), None);
        assert_eq!(VideoOrientation::from_device(DeviceOrientation::Unknown), None);
    }

    #[test]
    fn test_rotation_sets_both_connections() {
        let preview = VideoConnection::new(true);
        let output = VideoConnection::new(true);

        apply_rotation(DeviceOrientation::LandscapeLeft, &preview, &output);

        assert_eq!(preview.state().orientation, VideoOrientation::LandscapeLeft);
        assert_eq!(output.state().orientation, VideoOrientation::LandscapeLeft);
        assert!(output.state().mirrored, "output connection must mirror");
    }

    #[test]
    fn test_unsupported_connection_ignores_orientation() {
        let preview = VideoConnection::new(false);
        let output = VideoConnection::new(true);

        apply_rotation(DeviceOrientation::LandscapeRight, &preview, &output);

        assert_eq!(preview.state().orientation, VideoOrientation::Portrait);
        assert_eq!(output.state().orientation, VideoOrientation::LandscapeRight);
    }

    #[test]
    fn test_apply_rotation_idempotent() {
        let preview = VideoConnection::new(true);
        let output = VideoConnection::new(true);
        apply_preview_mirroring(&preview);

        apply_rotation(DeviceOrientation::Portrait, &preview, &output);
        let preview_first = preview.state();
        let output_first = output.state();

        apply_rotation(DeviceOrientation::Portrait, &preview, &output);
        assert_eq!(preview.state(), preview_first);
        assert_eq!(output.state(), output_first);
    }

    #[test]
    fn test_preview_mirroring_convention() {
        let preview = VideoConnection::new(true);
        apply_preview_mirroring(&preview);
        let state = preview.state();
        assert!(state.mirrored);
        assert!(!state.auto_mirroring);
    }
}
