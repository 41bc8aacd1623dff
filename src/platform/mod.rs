//! Platform device enumeration
//!
//! Cameras come from nokhwa with the native backend for each OS; microphones
//! come from cpal when the `audio` feature is enabled. Desktop systems do not
//! report camera facing, so the first enumerated camera is treated as the
//! front-facing device (the built-in webcam convention).

use nokhwa::query;

use crate::session::DeviceProvider;
use crate::types::{DeviceDescriptor, DevicePosition, MediaKind};

/// Native camera backend for the current OS
fn native_backend() -> nokhwa::utils::ApiBackend {
    #[cfg(target_os = "linux")]
    {
        nokhwa::utils::ApiBackend::Video4Linux
    }
    #[cfg(target_os = "macos")]
    {
        nokhwa::utils::ApiBackend::AVFoundation
    }
    #[cfg(target_os = "windows")]
    {
        nokhwa::utils::ApiBackend::MediaFoundation
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        nokhwa::utils::ApiBackend::Auto
    }
}

/// List available camera devices
pub fn list_cameras() -> Vec<DeviceDescriptor> {
    match query(native_backend()) {
        Ok(cameras) => cameras
            .into_iter()
            .enumerate()
            .map(|(i, info)| {
                let position = if i == 0 {
                    Some(DevicePosition::Front)
                } else {
                    None
                };
                DeviceDescriptor::new(
                    info.index().to_string(),
                    info.human_name(),
                    MediaKind::Video,
                    position,
                )
            })
            .collect(),
        Err(e) => {
            log::warn!("camera enumeration failed: {}", e);
            Vec::new()
        }
    }
}

/// List available microphone devices
#[cfg(feature = "audio")]
pub fn list_microphones() -> Vec<DeviceDescriptor> {
    use cpal::traits::{DeviceTrait, HostTrait};

    let host = cpal::default_host();
    match host.input_devices() {
        Ok(devices) => devices
            .enumerate()
            .filter_map(|(i, device)| {
                let name = device.name().ok()?;
                Some(DeviceDescriptor::new(
                    format!("audio_{}", i),
                    name,
                    MediaKind::Audio,
                    None,
                ))
            })
            .collect(),
        Err(e) => {
            log::warn!("microphone enumeration failed: {}", e);
            Vec::new()
        }
    }
}

#[cfg(not(feature = "audio"))]
pub fn list_microphones() -> Vec<DeviceDescriptor> {
    log::warn!("microphone enumeration requires the 'audio' feature");
    Vec::new()
}

/// Device provider backed by the real platform hardware
pub struct PlatformDevices;

impl DeviceProvider for PlatformDevices {
    fn devices(&self, kind: MediaKind) -> Vec<DeviceDescriptor> {
        match kind {
            MediaKind::Video => list_cameras(),
            MediaKind::Audio => list_microphones(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_does_not_panic_without_hardware() {
        // CI machines often have no camera; the provider must degrade to an
        // empty list rather than fail.
        let provider = PlatformDevices;
        let _ = provider.devices(MediaKind::Video);
        let _ = provider.devices(MediaKind::Audio);
    }

    #[test]
    fn test_first_camera_is_front_facing() {
        let cameras = list_cameras();
        if let Some(first) = cameras.first() {
            assert_eq!(first.position, Some(DevicePosition::Front));
        }
    }
}
