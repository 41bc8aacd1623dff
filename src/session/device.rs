//! Capture device lookup

use crate::errors::CaptureError;
use crate::types::{DeviceDescriptor, DevicePosition, MediaKind};

/// Source of capture device descriptors
///
/// The production implementation enumerates real hardware; tests provide a
/// fixed list so lookup runs without devices.
pub trait DeviceProvider: Send + Sync {
    fn devices(&self, kind: MediaKind) -> Vec<DeviceDescriptor>;
}

/// Select a capture device by media kind and optional position
///
/// When a position is given, the first device at that position wins; with no
/// position, the first available device of the kind wins. No match is a
/// `DeviceUnavailable` error — the session cannot be configured without its
/// required devices.
pub fn device_with_media_kind(
    provider: &dyn DeviceProvider,
    kind: MediaKind,
    position: Option<DevicePosition>,
) -> Result<DeviceDescriptor, CaptureError> {
    let devices = provider.devices(kind);

    let selected = match position {
        Some(position) => devices.into_iter().find(|d| d.position == Some(position)),
        None => devices.into_iter().next(),
    };

    selected.ok_or_else(|| {
        CaptureError::DeviceUnavailable(match position {
            Some(position) => format!("no {} device at position {:?}", kind, position),
            None => format!("no {} device available", kind),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(Vec<DeviceDescriptor>);

    impl DeviceProvider for FixedProvider {
        fn devices(&self, kind: MediaKind) -> Vec<DeviceDescriptor> {
            self.0.iter().filter(|d| d.kind == kind).cloned().collect()
        }
    }

    fn provider() -> FixedProvider {
        FixedProvider(vec![
            DeviceDescriptor::new("cam-back", "Back Camera", MediaKind::Video, Some(DevicePosition::Back)),
            DeviceDescriptor::new("cam-front", "Front Camera", MediaKind::Video, Some(DevicePosition::Front)),
            DeviceDescriptor::new("mic0", "Built-in Microphone", MediaKind::Audio, None),
        ])
    }

    #[test]
    fn test_position_match_wins_over_order() {
        let device =
            device_with_media_kind(&provider(), MediaKind::Video, Some(DevicePosition::Front))
                .unwrap();
        assert_eq!(device.id, "cam-front");
    }

    #[test]
    fn test_no_position_takes_first_of_kind() {
        let device = device_with_media_kind(&provider(), MediaKind::Audio, None).unwrap();
        assert_eq!(device.id, "mic0");
    }

    #[test]
    fn test_missing_position_is_unavailable() {
        let only_back = FixedProvider(vec![DeviceDescriptor::new(
            "cam-back",
            "Back Camera",
            MediaKind::Video,
            Some(DevicePosition::Back),
        )]);
        let err =
            device_with_media_kind(&only_back, MediaKind::Video, Some(DevicePosition::Front))
                .unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
    }

    #[test]
    fn test_empty_kind_is_unavailable() {
        let none = FixedProvider(vec![]);
        let err = device_with_media_kind(&none, MediaKind::Audio, None).unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
    }
}
