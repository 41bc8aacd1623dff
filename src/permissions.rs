//! Platform permission probing for camera and microphone access

use crate::authorization::PermissionRequester;
use crate::types::MediaKind;

/// Permission status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PermissionStatus {
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
    /// Permission not determined (user hasn't been asked yet)
    NotDetermined,
    /// Permission restricted (parental controls, etc)
    Restricted,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::NotDetermined => write!(f, "not_determined"),
            PermissionStatus::Restricted => write!(f, "restricted"),
        }
    }
}

/// Detailed permission information
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PermissionInfo {
    pub status: PermissionStatus,
    pub message: String,
    pub can_request: bool,
}

/// Check permission status for one media kind
pub fn check_permission(kind: MediaKind) -> PermissionStatus {
    check_permission_detailed(kind).status
}

/// Check permission status for one media kind with detailed information
pub fn check_permission_detailed(kind: MediaKind) -> PermissionInfo {
    #[cfg(target_os = "windows")]
    {
        check_permission_windows(kind)
    }

    #[cfg(target_os = "macos")]
    {
        check_permission_macos(kind)
    }

    #[cfg(target_os = "linux")]
    {
        check_permission_linux(kind)
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        let _ = kind;
        PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Platform not supported".to_string(),
            can_request: false,
        }
    }
}

/// Permission requester backed by the platform probes above
///
/// Desktop platforms surface their own prompt the first time a device is
/// opened, so the callback fires immediately with the probed status; anything
/// other than an explicit denial or restriction counts as grantable.
pub struct PlatformRequester;

impl PermissionRequester for PlatformRequester {
    fn request_access(&self, kind: MediaKind, callback: Box<dyn FnOnce(bool) + Send>) {
        let info = check_permission_detailed(kind);
        log::info!("{} permission probe: {} ({})", kind, info.status, info.message);
        let granted = !matches!(
            info.status,
            PermissionStatus::Denied | PermissionStatus::Restricted
        );
        callback(granted);
    }
}

#[cfg(target_os = "windows")]
fn check_permission_windows(kind: MediaKind) -> PermissionInfo {
    // On Windows 10+, capture access is controlled by Privacy settings.
    // Check if we can enumerate devices as a proxy for permission.
    match kind {
        MediaKind::Video => {
            use nokhwa::query;

            match query(nokhwa::utils::ApiBackend::Auto) {
                Ok(devices) if !devices.is_empty() => PermissionInfo {
                    status: PermissionStatus::Granted,
                    message: "Camera access granted via Windows Privacy settings".to_string(),
                    can_request: false,
                },
                Ok(_) => PermissionInfo {
                    status: PermissionStatus::NotDetermined,
                    message: "No cameras found - permission may not be granted".to_string(),
                    can_request: true,
                },
                Err(e) => PermissionInfo {
                    status: PermissionStatus::Denied,
                    message: format!("Camera access denied: {}", e),
                    can_request: true,
                },
            }
        }
        MediaKind::Audio => PermissionInfo {
            status: PermissionStatus::NotDetermined,
            message: "Microphone access is controlled by Windows Privacy settings".to_string(),
            can_request: true,
        },
    }
}

#[cfg(target_os = "macos")]
fn check_permission_macos(kind: MediaKind) -> PermissionInfo {
    use objc::runtime::{Class, Object};
    use objc::{msg_send, sel, sel_impl};
    use std::ffi::CString;

    unsafe {
        let av_capture_device_class = Class::get("AVCaptureDevice");

        if av_capture_device_class.is_none() {
            return PermissionInfo {
                status: PermissionStatus::NotDetermined,
                message: "AVFoundation not available".to_string(),
                can_request: false,
            };
        }

        let av_capture_device_class = av_capture_device_class.unwrap();

        // Four-char media type codes used by AVFoundation.
        let code = match kind {
            MediaKind::Video => "vide",
            MediaKind::Audio => "soun",
        };
        let av_media_type = CString::new(code).unwrap();
        let media_type: *mut Object =
            msg_send![av_capture_device_class, mediaTypeForString: av_media_type.as_ptr()];

        // AVAuthorizationStatus enum values:
        // 0 = NotDetermined
        // 1 = Restricted
        // 2 = Denied
        // 3 = Authorized
        let auth_status: i64 =
            msg_send![av_capture_device_class, authorizationStatusForMediaType: media_type];

        match auth_status {
            3 => PermissionInfo {
                status: PermissionStatus::Granted,
                message: format!("{} access authorized", kind),
                can_request: false,
            },
            2 => PermissionInfo {
                status: PermissionStatus::Denied,
                message: format!(
                    "{} access denied - enable in System Preferences > Security & Privacy",
                    kind
                ),
                can_request: false,
            },
            1 => PermissionInfo {
                status: PermissionStatus::Restricted,
                message: format!("{} access restricted by system policy", kind),
                can_request: false,
            },
            _ => PermissionInfo {
                status: PermissionStatus::NotDetermined,
                message: format!("{} permission not yet requested", kind),
                can_request: true,
            },
        }
    }
}

#[cfg(target_os = "linux")]
fn check_permission_linux(kind: MediaKind) -> PermissionInfo {
    use std::fs;
    use std::path::Path;

    match kind {
        MediaKind::Video => {
            let video_devices: Vec<_> = (0..10)
                .map(|i| format!("/dev/video{}", i))
                .filter(|path| Path::new(path).exists())
                .collect();

            if video_devices.is_empty() {
                return PermissionInfo {
                    status: PermissionStatus::NotDetermined,
                    message: "No video devices found at /dev/video*".to_string(),
                    can_request: false,
                };
            }

            let first_device = &video_devices[0];
            match fs::metadata(first_device) {
                Ok(_metadata) => {
                    if user_in_group(&["video", "plugdev"]) {
                        PermissionInfo {
                            status: PermissionStatus::Granted,
                            message: format!(
                                "Camera access granted (user in video group, {} found)",
                                first_device
                            ),
                            can_request: false,
                        }
                    } else {
                        PermissionInfo {
                            status: PermissionStatus::Denied,
                            message: format!(
                                "Camera device {} exists but user not in video group - run: sudo usermod -a -G video $USER",
                                first_device
                            ),
                            can_request: true,
                        }
                    }
                }
                Err(e) => PermissionInfo {
                    status: PermissionStatus::Denied,
                    message: format!("Cannot access {}: {}", first_device, e),
                    can_request: true,
                },
            }
        }
        MediaKind::Audio => {
            if !Path::new("/dev/snd").exists() {
                return PermissionInfo {
                    status: PermissionStatus::NotDetermined,
                    message: "No sound devices found at /dev/snd".to_string(),
                    can_request: false,
                };
            }
            if user_in_group(&["audio", "pipewire", "pulse"]) {
                PermissionInfo {
                    status: PermissionStatus::Granted,
                    message: "Microphone access granted (user in audio group)".to_string(),
                    can_request: false,
                }
            } else {
                // Most desktop distros route audio through a sound server
                // rather than group membership, so absence is not a denial.
                PermissionInfo {
                    status: PermissionStatus::NotDetermined,
                    message: "Microphone access mediated by the sound server".to_string(),
                    can_request: true,
                }
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn user_in_group(groups: &[&str]) -> bool {
    use std::process::Command;

    let output = Command::new("groups").output().ok();

    if let Some(output) = output {
        if let Ok(memberships) = String::from_utf8(output.stdout) {
            return groups.iter().any(|g| memberships.contains(g));
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display() {
        assert_eq!(PermissionStatus::Granted.to_string(), "granted");
        assert_eq!(PermissionStatus::NotDetermined.to_string(), "not_determined");
    }

    #[test]
    fn test_detailed_probe_has_message() {
        let info = check_permission_detailed(MediaKind::Audio);
        assert!(!info.message.is_empty());
    }
}
