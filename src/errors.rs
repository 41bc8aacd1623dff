use std::fmt;

#[derive(Debug)]
pub enum CaptureError {
    DeviceUnavailable(String),
    ConfigurationError(String),
    PermissionDenied(String),
    SessionError(String),
    RecordingError(String),
    RuntimeFault(String),
    #[cfg(feature = "recording")]
    EncodingError(String),
    #[cfg(feature = "recording")]
    MuxingError(String),
    #[cfg(feature = "recording")]
    IoError(String),
    #[cfg(feature = "audio")]
    AudioError(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CaptureError::DeviceUnavailable(msg) => write!(f, "Device unavailable: {}", msg),
            CaptureError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            CaptureError::PermissionDenied(msg) => write!(f, "Permission denied error: {}", msg),
            CaptureError::SessionError(msg) => write!(f, "Capture session error: {}", msg),
            CaptureError::RecordingError(msg) => write!(f, "Recording error: {}", msg),
            CaptureError::RuntimeFault(msg) => write!(f, "Runtime capture fault: {}", msg),
            #[cfg(feature = "recording")]
            CaptureError::EncodingError(msg) => write!(f, "Encoding error: {}", msg),
            #[cfg(feature = "recording")]
            CaptureError::MuxingError(msg) => write!(f, "Muxing error: {}", msg),
            #[cfg(feature = "recording")]
            CaptureError::IoError(msg) => write!(f, "IO error: {}", msg),
            #[cfg(feature = "audio")]
            CaptureError::AudioError(msg) => write!(f, "Audio error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}
