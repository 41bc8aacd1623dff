//! Capture session management
//!
//! A [`CaptureSession`] owns the device inputs and output sinks for one live
//! capture and routes every payload onto the sink's fixed delivery queue.

mod device;
mod session;
mod sinks;

pub use device::{device_with_media_kind, DeviceProvider};
pub use session::{CaptureSession, DeviceInput};
pub use sinks::{AudioFrameSink, FaceMetadataSink, VideoFrameSink};
