//! Core data types shared across the capture pipeline

use serde::{Deserialize, Serialize};

/// Kind of media a capture device produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Audio => write!(f, "audio"),
        }
    }
}

/// Physical facing of a camera device
///
/// Microphones carry no position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePosition {
    Front,
    Back,
}

/// A physical capture device, selected once at configuration time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    /// Unique device identifier
    pub id: String,
    /// Human-readable device name
    pub name: String,
    /// Media kind this device produces
    pub kind: MediaKind,
    /// Camera facing, if known
    pub position: Option<DevicePosition>,
}

impl DeviceDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        kind: MediaKind,
        position: Option<DevicePosition>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            position,
        }
    }
}

/// Requested capture format for the camera stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureFormat {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl CaptureFormat {
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self { width, height, fps }
    }
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self::new(1280, 720, 30.0)
    }
}

/// A single captured video frame (RGB24, interleaved)
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Raw RGB pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Capture timestamp in seconds on the shared capture clock
    pub timestamp: f64,
    /// Identifier of the producing device
    pub device_id: String,
}

impl VideoFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, timestamp: f64, device_id: String) -> Self {
        Self {
            data,
            width,
            height,
            timestamp,
            device_id,
        }
    }
}

/// A single captured audio buffer (interleaved f32 PCM)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Interleaved f32 PCM samples
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Capture timestamp in seconds on the shared capture clock
    pub timestamp: f64,
}

impl AudioFrame {
    /// Duration of this buffer in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        (self.samples.len() as f64 / self.channels as f64) / self.sample_rate as f64
    }
}

/// Category of a metadata object produced by the platform detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetadataKind {
    Face,
    Barcode,
    Text,
}

/// Rectangle in normalized coordinates, origin top-left, values in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A face region reported by the platform's detector
///
/// The detection algorithm itself lives outside this crate; these objects are
/// only routed to the metadata sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    /// Bounding box of the detected face
    pub bounds: NormalizedRect,
    /// Detector-assigned tracking id, stable across frames for one face
    pub tracking_id: Option<u64>,
    /// Detection timestamp in seconds on the shared capture clock
    pub timestamp: f64,
}

/// A metadata object as delivered by the platform detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataObject {
    pub kind: MetadataKind,
    pub face: Option<FaceRegion>,
}

impl MetadataObject {
    pub fn face(region: FaceRegion) -> Self {
        Self {
            kind: MetadataKind::Face,
            face: Some(region),
        }
    }
}
