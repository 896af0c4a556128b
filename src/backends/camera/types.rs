// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::flash::FlashMode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Camera backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CameraBackendType {
    /// Native V4L2 capture devices
    #[default]
    V4l2,
    /// Still image or generated test pattern
    Virtual,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::Virtual => write!(f, "virtual"),
        }
    }
}

/// Which physical sensor is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Facing {
    /// World-facing camera
    #[default]
    Back,
    /// User-facing (selfie) camera
    Front,
}

impl Facing {
    /// The other sensor
    pub fn toggled(self) -> Self {
        match self {
            Facing::Back => Facing::Front,
            Facing::Front => Facing::Back,
        }
    }

    /// Parse a location hint from a device or sysfs name
    pub fn from_location(location: &str) -> Option<Self> {
        let location = location.to_ascii_lowercase();
        if location.contains("front") || location.contains("user") {
            Some(Facing::Front)
        } else if location.contains("back") || location.contains("rear") {
            Some(Facing::Back)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Back => write!(f, "back"),
            Facing::Front => write!(f, "front"),
        }
    }
}

/// Sensor rotation in degrees (clockwise)
///
/// Sensors on phones and tablets are often mounted at 90° or 270° relative
/// to the display. The rotation is undone when the photo is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorRotation {
    /// No rotation (sensor is oriented correctly)
    #[default]
    None,
    /// 90 degrees clockwise
    Rotate90,
    /// 180 degrees (upside down)
    Rotate180,
    /// 270 degrees clockwise (90 degrees counter-clockwise)
    Rotate270,
}

impl SensorRotation {
    /// Create rotation from an integer degree value (normalised to 0-360).
    pub fn from_degrees_int(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => SensorRotation::Rotate90,
            180 => SensorRotation::Rotate180,
            270 => SensorRotation::Rotate270,
            _ => SensorRotation::None,
        }
    }

    /// Get the rotation in degrees
    pub fn degrees(&self) -> u32 {
        match self {
            SensorRotation::None => 0,
            SensorRotation::Rotate90 => 90,
            SensorRotation::Rotate180 => 180,
            SensorRotation::Rotate270 => 270,
        }
    }
}

impl std::fmt::Display for SensorRotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}°", self.degrees())
    }
}

/// Represents a camera device
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    pub path: String,              // Device node (e.g. /dev/video0) or virtual source
    pub driver: Option<String>,    // V4L2 driver name
    pub facing: Option<Facing>,    // Location hint, None when unknown
    pub rotation: SensorRotation,  // Sensor mounting rotation
}

/// Camera format specification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraFormat {
    pub width: u32,
    pub height: u32,
    pub fourcc: String, // FourCC code (e.g., "MJPG", "YUYV")
}

impl std::fmt::Display for CameraFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{} {}", self.width, self.height, self.fourcc)
    }
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
    /// YUYV - Packed 4:2:2 (Y0 U Y1 V interleaved)
    YUYV,
    /// UYVY - Packed 4:2:2 (U Y0 V Y1 interleaved)
    UYVY,
    /// NV12 - Semi-planar 4:2:0 (Y plane + interleaved UV plane)
    NV12,
}

impl PixelFormat {
    /// Map a V4L2 FourCC to a frame format. MJPG is decoded to RGB24 before
    /// it becomes a frame, so it maps as well.
    pub fn from_fourcc(fourcc: &str) -> Option<Self> {
        match fourcc {
            "YUYV" | "YUY2" => Some(Self::YUYV),
            "UYVY" => Some(Self::UYVY),
            "NV12" => Some(Self::NV12),
            "GREY" | "Y8  " => Some(Self::Gray8),
            "RGB3" | "MJPG" | "JPEG" => Some(Self::RGB24),
            "AB24" | "RGBA" => Some(Self::RGBA),
            _ => None,
        }
    }

    /// Average bytes per pixel (accounting for chroma subsampling)
    pub fn bytes_per_pixel(&self) -> f32 {
        match self {
            Self::RGBA => 4.0,
            Self::RGB24 => 3.0,
            Self::YUYV | Self::UYVY => 2.0,
            Self::NV12 => 1.5,
            Self::Gray8 => 1.0,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Pixel data, layout given by `format` and `stride`
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride for the main plane (bytes per row, may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a tightly packed RGB24 frame
    pub fn from_rgb(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: Arc::from(data.into_boxed_slice()),
            format: PixelFormat::RGB24,
            stride: width * 3,
            captured_at: Instant::now(),
        }
    }

    /// Bytes the frame must hold for its dimensions and stride
    pub fn expected_len(&self) -> usize {
        match self.format {
            PixelFormat::NV12 => {
                (self.stride * self.height) as usize + (self.stride * self.height.div_ceil(2)) as usize
            }
            _ => (self.stride * self.height) as usize,
        }
    }
}

/// Capture quality settings forwarded with every capture request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Compression quality from 0.0 to 1.0
    pub quality: f32,
    /// Skip orientation processing and keep the sensor's raw layout
    pub skip_processing: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            quality: 1.0,
            skip_processing: false,
        }
    }
}

/// Everything a backend needs to take one picture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    pub facing: Facing,
    pub flash: FlashMode,
    pub options: CaptureOptions,
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone)]
pub enum BackendError {
    /// Backend is not available on this system
    NotAvailable(String),
    /// Failed to initialize backend
    InitializationFailed(String),
    /// Camera device not found
    DeviceNotFound(String),
    /// Format not supported
    FormatNotSupported(String),
    /// No frame arrived in time
    Timeout(String),
    /// General I/O error
    IoError(String),
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::NotAvailable(msg) => write!(f, "Backend not available: {}", msg),
            BackendError::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::FormatNotSupported(msg) => write!(f, "Format not supported: {}", msg),
            BackendError::Timeout(msg) => write!(f, "Timed out: {}", msg),
            BackendError::IoError(msg) => write!(f, "I/O error: {}", msg),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::IoError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_toggle_round_trips() {
        assert_eq!(Facing::Back.toggled(), Facing::Front);
        assert_eq!(Facing::Back.toggled().toggled(), Facing::Back);
    }

    #[test]
    fn facing_from_location_hints() {
        assert_eq!(Facing::from_location("Front Camera"), Some(Facing::Front));
        assert_eq!(Facing::from_location("rear"), Some(Facing::Back));
        assert_eq!(Facing::from_location("HD Webcam C920"), None);
    }

    #[test]
    fn rotation_parsing_normalises() {
        assert_eq!(SensorRotation::from_degrees_int(270), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees_int(-90), SensorRotation::Rotate270);
        assert_eq!(SensorRotation::from_degrees_int(45), SensorRotation::None);
        assert_eq!(SensorRotation::from_degrees_int(450).degrees(), 90);
    }

    #[test]
    fn nv12_expected_len_includes_chroma() {
        let frame = CameraFrame {
            width: 4,
            height: 3,
            data: Arc::from(vec![0u8; 20]),
            format: PixelFormat::NV12,
            stride: 4,
            captured_at: Instant::now(),
        };
        assert_eq!(frame.expected_len(), 12 + 8);
    }
}
