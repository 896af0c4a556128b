// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture screen and its collaborators

use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error for the CLI and configuration surface
#[derive(Debug, Clone)]
pub enum AppError {
    /// Photo capture errors
    Capture(CaptureError),
    /// Photo library errors
    Save(SaveError),
    /// Permission probing errors
    Permission(PermissionError),
    /// Configuration errors
    Config(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Generic error with message
    Other(String),
}

/// Errors raised while taking a picture
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// No camera device matches the request
    NoCameraFound,
    /// The camera backend failed to deliver a frame
    Backend(BackendError),
    /// The frame could not be turned into an image
    ProcessingFailed(String),
    /// The background task running the capture died
    TaskFailed(String),
}

/// Errors raised while writing a photo to the library
#[derive(Debug, Clone)]
pub enum SaveError {
    /// The library refused access
    PermissionDenied,
    /// Encoding to the output format failed
    EncodingFailed(String),
    /// Writing the asset failed
    WriteFailed(String),
    /// The background task running the save died
    TaskFailed(String),
}

/// Errors raised while probing or requesting a permission
#[derive(Debug, Clone)]
pub enum PermissionError {
    /// The probe itself could not run
    ProbeFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Capture(e) => write!(f, "Capture error: {}", e),
            AppError::Save(e) => write!(f, "Save error: {}", e),
            AppError::Permission(e) => write!(f, "Permission error: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::NoCameraFound => write!(f, "No camera found"),
            CaptureError::Backend(e) => write!(f, "{}", e),
            CaptureError::ProcessingFailed(msg) => write!(f, "Processing failed: {}", msg),
            CaptureError::TaskFailed(msg) => write!(f, "Capture task failed: {}", msg),
        }
    }
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::PermissionDenied => write!(f, "Photo library access denied"),
            SaveError::EncodingFailed(msg) => write!(f, "Encoding failed: {}", msg),
            SaveError::WriteFailed(msg) => write!(f, "Write failed: {}", msg),
            SaveError::TaskFailed(msg) => write!(f, "Save task failed: {}", msg),
        }
    }
}

impl fmt::Display for PermissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionError::ProbeFailed(msg) => write!(f, "Permission probe failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}
impl std::error::Error for CaptureError {}
impl std::error::Error for SaveError {}
impl std::error::Error for PermissionError {}

impl From<CaptureError> for AppError {
    fn from(err: CaptureError) -> Self {
        AppError::Capture(err)
    }
}

impl From<SaveError> for AppError {
    fn from(err: SaveError) -> Self {
        AppError::Save(err)
    }
}

impl From<PermissionError> for AppError {
    fn from(err: PermissionError) -> Self {
        AppError::Permission(err)
    }
}

impl From<BackendError> for CaptureError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DeviceNotFound(_) => CaptureError::NoCameraFound,
            other => CaptureError::Backend(other),
        }
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for SaveError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => SaveError::PermissionDenied,
            _ => SaveError::WriteFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
