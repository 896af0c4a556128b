// SPDX-License-Identifier: GPL-3.0-only

//! Capture screen state types

use crate::backends::camera::types::{BackendError, CameraFrame};
use crate::backends::library::SavedAsset;
use crate::backends::permissions::PermissionState;
use crate::errors::{CaptureError, PermissionError, SaveError};
use crate::pipelines::photo::CapturedPhoto;
use std::time::Instant;
use uuid::Uuid;

/// Where the screen is in its flow
#[derive(Debug, Clone, Default)]
pub enum Stage {
    /// Permission checks have not both answered yet
    #[default]
    AwaitingPermissions,
    /// Live camera preview, ready to capture
    LivePreview,
    /// A captured photo is shown with save and retake actions
    Reviewing(Review),
}

/// The photo under review. Only exists while reviewing.
#[derive(Debug, Clone)]
pub struct Review {
    pub photo: CapturedPhoto,
    /// Capture date, `YYYY/MM/DD`
    pub caption: String,
    /// A save of this photo is pending
    pub saving: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Permissions {
    pub camera: PermissionState,
    pub library: PermissionState,
}

impl Permissions {
    pub fn resolved(&self) -> bool {
        self.camera.is_resolved() && self.library.is_resolved()
    }
}

/// Which of the three layouts is on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    PermissionPending,
    Live,
    Review,
}

/// Controls that are shown but not wired to anything yet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionSlot {
    /// Thumbnail of the last photo, bottom left
    Gallery,
    /// Overflow menu, bottom right
    More,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient status line message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub expires_at: Instant,
}

#[derive(Debug, Clone)]
pub enum Message {
    // ===== Permissions =====
    RequestPermissions,
    PermissionsResolved {
        camera: Result<PermissionState, PermissionError>,
        library: Result<PermissionState, PermissionError>,
    },
    RequestCameraPermission,
    CameraPermissionResolved(Result<PermissionState, PermissionError>),

    // ===== Camera controls =====
    CycleFlash,
    ToggleFacing,
    PreviewFrame(CameraFrame),
    PreviewFailed(BackendError),

    // ===== Capture & review =====
    Capture,
    CaptureFinished(Result<CapturedPhoto, CaptureError>),
    Retake,
    SaveToLibrary,
    SaveFinished {
        photo_id: Uuid,
        result: Result<SavedAsset, SaveError>,
    },

    // ===== Misc =====
    Action(ActionSlot),
    ToggleHelp,
    Tick(Instant),
}
