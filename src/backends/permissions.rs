// SPDX-License-Identifier: GPL-3.0-only

//! Camera and photo library permissions
//!
//! Linux has no permission prompts for either resource, so "requesting"
//! probes access: a camera is granted when a capture node can be opened
//! read-write, the library when the photo directory can be written.

use crate::errors::PermissionError;
use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Tri-state permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    /// Not asked yet
    #[default]
    Unknown,
    Granted,
    Denied,
}

impl PermissionState {
    pub fn is_granted(&self) -> bool {
        *self == PermissionState::Granted
    }

    /// An answer is known, either way
    pub fn is_resolved(&self) -> bool {
        *self != PermissionState::Unknown
    }

    fn from_bool(granted: bool) -> Self {
        if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }
}

impl std::fmt::Display for PermissionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionState::Unknown => write!(f, "unknown"),
            PermissionState::Granted => write!(f, "granted"),
            PermissionState::Denied => write!(f, "denied"),
        }
    }
}

/// Permission collaborator
///
/// Methods block; the capture screen runs them on tokio's blocking pool.
pub trait PermissionProvider: Send + Sync {
    /// Current camera permission, without prompting
    fn camera_status(&self) -> Result<PermissionState, PermissionError>;

    /// Ask for camera access
    fn request_camera(&self) -> Result<PermissionState, PermissionError>;

    /// Ask for photo library write access
    fn request_library(&self) -> Result<PermissionState, PermissionError>;
}

/// Probes the real system
pub struct SystemPermissions {
    device_dir: PathBuf,
    library_dir: PathBuf,
    virtual_camera: bool,
}

impl SystemPermissions {
    /// Probe `/dev` for cameras and `library_dir` for saving
    pub fn new(library_dir: PathBuf) -> Self {
        Self {
            device_dir: PathBuf::from("/dev"),
            library_dir,
            virtual_camera: false,
        }
    }

    /// Camera access is always granted (the camera is virtual)
    pub fn with_virtual_camera(mut self) -> Self {
        self.virtual_camera = true;
        self
    }

    /// Look for capture nodes in another directory
    pub fn with_device_dir(mut self, device_dir: PathBuf) -> Self {
        self.device_dir = device_dir;
        self
    }

    fn probe_camera(&self) -> Result<PermissionState, PermissionError> {
        if self.virtual_camera {
            return Ok(PermissionState::Granted);
        }

        let entries = std::fs::read_dir(&self.device_dir).map_err(|e| {
            PermissionError::ProbeFailed(format!("{}: {}", self.device_dir.display(), e))
        })?;

        let nodes: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| crate::backends::camera::v4l2::is_video_node(path))
            .collect();

        let accessible = nodes
            .iter()
            .filter(|path| has_access(path, libc::R_OK | libc::W_OK))
            .count();

        debug!(nodes = nodes.len(), accessible, "Probed camera access");
        Ok(PermissionState::from_bool(accessible > 0))
    }
}

impl PermissionProvider for SystemPermissions {
    fn camera_status(&self) -> Result<PermissionState, PermissionError> {
        self.probe_camera()
    }

    fn request_camera(&self) -> Result<PermissionState, PermissionError> {
        let state = self.probe_camera()?;
        info!(%state, "Camera permission");
        Ok(state)
    }

    fn request_library(&self) -> Result<PermissionState, PermissionError> {
        if let Err(e) = std::fs::create_dir_all(&self.library_dir) {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                info!(dir = %self.library_dir.display(), "Photo library not writable");
                return Ok(PermissionState::Denied);
            }
            return Err(PermissionError::ProbeFailed(format!(
                "{}: {}",
                self.library_dir.display(),
                e
            )));
        }

        let state = PermissionState::from_bool(has_access(&self.library_dir, libc::W_OK));
        info!(dir = %self.library_dir.display(), %state, "Photo library permission");
        Ok(state)
    }
}

/// Fixed answers, for embedding and tests
#[derive(Debug, Clone, Copy)]
pub struct StaticPermissions {
    pub camera: PermissionState,
    pub library: PermissionState,
}

impl StaticPermissions {
    pub fn granted() -> Self {
        Self {
            camera: PermissionState::Granted,
            library: PermissionState::Granted,
        }
    }
}

impl PermissionProvider for StaticPermissions {
    fn camera_status(&self) -> Result<PermissionState, PermissionError> {
        Ok(self.camera)
    }

    fn request_camera(&self) -> Result<PermissionState, PermissionError> {
        Ok(self.camera)
    }

    fn request_library(&self) -> Result<PermissionState, PermissionError> {
        Ok(self.library)
    }
}

/// `access(2)` for the real uid
fn has_access(path: &Path, mode: libc::c_int) -> bool {
    let Ok(c_path) = CString::new(path.as_os_str().as_bytes()) else {
        return false;
    };
    unsafe { libc::access(c_path.as_ptr(), mode) == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("polaroid-perm-{}-{}", tag, uuid::Uuid::new_v4()))
    }

    #[test]
    fn resolution() {
        assert!(!PermissionState::Unknown.is_resolved());
        assert!(PermissionState::Denied.is_resolved());
        assert!(PermissionState::Granted.is_granted());
        assert!(!PermissionState::Denied.is_granted());
    }

    #[test]
    fn library_directory_is_created() {
        let dir = scratch_dir("library");
        let permissions = SystemPermissions::new(dir.clone()).with_virtual_camera();
        assert_eq!(permissions.request_library().unwrap(), PermissionState::Granted);
        assert!(dir.is_dir());
        assert_eq!(permissions.camera_status().unwrap(), PermissionState::Granted);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn camera_needs_a_video_node() {
        let devices = scratch_dir("dev");
        std::fs::create_dir_all(&devices).unwrap();
        let permissions = SystemPermissions::new(scratch_dir("unused")).with_device_dir(devices.clone());
        assert_eq!(permissions.request_camera().unwrap(), PermissionState::Denied);

        std::fs::write(devices.join("video0"), b"").unwrap();
        assert_eq!(permissions.request_camera().unwrap(), PermissionState::Granted);
        std::fs::remove_dir_all(&devices).ok();
    }

    #[test]
    fn missing_device_directory_is_a_probe_failure() {
        let permissions = SystemPermissions::new(scratch_dir("unused"))
            .with_device_dir(PathBuf::from("/nonexistent/dev"));
        assert!(matches!(
            permissions.camera_status(),
            Err(PermissionError::ProbeFailed(_))
        ));
    }
}
