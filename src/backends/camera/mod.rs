// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   CaptureScreen     │
//! └──────────┬──────────┘
//!            │  Arc<dyn CameraBackend>
//!            ▼
//! ┌─────────────────────┐
//! │  CameraBackend Trait│  ← Common interface
//! └──────────┬──────────┘
//!            │
//!       ┌────┴─────┐
//!       ▼          ▼
//!   ┌──────┐  ┌─────────┐
//!   │ V4L2 │  │ Virtual │
//!   └──────┘  └─────────┘
//! ```

pub mod format_converters;
pub mod types;
pub mod v4l2;
pub mod virtual_camera;

pub use types::*;
pub use v4l2::V4l2Backend;
pub use virtual_camera::VirtualCamera;

/// Camera device collaborator
///
/// Methods block; the capture screen runs them on tokio's blocking pool.
pub trait CameraBackend: Send + Sync {
    /// Enumerate available cameras on this backend
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Start streaming preview frames from the camera for `facing`.
    ///
    /// Replaces any running preview. Frames are dropped when the receiver
    /// falls behind, so it always sees recent frames.
    fn start_preview(&self, facing: Facing) -> BackendResult<FrameReceiver>;

    /// Stop the running preview, if any
    fn stop_preview(&self);

    /// Take one picture
    ///
    /// Fires the flash according to `request.flash` and returns a frame
    /// taken after the flash settled.
    fn capture_photo(&self, request: &CaptureRequest) -> BackendResult<CameraFrame>;

    /// Get the backend type identifier
    fn backend_type(&self) -> CameraBackendType;
}

/// Pick the device for a facing.
///
/// Devices with a matching location hint win; otherwise the first device
/// stands in for the back camera and the second for the front one. With a
/// single camera both facings use it.
pub fn select_device(devices: &[CameraDevice], facing: Facing) -> Option<&CameraDevice> {
    if let Some(device) = devices.iter().find(|d| d.facing == Some(facing)) {
        return Some(device);
    }

    let unhinted: Vec<&CameraDevice> = devices.iter().filter(|d| d.facing.is_none()).collect();
    let index = match facing {
        Facing::Back => 0,
        Facing::Front => 1,
    };

    unhinted
        .get(index)
        .or_else(|| unhinted.first())
        .copied()
        .or_else(|| devices.first())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(name: &str, facing: Option<Facing>) -> CameraDevice {
        CameraDevice {
            name: name.to_string(),
            path: format!("/dev/{}", name),
            driver: None,
            facing,
            rotation: SensorRotation::None,
        }
    }

    #[test]
    fn location_hints_win() {
        let devices = vec![device("a", Some(Facing::Front)), device("b", Some(Facing::Back))];
        assert_eq!(select_device(&devices, Facing::Back).unwrap().name, "b");
        assert_eq!(select_device(&devices, Facing::Front).unwrap().name, "a");
    }

    #[test]
    fn order_decides_without_hints() {
        let devices = vec![device("first", None), device("second", None)];
        assert_eq!(select_device(&devices, Facing::Back).unwrap().name, "first");
        assert_eq!(select_device(&devices, Facing::Front).unwrap().name, "second");
    }

    #[test]
    fn single_camera_serves_both_facings() {
        let devices = vec![device("webcam", None)];
        assert_eq!(select_device(&devices, Facing::Front).unwrap().name, "webcam");
        assert!(select_device(&[], Facing::Back).is_none());
    }
}
