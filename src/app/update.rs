// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` routes each message to a handler in the `handlers` modules:
//!
//! - `handlers::system`: Permissions, placeholder actions, help, notices
//! - `handlers::camera`: Flash, facing, preview frames
//! - `handlers::capture`: Capture, review, save and retake

use super::state::Message;
use super::task::Task;
use super::CaptureScreen;

impl CaptureScreen {
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            // ===== Permissions =====
            Message::RequestPermissions => self.request_permissions(),
            Message::PermissionsResolved { camera, library } => {
                self.handle_permissions_resolved(camera, library)
            }
            Message::RequestCameraPermission => self.request_camera_permission(),
            Message::CameraPermissionResolved(result) => {
                self.handle_camera_permission_resolved(result)
            }

            // ===== Camera controls =====
            Message::CycleFlash => self.cycle_flash(),
            Message::ToggleFacing => self.toggle_facing(),
            Message::PreviewFrame(frame) => self.handle_preview_frame(frame),
            Message::PreviewFailed(error) => self.handle_preview_failed(error),

            // ===== Capture & review =====
            Message::Capture => self.capture(),
            Message::CaptureFinished(result) => self.handle_capture_finished(result),
            Message::Retake => self.retake(),
            Message::SaveToLibrary => self.save_to_library(),
            Message::SaveFinished { photo_id, result } => {
                self.handle_save_finished(photo_id, result)
            }

            // ===== Misc =====
            Message::Action(slot) => self.trigger(slot),
            Message::ToggleHelp => {
                self.show_help = !self.show_help;
                Task::none()
            }
            Message::Tick(now) => self.handle_tick(now),
        }
    }
}
