// SPDX-License-Identifier: GPL-3.0-only

//! Permission, placeholder action and notice handlers

use crate::app::CaptureScreen;
use crate::app::state::{ActionSlot, Message, Notice, NoticeKind, Stage};
use crate::app::task::Task;
use crate::backends::permissions::PermissionState;
use crate::errors::PermissionError;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// A failed probe counts as a denial
fn settle(what: &str, result: Result<PermissionState, PermissionError>) -> PermissionState {
    match result {
        Ok(state) => state,
        Err(e) => {
            error!(permission = what, error = %e, "Permission request failed");
            PermissionState::Denied
        }
    }
}

impl CaptureScreen {
    /// Ask for library access, then camera access unless already granted
    pub fn request_permissions(&mut self) -> Task<Message> {
        let permissions = Arc::clone(&self.platform.permissions);

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || {
                    let library = permissions.request_library();
                    let camera = match permissions.camera_status() {
                        Ok(state) if state.is_granted() => Ok(state),
                        _ => permissions.request_camera(),
                    };
                    (camera, library)
                })
                .await
                .unwrap_or_else(|e| {
                    let err = PermissionError::ProbeFailed(e.to_string());
                    (Err(err.clone()), Err(err))
                })
            },
            |(camera, library)| Message::PermissionsResolved { camera, library },
        )
    }

    /// Ask for camera access again
    pub fn request_camera_permission(&mut self) -> Task<Message> {
        let permissions = Arc::clone(&self.platform.permissions);

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || permissions.request_camera())
                    .await
                    .unwrap_or_else(|e| Err(PermissionError::ProbeFailed(e.to_string())))
            },
            Message::CameraPermissionResolved,
        )
    }

    pub(crate) fn handle_permissions_resolved(
        &mut self,
        camera: Result<PermissionState, PermissionError>,
        library: Result<PermissionState, PermissionError>,
    ) -> Task<Message> {
        self.permissions.camera = settle("camera", camera);
        self.permissions.library = settle("library", library);
        info!(
            camera = %self.permissions.camera,
            library = %self.permissions.library,
            "Permissions resolved"
        );
        self.leave_permission_stage();
        Task::none()
    }

    pub(crate) fn handle_camera_permission_resolved(
        &mut self,
        result: Result<PermissionState, PermissionError>,
    ) -> Task<Message> {
        self.permissions.camera = settle("camera", result);
        info!(camera = %self.permissions.camera, "Camera permission updated");
        if !self.permissions.camera.is_granted() {
            self.report_error("Camera access denied".to_string());
        }
        self.leave_permission_stage();
        Task::none()
    }

    fn leave_permission_stage(&mut self) {
        if matches!(self.stage, Stage::AwaitingPermissions) && self.permissions.resolved() {
            self.stage = Stage::LivePreview;
        }
    }

    /// Placeholder controls: shown, but bound to nothing
    pub fn trigger(&mut self, slot: ActionSlot) -> Task<Message> {
        debug!(?slot, "No action bound to this control");
        Task::none()
    }

    pub(crate) fn handle_tick(&mut self, now: Instant) -> Task<Message> {
        if self.notice.as_ref().is_some_and(|n| n.expires_at <= now) {
            self.notice = None;
        }
        Task::none()
    }

    /// Show a failure on the status line, when enabled
    pub(crate) fn report_error(&mut self, text: String) {
        if self.show_error_notices {
            self.set_notice(text, NoticeKind::Error);
        }
    }

    pub(crate) fn notify(&mut self, text: String) {
        self.set_notice(text, NoticeKind::Info);
    }

    fn set_notice(&mut self, text: String, kind: NoticeKind) {
        self.notice = Some(Notice {
            text,
            kind,
            expires_at: Instant::now() + self.notice_duration,
        });
    }
}
