// SPDX-License-Identifier: GPL-3.0-only

//! Flash, facing and preview handlers

use crate::app::CaptureScreen;
use crate::app::state::{Message, Stage};
use crate::app::task::Task;
use crate::backends::camera::types::{BackendError, CameraFrame};
use tracing::{debug, error, info};

impl CaptureScreen {
    /// Off -> On -> Auto -> Off
    pub fn cycle_flash(&mut self) -> Task<Message> {
        self.flash = self.flash.next();
        info!(flash = %self.flash, "Flash mode changed");
        Task::none()
    }

    /// Back <-> Front. Ignored while a capture is pending: the capture
    /// reads from the stream of the current facing.
    pub fn toggle_facing(&mut self) -> Task<Message> {
        if self.capture_in_flight {
            debug!("Facing change ignored: capture in progress");
            return Task::none();
        }
        self.facing = self.facing.toggled();
        // Frames of the other sensor are stale now
        self.preview = None;
        info!(facing = %self.facing, "Camera facing changed");
        Task::none()
    }

    pub(crate) fn handle_preview_frame(&mut self, frame: CameraFrame) -> Task<Message> {
        if matches!(self.stage, Stage::LivePreview) {
            self.preview = Some(frame);
        }
        Task::none()
    }

    pub(crate) fn handle_preview_failed(&mut self, err: BackendError) -> Task<Message> {
        error!(error = %err, facing = %self.facing, "Failed to start preview");
        self.preview = None;
        self.report_error(format!("Camera unavailable: {}", err));
        Task::none()
    }
}
