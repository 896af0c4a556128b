// SPDX-License-Identifier: MPL-2.0

//! The capture screen
//!
//! One screen, three layouts: waiting for permissions, live preview and
//! review. All state lives in [`CaptureScreen`] and changes only in
//! [`CaptureScreen::update`]; I/O happens in the [`Task`]s it returns.
//!
//! # Architecture
//!
//! - `state`: Stage, Message and the small value types around them
//! - `task`: Deferred effects returned from `update`
//! - `update`: Message dispatch
//! - `handlers`: Message handlers grouped by concern
//! - `view`: ratatui rendering of the three layouts

mod handlers;
mod state;
mod task;
mod update;
pub mod view;

pub use state::{
    ActionSlot, Message, Notice, NoticeKind, Permissions, Review, Stage, ViewKind,
};
pub use task::Task;

use crate::backends::Platform;
use crate::backends::camera::types::{CameraFrame, CaptureOptions, Facing};
use crate::backends::library::SavedAsset;
use crate::config::Config;
use crate::constants::{polaroid, ui as ui_consts};
use crate::flash::FlashMode;
use crate::pipelines::photo::{CapturedPhoto, PhotoPipeline};
use chrono::NaiveDate;
use std::time::Duration;

/// Caption printed under a developed photo
pub fn caption_for(date: NaiveDate) -> String {
    date.format(polaroid::CAPTION_DATE_FORMAT).to_string()
}

/// Startup settings of the capture screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenSettings {
    pub options: CaptureOptions,
    pub facing: Facing,
    pub flash: FlashMode,
    pub show_error_notices: bool,
    pub notice_duration: Duration,
    pub mirror_front_photos: bool,
}

impl Default for ScreenSettings {
    fn default() -> Self {
        Self {
            options: CaptureOptions::default(),
            facing: Facing::default(),
            flash: FlashMode::default(),
            show_error_notices: true,
            notice_duration: Duration::from_millis(ui_consts::DEFAULT_NOTICE_DURATION_MS),
            mirror_front_photos: false,
        }
    }
}

impl From<&Config> for ScreenSettings {
    fn from(config: &Config) -> Self {
        Self {
            options: CaptureOptions {
                quality: config.capture_quality,
                skip_processing: config.skip_processing,
            },
            facing: config.default_facing,
            flash: config.default_flash,
            show_error_notices: config.show_error_notices,
            notice_duration: config.notice_duration(),
            mirror_front_photos: config.mirror_front_camera,
        }
    }
}

pub struct CaptureScreen {
    platform: Platform,
    pipeline: PhotoPipeline,
    options: CaptureOptions,
    stage: Stage,
    permissions: Permissions,
    facing: Facing,
    flash: FlashMode,
    /// Set while a capture task is pending
    capture_in_flight: bool,
    preview: Option<CameraFrame>,
    notice: Option<Notice>,
    show_error_notices: bool,
    notice_duration: Duration,
    show_help: bool,
    last_saved: Option<SavedAsset>,
}

impl CaptureScreen {
    pub fn new(platform: Platform, settings: ScreenSettings) -> Self {
        Self {
            platform,
            pipeline: PhotoPipeline::new(settings.mirror_front_photos),
            options: settings.options,
            stage: Stage::AwaitingPermissions,
            permissions: Permissions::default(),
            facing: settings.facing,
            flash: settings.flash,
            capture_in_flight: false,
            preview: None,
            notice: None,
            show_error_notices: settings.show_error_notices,
            notice_duration: settings.notice_duration,
            show_help: false,
            last_saved: None,
        }
    }

    /// First task to run after construction
    pub fn mount(&mut self) -> Task<Message> {
        self.request_permissions()
    }

    /// Run `message` and every follow-up message to completion.
    ///
    /// Used where no event loop exists: the headless CLI and tests.
    pub async fn perform(&mut self, message: Message) {
        let mut next = Some(message);
        while let Some(message) = next.take() {
            next = self.update(message).run().await;
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn view_kind(&self) -> ViewKind {
        match self.stage {
            Stage::AwaitingPermissions => ViewKind::PermissionPending,
            Stage::LivePreview => ViewKind::Live,
            Stage::Reviewing(_) => ViewKind::Review,
        }
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn flash(&self) -> FlashMode {
        self.flash
    }

    pub fn is_capturing(&self) -> bool {
        self.capture_in_flight
    }

    pub fn is_saving(&self) -> bool {
        matches!(&self.stage, Stage::Reviewing(review) if review.saving)
    }

    /// The photo under review
    pub fn captured_photo(&self) -> Option<&CapturedPhoto> {
        match &self.stage {
            Stage::Reviewing(review) => Some(&review.photo),
            _ => None,
        }
    }

    /// Caption under the frame: the capture date in review, the placeholder otherwise
    pub fn caption(&self) -> &str {
        match &self.stage {
            Stage::Reviewing(review) => &review.caption,
            _ => polaroid::PLACEHOLDER_CAPTION,
        }
    }

    pub fn preview_frame(&self) -> Option<&CameraFrame> {
        self.preview.as_ref()
    }

    /// Facing the preview should stream from, if a preview should run at all
    pub fn wanted_preview(&self) -> Option<Facing> {
        match self.stage {
            Stage::LivePreview if self.permissions.camera.is_granted() => Some(self.facing),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn last_saved(&self) -> Option<&SavedAsset> {
        self.last_saved.as_ref()
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }
}
