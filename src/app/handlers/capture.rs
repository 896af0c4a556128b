// SPDX-License-Identifier: GPL-3.0-only

//! Capture, review, save and retake handlers

use crate::app::state::{Message, Review, Stage};
use crate::app::task::Task;
use crate::app::{CaptureScreen, caption_for};
use crate::backends::camera::select_device;
use crate::backends::camera::types::CaptureRequest;
use crate::backends::library::SavedAsset;
use crate::errors::{CaptureError, SaveError};
use crate::pipelines::photo::CapturedPhoto;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

impl CaptureScreen {
    /// Take a picture. Ignored outside the live preview and while a
    /// capture is already pending.
    pub fn capture(&mut self) -> Task<Message> {
        if !matches!(self.stage, Stage::LivePreview) {
            debug!("Capture ignored: not in live preview");
            return Task::none();
        }
        if self.capture_in_flight {
            debug!("Capture ignored: already in progress");
            return Task::none();
        }

        self.capture_in_flight = true;
        let request = CaptureRequest {
            facing: self.facing,
            flash: self.flash,
            options: self.options,
        };
        info!(facing = %request.facing, flash = %request.flash, "Capturing photo");

        let camera = Arc::clone(&self.platform.camera);
        let pipeline = self.pipeline;

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || {
                    let rotation = select_device(&camera.enumerate_cameras(), request.facing)
                        .map(|device| device.rotation)
                        .unwrap_or_default();
                    let frame = camera.capture_photo(&request)?;
                    pipeline.process(&frame, &request, rotation)
                })
                .await
                .unwrap_or_else(|e| Err(CaptureError::TaskFailed(e.to_string())))
            },
            Message::CaptureFinished,
        )
    }

    pub(crate) fn handle_capture_finished(
        &mut self,
        result: Result<CapturedPhoto, CaptureError>,
    ) -> Task<Message> {
        self.capture_in_flight = false;

        match result {
            Ok(photo) => {
                if !matches!(self.stage, Stage::LivePreview) {
                    warn!(?photo, "Dropping photo: screen left the live preview");
                    return Task::none();
                }
                let caption = caption_for(photo.captured_at().date_naive());
                self.preview = None;
                self.stage = Stage::Reviewing(Review {
                    photo,
                    caption,
                    saving: false,
                });
            }
            Err(e) => {
                error!(error = %e, "Failed to capture photo");
                self.report_error(format!("Capture failed: {}", e));
            }
        }
        Task::none()
    }

    /// Discard the photo under review. Flash and facing stay as they are.
    pub fn retake(&mut self) -> Task<Message> {
        if let Stage::Reviewing(review) = &self.stage {
            info!(photo = %review.photo.id(), "Retake");
            self.stage = Stage::LivePreview;
        }
        Task::none()
    }

    /// Persist the photo under review.
    ///
    /// Does nothing without a photo, without library permission, or while
    /// a save of the same photo is pending.
    pub fn save_to_library(&mut self) -> Task<Message> {
        let Stage::Reviewing(review) = &mut self.stage else {
            debug!("Save ignored: nothing to save");
            return Task::none();
        };
        if !self.permissions.library.is_granted() {
            info!(library = %self.permissions.library, "Save ignored: no library permission");
            return Task::none();
        }
        if review.saving {
            debug!("Save ignored: already saving");
            return Task::none();
        }

        review.saving = true;
        let photo = review.photo.clone();
        let photo_id = photo.id();
        let library = Arc::clone(&self.platform.library);
        info!(photo = %photo_id, "Saving photo");

        Task::perform(
            async move {
                tokio::task::spawn_blocking(move || library.save_asset(&photo))
                    .await
                    .unwrap_or_else(|e| Err(SaveError::TaskFailed(e.to_string())))
            },
            move |result| Message::SaveFinished { photo_id, result },
        )
    }

    pub(crate) fn handle_save_finished(
        &mut self,
        photo_id: Uuid,
        result: Result<SavedAsset, SaveError>,
    ) -> Task<Message> {
        let under_review =
            matches!(&self.stage, Stage::Reviewing(review) if review.photo.id() == photo_id);

        match result {
            Ok(asset) => {
                info!(path = %asset.path.display(), "Photo saved to library");
                if under_review {
                    self.stage = Stage::LivePreview;
                    self.notify(format!("Saved {}", asset.path.display()));
                } else {
                    // Retaken while the save ran; the file is kept all the same
                    debug!(photo = %photo_id, "Saved photo is no longer under review");
                }
                self.last_saved = Some(asset);
            }
            Err(e) => {
                error!(error = %e, photo = %photo_id, "Failed to save photo");
                if let Stage::Reviewing(review) = &mut self.stage
                    && review.photo.id() == photo_id
                {
                    review.saving = false;
                }
                self.report_error(format!("Save failed: {}", e));
            }
        }
        Task::none()
    }
}
