// SPDX-License-Identifier: MPL-2.0

//! Photo pipeline
//!
//! ```text
//! Camera Backend → CameraFrame → Post-Processing → CapturedPhoto
//!                                                      │
//!                         (review, then save)          ▼
//!                                        Encoding → Photo Library
//! ```
//!
//! A [`CapturedPhoto`] is the handle the capture screen holds while the
//! user reviews a shot. It owns decoded RGB pixels; nothing touches disk
//! until the photo is saved.

pub mod encoding;
pub mod processing;

pub use encoding::{EncodedImage, EncodingFormat, PhotoEncoder, jpeg_quality};
pub use processing::{PostProcessingConfig, PostProcessor, ProcessedImage};

use crate::backends::camera::types::{CameraFrame, CaptureRequest, Facing, SensorRotation};
use crate::errors::CaptureError;
use chrono::{DateTime, Local};
use image::RgbImage;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// A captured photo awaiting review
#[derive(Clone)]
pub struct CapturedPhoto {
    id: Uuid,
    image: Arc<RgbImage>,
    quality: f32,
    facing: Facing,
    captured_at: DateTime<Local>,
}

impl CapturedPhoto {
    pub fn new(image: RgbImage, quality: f32, facing: Facing, captured_at: DateTime<Local>) -> Self {
        Self {
            id: Uuid::new_v4(),
            image: Arc::new(image),
            quality,
            facing,
            captured_at,
        }
    }

    /// Unique per capture; identifies the photo across async boundaries
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Requested compression quality (0.0 - 1.0)
    pub fn quality(&self) -> f32 {
        self.quality
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn captured_at(&self) -> DateTime<Local> {
        self.captured_at
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl std::fmt::Debug for CapturedPhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (width, height) = self.dimensions();
        f.debug_struct("CapturedPhoto")
            .field("id", &self.id)
            .field("width", &width)
            .field("height", &height)
            .field("quality", &self.quality)
            .field("facing", &self.facing)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Turns raw frames into captured photos
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoPipeline {
    mirror_front: bool,
}

impl PhotoPipeline {
    /// `mirror_front` flips front camera photos to match the mirrored preview
    pub fn new(mirror_front: bool) -> Self {
        Self { mirror_front }
    }

    /// Convert and orient a frame taken for `request`
    pub fn process(
        &self,
        frame: &CameraFrame,
        request: &CaptureRequest,
        rotation: SensorRotation,
    ) -> Result<CapturedPhoto, CaptureError> {
        let config = PostProcessingConfig {
            rotation,
            mirror: self.mirror_front && request.facing == Facing::Front,
            skip: request.options.skip_processing,
        };

        let processed = PostProcessor::new(config)
            .process(frame)
            .map_err(CaptureError::ProcessingFailed)?;

        let photo = CapturedPhoto::new(
            processed.image,
            request.options.quality,
            request.facing,
            Local::now(),
        );
        info!(?photo, "Photo captured");
        Ok(photo)
    }
}
