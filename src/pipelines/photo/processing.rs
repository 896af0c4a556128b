// SPDX-License-Identifier: MPL-2.0

//! Post-processing for captured frames
//!
//! Converts a raw frame to RGB and fixes its orientation:
//! - Undo the sensor mounting rotation
//! - Mirror front camera shots when configured
//!
//! Both steps are skipped when the capture asks to skip processing; the RGB
//! conversion always runs since the rest of the pipeline needs it.

use crate::backends::camera::format_converters::to_rgb_image;
use crate::backends::camera::types::{CameraFrame, SensorRotation};
use image::{RgbImage, imageops};
use tracing::debug;

/// Post-processing configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostProcessingConfig {
    /// Mounting rotation of the sensor that produced the frame
    pub rotation: SensorRotation,
    /// Flip the image horizontally
    pub mirror: bool,
    /// Keep the sensor's raw layout
    pub skip: bool,
}

/// Processed image data
pub struct ProcessedImage {
    pub image: RgbImage,
    pub width: u32,
    pub height: u32,
}

/// Post-processor for captured frames
pub struct PostProcessor {
    config: PostProcessingConfig,
}

impl PostProcessor {
    pub fn new(config: PostProcessingConfig) -> Self {
        Self { config }
    }

    /// Convert and orient a frame. CPU-bound; call from a blocking context.
    pub fn process(&self, frame: &CameraFrame) -> Result<ProcessedImage, String> {
        let rgb = to_rgb_image(frame).ok_or_else(|| {
            format!(
                "Frame {}x{} ({:?}) has no usable pixels",
                frame.width, frame.height, frame.format
            )
        })?;

        let image = if self.config.skip {
            rgb
        } else {
            let rotated = Self::undo_rotation(rgb, self.config.rotation);
            if self.config.mirror {
                imageops::flip_horizontal(&rotated)
            } else {
                rotated
            }
        };

        debug!(
            width = image.width(),
            height = image.height(),
            rotation = %self.config.rotation,
            mirror = self.config.mirror,
            skip = self.config.skip,
            "Post-processing complete"
        );

        Ok(ProcessedImage {
            width: image.width(),
            height: image.height(),
            image,
        })
    }

    /// The kernel reports the counter-clockwise correction to apply
    fn undo_rotation(image: RgbImage, rotation: SensorRotation) -> RgbImage {
        match rotation {
            SensorRotation::None => image,
            SensorRotation::Rotate90 => imageops::rotate270(&image),
            SensorRotation::Rotate180 => imageops::rotate180(&image),
            SensorRotation::Rotate270 => imageops::rotate90(&image),
        }
    }
}
