// SPDX-License-Identifier: GPL-3.0-only
//! Pixel format conversion utilities
//!
//! Turns raw V4L2 buffers into [`CameraFrame`]s and frames of any supported
//! layout into RGB. Per-pixel sampling is shared by the terminal preview,
//! flash metering and photo processing.

use super::types::{BackendError, BackendResult, CameraFormat, CameraFrame, PixelFormat};
use image::RgbImage;
use std::sync::Arc;
use std::time::Instant;

/// Wrap a raw driver buffer into a frame.
///
/// MJPG buffers are decoded to RGB24 here so the rest of the crate never
/// sees compressed data.
pub fn frame_from_buffer(buf: &[u8], format: &CameraFormat, stride: u32) -> BackendResult<CameraFrame> {
    let captured_at = Instant::now();

    if format.fourcc == "MJPG" || format.fourcc == "JPEG" {
        let decoded = image::load_from_memory_with_format(buf, image::ImageFormat::Jpeg)
            .map_err(|e| BackendError::FormatNotSupported(format!("MJPG decode failed: {}", e)))?
            .to_rgb8();
        let (width, height) = decoded.dimensions();
        return Ok(CameraFrame {
            width,
            height,
            data: Arc::from(decoded.into_raw().into_boxed_slice()),
            format: PixelFormat::RGB24,
            stride: width * 3,
            captured_at,
        });
    }

    let pixel_format = PixelFormat::from_fourcc(&format.fourcc)
        .ok_or_else(|| BackendError::FormatNotSupported(format.fourcc.clone()))?;

    // Drivers report 0 when rows are tightly packed
    let stride = if stride == 0 {
        match pixel_format {
            PixelFormat::NV12 | PixelFormat::Gray8 => format.width,
            other => (format.width as f32 * other.bytes_per_pixel()) as u32,
        }
    } else {
        stride
    };

    let frame = CameraFrame {
        width: format.width,
        height: format.height,
        data: Arc::from(buf),
        format: pixel_format,
        stride,
        captured_at,
    };

    if buf.len() < frame.expected_len() {
        return Err(BackendError::Other(format!(
            "Short buffer: got {} bytes, expected {}",
            buf.len(),
            frame.expected_len()
        )));
    }

    Ok(frame)
}

/// Convert a whole frame to a packed RGB image
pub fn to_rgb_image(frame: &CameraFrame) -> Option<RgbImage> {
    if frame.width == 0 || frame.height == 0 {
        return None;
    }

    // Fast path: already packed RGB
    if frame.format == PixelFormat::RGB24 && frame.stride == frame.width * 3 {
        let len = (frame.width * frame.height * 3) as usize;
        return RgbImage::from_raw(frame.width, frame.height, frame.data[..len.min(frame.data.len())].to_vec());
    }

    let mut rgb = Vec::with_capacity((frame.width * frame.height * 3) as usize);
    for y in 0..frame.height {
        for x in 0..frame.width {
            let (r, g, b) = sample_pixel_rgb(frame, x, y);
            rgb.extend_from_slice(&[r, g, b]);
        }
    }

    RgbImage::from_raw(frame.width, frame.height, rgb)
}

/// Read one pixel as RGB, clamping coordinates to the frame
pub fn sample_pixel_rgb(frame: &CameraFrame, x: u32, y: u32) -> (u8, u8, u8) {
    if frame.width == 0 || frame.height == 0 {
        return (0, 0, 0);
    }
    let x = x.min(frame.width - 1);
    let y = y.min(frame.height - 1);
    let data: &[u8] = &frame.data;

    match frame.format {
        PixelFormat::RGBA => {
            let idx = (y * frame.stride + x * 4) as usize;
            if idx + 2 < data.len() {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (0, 0, 0)
            }
        }
        PixelFormat::RGB24 => {
            let idx = (y * frame.stride + x * 3) as usize;
            if idx + 2 < data.len() {
                (data[idx], data[idx + 1], data[idx + 2])
            } else {
                (0, 0, 0)
            }
        }
        PixelFormat::Gray8 => {
            let idx = (y * frame.stride + x) as usize;
            let v = data.get(idx).copied().unwrap_or(0);
            (v, v, v)
        }
        PixelFormat::NV12 => {
            let y_idx = (y * frame.stride + x) as usize;
            let Some(&luma) = data.get(y_idx) else {
                return (0, 0, 0);
            };

            // UV plane follows the Y plane at half resolution
            let uv_offset = (frame.stride * frame.height) as usize;
            let uv_idx = uv_offset + (y / 2) as usize * frame.stride as usize + (x & !1) as usize;
            if uv_idx + 1 >= data.len() {
                return (luma, luma, luma);
            }

            yuv_to_rgb(luma, data[uv_idx], data[uv_idx + 1])
        }
        PixelFormat::YUYV | PixelFormat::UYVY => {
            // Packed 4:2:2: two pixels share chroma
            // YUYV: Y0 U  Y1 V
            // UYVY: U  Y0 V  Y1
            let base = (y * frame.stride) as usize + (x & !1) as usize * 2;
            if base + 3 >= data.len() {
                return (0, 0, 0);
            }
            let odd = x & 1 == 1;
            let (luma, u, v) = if frame.format == PixelFormat::YUYV {
                let luma = if odd { data[base + 2] } else { data[base] };
                (luma, data[base + 1], data[base + 3])
            } else {
                let luma = if odd { data[base + 3] } else { data[base + 1] };
                (luma, data[base], data[base + 2])
            };
            yuv_to_rgb(luma, u, v)
        }
    }
}

/// Convert YUV (BT.601) to RGB
pub fn yuv_to_rgb(y: u8, u: u8, v: u8) -> (u8, u8, u8) {
    let y = y as f32;
    let u = u as f32 - 128.0;
    let v = v as f32 - 128.0;

    let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
    let g = (y - 0.344136 * u - 0.714136 * v).clamp(0.0, 255.0) as u8;
    let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;

    (r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(fourcc: &str, width: u32, height: u32) -> CameraFormat {
        CameraFormat {
            width,
            height,
            fourcc: fourcc.to_string(),
        }
    }

    #[test]
    fn neutral_chroma_is_gray() {
        assert_eq!(yuv_to_rgb(128, 128, 128), (128, 128, 128));
        assert_eq!(yuv_to_rgb(0, 128, 128), (0, 0, 0));
        assert_eq!(yuv_to_rgb(255, 128, 128), (255, 255, 255));
    }

    #[test]
    fn yuyv_pixels_pick_the_right_luma() {
        // Two pixels: Y0=50, Y1=200, neutral chroma
        let frame = frame_from_buffer(&[50, 128, 200, 128], &format("YUYV", 2, 1), 0).unwrap();
        assert_eq!(frame.stride, 4);
        assert_eq!(sample_pixel_rgb(&frame, 0, 0), (50, 50, 50));
        assert_eq!(sample_pixel_rgb(&frame, 1, 0), (200, 200, 200));
    }

    #[test]
    fn uyvy_pixels_pick_the_right_luma() {
        let frame = frame_from_buffer(&[128, 10, 128, 240], &format("UYVY", 2, 1), 0).unwrap();
        assert_eq!(sample_pixel_rgb(&frame, 0, 0), (10, 10, 10));
        assert_eq!(sample_pixel_rgb(&frame, 1, 0), (240, 240, 240));
    }

    #[test]
    fn nv12_reads_chroma_plane() {
        // 2x2 luma of 100, one UV pair with strong red (V high)
        let buf = [100, 100, 100, 100, 128, 200];
        let frame = frame_from_buffer(&buf, &format("NV12", 2, 2), 0).unwrap();
        let (r, g, b) = sample_pixel_rgb(&frame, 1, 1);
        assert!(r > g && r > b);
    }

    #[test]
    fn gray_frames_convert_to_rgb_image() {
        let frame = frame_from_buffer(&[0, 64, 128, 255], &format("GREY", 2, 2), 0).unwrap();
        let image = to_rgb_image(&frame).unwrap();
        assert_eq!(image.get_pixel(1, 0).0, [64, 64, 64]);
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255]);
    }

    #[test]
    fn short_buffers_are_rejected() {
        let result = frame_from_buffer(&[0; 3], &format("YUYV", 2, 2), 0);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_fourcc_is_rejected() {
        let result = frame_from_buffer(&[0; 16], &format("H264", 2, 2), 0);
        assert!(matches!(result, Err(BackendError::FormatNotSupported(_))));
    }

    #[test]
    fn mjpg_is_decoded_to_rgb() {
        let source = RgbImage::from_pixel(4, 2, image::Rgb([200, 10, 10]));
        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, 95)
            .encode_image(&source)
            .unwrap();

        let frame = frame_from_buffer(&jpeg, &format("MJPG", 4, 2), 0).unwrap();
        assert_eq!(frame.format, PixelFormat::RGB24);
        assert_eq!((frame.width, frame.height), (4, 2));
        let (r, _, _) = sample_pixel_rgb(&frame, 2, 1);
        assert!(r > 150);
    }
}
