// SPDX-License-Identifier: GPL-3.0-only

//! Virtual camera backend
//!
//! Streams either a still image from disk or a generated test pattern, so
//! the app runs on machines without a webcam and in automated tests. Both
//! facings are offered. The test pattern runs its bars vertically for the
//! back camera and horizontally for the front one; a still image looks the
//! same from both.

use super::CameraBackend;
use super::types::{
    BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFrame, CaptureRequest,
    Facing, FrameReceiver, PixelFormat, SensorRotation,
};
use crate::constants::{capture as capture_consts, virtual_camera as virtual_consts};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info};

/// Where virtual frames come from
#[derive(Debug, Clone)]
pub enum VirtualSource {
    /// A still image, repeated on every frame
    Image(PathBuf),
    /// Animated color bars
    TestPattern,
}

struct PatternStream {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for PatternStream {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Camera backed by a file or a generated pattern
pub struct VirtualCamera {
    source: VirtualSource,
    still: Option<CameraFrame>,
    tick: Arc<AtomicU64>,
    stream: Mutex<Option<PatternStream>>,
}

impl VirtualCamera {
    /// Generated test pattern camera
    pub fn test_pattern() -> Self {
        Self {
            source: VirtualSource::TestPattern,
            still: None,
            tick: Arc::new(AtomicU64::new(0)),
            stream: Mutex::new(None),
        }
    }

    /// Camera that shows the image at `path`
    pub fn from_image(path: &Path) -> BackendResult<Self> {
        let still = load_image_as_frame(path)?;
        Ok(Self {
            source: VirtualSource::Image(path.to_path_buf()),
            still: Some(still),
            tick: Arc::new(AtomicU64::new(0)),
            stream: Mutex::new(None),
        })
    }

    /// Build from a configured source
    pub fn from_source(source: &VirtualSource) -> BackendResult<Self> {
        match source {
            VirtualSource::Image(path) => Self::from_image(path),
            VirtualSource::TestPattern => Ok(Self::test_pattern()),
        }
    }

    fn source_label(&self) -> String {
        match &self.source {
            VirtualSource::Image(path) => path.display().to_string(),
            VirtualSource::TestPattern => "test-pattern".to_string(),
        }
    }
}

impl CameraBackend for VirtualCamera {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        let path = self.source_label();
        [Facing::Back, Facing::Front]
            .into_iter()
            .map(|facing| CameraDevice {
                name: format!("Virtual {} camera", facing),
                path: path.clone(),
                driver: None,
                facing: Some(facing),
                rotation: SensorRotation::None,
            })
            .collect()
    }

    fn start_preview(&self, facing: Facing) -> BackendResult<FrameReceiver> {
        let (mut sender, receiver) =
            futures::channel::mpsc::channel(capture_consts::PREVIEW_CHANNEL_CAPACITY);

        let stop = Arc::new(AtomicBool::new(false));
        let still = self.still.clone();
        let tick = Arc::clone(&self.tick);

        let thread = {
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("virtual-camera".into())
                .spawn(move || {
                    while !stop.load(Ordering::SeqCst) {
                        let n = tick.fetch_add(1, Ordering::Relaxed);
                        let frame = render(still.as_ref(), facing, n);
                        if let Err(e) = sender.try_send(frame)
                            && e.is_disconnected()
                        {
                            break;
                        }
                        std::thread::sleep(virtual_consts::FRAME_INTERVAL);
                    }
                    debug!("Virtual camera stream stopped");
                })?
        };

        let mut guard = self
            .stream
            .lock()
            .map_err(|_| BackendError::Other("Virtual stream lock poisoned".into()))?;
        *guard = Some(PatternStream {
            stop,
            thread: Some(thread),
        });

        info!(source = %self.source_label(), %facing, "Virtual preview started");
        Ok(receiver)
    }

    fn stop_preview(&self) {
        if let Ok(mut guard) = self.stream.lock() {
            guard.take();
        }
    }

    fn capture_photo(&self, request: &CaptureRequest) -> BackendResult<CameraFrame> {
        let n = self.tick.fetch_add(1, Ordering::Relaxed);
        if request.flash.fires(None) {
            debug!(flash = %request.flash, "Virtual camera has no flash to fire");
        }
        Ok(render(self.still.as_ref(), request.facing, n))
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::Virtual
    }
}

/// Load an image file as an RGBA frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(CameraFrame {
        data: Arc::from(rgba.into_raw().into_boxed_slice()),
        width,
        height,
        stride: width * 4,
        format: PixelFormat::RGBA,
        captured_at: Instant::now(),
    })
}

fn render(still: Option<&CameraFrame>, facing: Facing, tick: u64) -> CameraFrame {
    match still {
        Some(frame) => CameraFrame {
            captured_at: Instant::now(),
            ..frame.clone()
        },
        None => pattern_frame(
            virtual_consts::PATTERN_WIDTH,
            virtual_consts::PATTERN_HEIGHT,
            facing,
            tick,
        ),
    }
}

const BARS: [[u8; 3]; 7] = [
    [192, 192, 192],
    [192, 192, 0],
    [0, 192, 192],
    [0, 192, 0],
    [192, 0, 192],
    [192, 0, 0],
    [0, 0, 192],
];

/// SMPTE-style color bars with a sweeping white column.
///
/// Bars run left to right for the back facing and top to bottom for the
/// front one.
pub fn pattern_frame(width: u32, height: u32, facing: Facing, tick: u64) -> CameraFrame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    let sweep = if width == 0 { 0 } else { (tick % width as u64) as u32 };

    for y in 0..height {
        for x in 0..width {
            let bar = match facing {
                Facing::Back => x * BARS.len() as u32 / width.max(1),
                Facing::Front => y * BARS.len() as u32 / height.max(1),
            } as usize;
            if x == sweep {
                data.extend_from_slice(&[255, 255, 255]);
            } else {
                data.extend_from_slice(&BARS[bar.min(BARS.len() - 1)]);
            }
        }
    }

    CameraFrame::from_rgb(width, height, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::CaptureOptions;
    use crate::flash::FlashMode;
    use futures::StreamExt;

    fn request(facing: Facing) -> CaptureRequest {
        CaptureRequest {
            facing,
            flash: FlashMode::Off,
            options: CaptureOptions::default(),
        }
    }

    #[test]
    fn offers_both_facings() {
        let camera = VirtualCamera::test_pattern();
        let devices = camera.enumerate_cameras();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[1].facing, Some(Facing::Front));
    }

    #[test]
    fn facings_render_differently() {
        let pixel = |frame: &CameraFrame, x: u32, y: u32| {
            let i = ((y * frame.width + x) * 3) as usize;
            [frame.data[i], frame.data[i + 1], frame.data[i + 2]]
        };
        let back = pattern_frame(70, 7, Facing::Back, 69);
        let front = pattern_frame(70, 7, Facing::Front, 69);

        assert_eq!(pixel(&back, 0, 6), BARS[0]);
        assert_eq!(pixel(&back, 60, 0), BARS[6]);
        assert_eq!(pixel(&front, 0, 6), BARS[6]);
        assert_eq!(pixel(&front, 60, 0), BARS[0]);

        // Mirroring the front pattern leaves it unchanged
        assert_eq!(pixel(&front, 3, 2), pixel(&front, 66, 2));
        assert_eq!(pixel(&back, 69, 0), [255, 255, 255]);
    }

    #[test]
    fn capture_returns_a_full_frame() {
        let camera = VirtualCamera::test_pattern();
        let frame = camera.capture_photo(&request(Facing::Back)).unwrap();
        assert_eq!(frame.width, virtual_consts::PATTERN_WIDTH);
        assert_eq!(frame.data.len(), frame.expected_len());
    }

    #[test]
    fn missing_image_is_an_error() {
        assert!(VirtualCamera::from_image(Path::new("/nonexistent/photo.png")).is_err());
    }

    #[test]
    fn preview_streams_frames() {
        let camera = VirtualCamera::test_pattern();
        let mut receiver = camera.start_preview(Facing::Front).unwrap();
        let frame = futures::executor::block_on(receiver.next()).unwrap();
        assert_eq!(frame.height, virtual_consts::PATTERN_HEIGHT);
        camera.stop_preview();
    }
}
