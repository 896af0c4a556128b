// SPDX-License-Identifier: GPL-3.0-only

//! Native V4L2 camera backend
//!
//! One capture thread per open device pulls mmap buffers from the driver,
//! converts them into [`CameraFrame`]s, keeps the most recent one for photo
//! capture and forwards frames to the preview receiver. Photos are taken
//! from the same stream, so the preview never pauses for a capture.

use super::format_converters::frame_from_buffer;
use super::types::{
    BackendError, BackendResult, CameraBackendType, CameraDevice, CameraFormat, CameraFrame,
    CaptureRequest, Facing, FrameReceiver, FrameSender, SensorRotation,
};
use super::{CameraBackend, select_device};
use crate::constants::{capture as capture_consts, flash as flash_consts};
use crate::flash::{FlashHardware, estimate_luminance};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, info, warn};
use v4l::buffer::Type;
use v4l::capability::Flags;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;
use v4l::{Format, FourCC};

/// Get control value (v4l2_control: 8 bytes)
const VIDIOC_G_CTRL: libc::c_ulong = 0xC008561B;

const V4L2_CID_CAMERA_CLASS_BASE: u32 = 0x009a0000 | 0x900;
/// Where the camera is mounted (0 = front, 1 = back, 2 = external)
const V4L2_CID_CAMERA_ORIENTATION: u32 = V4L2_CID_CAMERA_CLASS_BASE + 34;
/// Sensor mounting rotation in degrees
const V4L2_CID_CAMERA_SENSOR_ROTATION: u32 = V4L2_CID_CAMERA_CLASS_BASE + 35;

/// Give up on a device after this many consecutive dequeue failures
const MAX_CONSECUTIVE_ERRORS: u32 = 30;

/// V4L2 control get/set structure
#[repr(C)]
struct V4l2Control {
    id: u32,
    value: i32,
}

/// Read an integer control through `VIDIOC_G_CTRL`
fn get_control(device_path: &str, control_id: u32) -> Option<i32> {
    let file = File::open(device_path).ok()?;
    let mut ctrl = V4l2Control {
        id: control_id,
        value: 0,
    };
    let result =
        unsafe { libc::ioctl(file.as_raw_fd(), VIDIOC_G_CTRL as _, &mut ctrl as *mut V4l2Control) };
    if result < 0 { None } else { Some(ctrl.value) }
}

/// A running capture thread bound to one device
struct CaptureSession {
    facing: Facing,
    device: CameraDevice,
    stop: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            warn!(device = %self.device.name, "Capture thread panicked");
        }
        debug!(device = %self.device.name, "Capture session closed");
    }
}

/// V4L2 backend
pub struct V4l2Backend {
    flash: FlashHardware,
    preferred_size: (u32, u32),
    session: Mutex<Option<CaptureSession>>,
}

impl V4l2Backend {
    /// Create a backend with the default stream size and detected flash LEDs
    pub fn new() -> Self {
        let flash = FlashHardware::detect();
        if let Some(error) = &flash.permission_error {
            warn!(%error, "Flash unavailable");
        }

        Self {
            flash,
            preferred_size: (
                capture_consts::PREFERRED_WIDTH,
                capture_consts::PREFERRED_HEIGHT,
            ),
            session: Mutex::new(None),
        }
    }

    /// Check if any capture device node exists at all
    pub fn is_available() -> bool {
        !video_nodes().is_empty()
    }

    fn open_session(
        &self,
        facing: Facing,
        sender: Option<FrameSender>,
    ) -> BackendResult<CaptureSession> {
        let devices = self.enumerate_cameras();
        let device = select_device(&devices, facing)
            .cloned()
            .ok_or_else(|| BackendError::DeviceNotFound("No V4L2 capture device".into()))?;

        info!(device = %device.name, path = %device.path, %facing, "Opening camera");

        let stop = Arc::new(AtomicBool::new(false));
        let latest = Arc::new(Mutex::new(None));
        let (ready_tx, ready_rx) = std::sync::mpsc::channel();

        let thread = {
            let path = device.path.clone();
            let preferred = self.preferred_size;
            let stop = Arc::clone(&stop);
            let latest = Arc::clone(&latest);
            std::thread::Builder::new()
                .name("v4l2-capture".into())
                .spawn(move || capture_loop(&path, preferred, stop, latest, sender, ready_tx))?
        };

        let mut session = CaptureSession {
            facing,
            device,
            stop,
            latest,
            thread: Some(thread),
        };

        match ready_rx.recv_timeout(capture_consts::FRAME_TIMEOUT) {
            Ok(Ok(format)) => {
                info!(%format, "Camera stream started");
                Ok(session)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                // The thread may still be stuck in the driver, do not wait for it
                session.stop.store(true, Ordering::SeqCst);
                session.thread.take();
                Err(BackendError::Timeout(format!(
                    "{} did not start streaming",
                    session.device.path
                )))
            }
        }
    }
}

impl Default for V4l2Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraBackend for V4l2Backend {
    fn enumerate_cameras(&self) -> Vec<CameraDevice> {
        video_nodes()
            .into_iter()
            .filter_map(|path| probe_device(&path))
            .collect()
    }

    fn start_preview(&self, facing: Facing) -> BackendResult<FrameReceiver> {
        let (sender, receiver) =
            futures::channel::mpsc::channel(capture_consts::PREVIEW_CHANNEL_CAPACITY);

        let mut guard = self
            .session
            .lock()
            .map_err(|_| BackendError::Other("Capture session lock poisoned".into()))?;

        // Release the device before reopening it
        guard.take();
        *guard = Some(self.open_session(facing, Some(sender))?);

        Ok(receiver)
    }

    fn stop_preview(&self) {
        if let Ok(mut guard) = self.session.lock() {
            guard.take();
        }
    }

    fn capture_photo(&self, request: &CaptureRequest) -> BackendResult<CameraFrame> {
        let (latest, temporary) = {
            let mut guard = self
                .session
                .lock()
                .map_err(|_| BackendError::Other("Capture session lock poisoned".into()))?;

            let had_session = guard.is_some();
            if guard.as_ref().is_none_or(|s| s.facing != request.facing) {
                guard.take();
                *guard = Some(self.open_session(request.facing, None)?);
            }

            let latest = guard
                .as_ref()
                .map(|s| Arc::clone(&s.latest))
                .ok_or_else(|| BackendError::Other("Capture session vanished".into()))?;
            (latest, !had_session)
        };

        if temporary {
            // Let auto exposure settle on a freshly opened stream
            std::thread::sleep(capture_consts::WARMUP);
        }

        let luminance = latest
            .lock()
            .ok()
            .and_then(|guard| guard.as_ref().and_then(estimate_luminance));
        let fire = request.flash.fires(luminance) && self.flash.has_devices();
        debug!(flash = %request.flash, ?luminance, fire, "Flash decision");

        let frame = {
            let _lit = fire.then(|| self.flash.fire());
            if fire {
                std::thread::sleep(flash_consts::SETTLE_TIME);
            }
            wait_for_frame(&latest, Instant::now())
        };

        if temporary {
            self.stop_preview();
        }

        let frame = frame?;
        info!(
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Frame captured"
        );
        Ok(frame)
    }

    fn backend_type(&self) -> CameraBackendType {
        CameraBackendType::V4l2
    }
}

/// `/dev/videoN` nodes sorted by N
fn video_nodes() -> Vec<String> {
    let mut nodes: Vec<(u32, String)> = std::fs::read_dir("/dev")
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = name.to_str()?.strip_prefix("video")?.parse::<u32>().ok()?;
            Some((index, entry.path().to_string_lossy().to_string()))
        })
        .collect();
    nodes.sort_by_key(|(index, _)| *index);
    nodes.into_iter().map(|(_, path)| path).collect()
}

/// Query a node and keep it if it captures video in a format we can read
fn probe_device(path: &str) -> Option<CameraDevice> {
    let dev = match Device::with_path(path) {
        Ok(dev) => dev,
        Err(e) => {
            debug!(path, error = %e, "Cannot open video node");
            return None;
        }
    };

    let caps = dev.query_caps().ok()?;
    if !caps.capabilities.contains(Flags::VIDEO_CAPTURE) {
        return None;
    }

    // Metadata nodes advertise capture but list no image formats
    let formats = dev.enum_formats().ok()?;
    let readable = formats.iter().any(|f| {
        f.fourcc
            .str()
            .is_ok_and(|s| capture_consts::PREFERRED_FOURCCS.contains(&s))
    });
    if !readable {
        debug!(path, card = %caps.card, "No supported pixel format");
        return None;
    }

    let facing = match get_control(path, V4L2_CID_CAMERA_ORIENTATION) {
        Some(0) => Some(Facing::Front),
        Some(1) => Some(Facing::Back),
        _ => Facing::from_location(&caps.card),
    };
    let rotation = get_control(path, V4L2_CID_CAMERA_SENSOR_ROTATION)
        .map(SensorRotation::from_degrees_int)
        .unwrap_or_default();

    debug!(path, card = %caps.card, driver = %caps.driver, ?facing, %rotation, "Found camera");

    Some(CameraDevice {
        name: caps.card,
        path: path.to_string(),
        driver: Some(caps.driver),
        facing,
        rotation,
    })
}

/// Pick the first preferred FourCC the device offers and apply it
fn negotiate_format(dev: &Device, preferred: (u32, u32)) -> BackendResult<(CameraFormat, u32)> {
    let offered: Vec<String> = dev
        .enum_formats()?
        .iter()
        .filter_map(|f| f.fourcc.str().ok().map(str::to_string))
        .collect();

    let fourcc = capture_consts::PREFERRED_FOURCCS
        .iter()
        .find(|candidate| offered.iter().any(|o| o == *candidate))
        .ok_or_else(|| BackendError::FormatNotSupported(offered.join(", ")))?;

    let code: [u8; 4] = fourcc
        .as_bytes()
        .try_into()
        .map_err(|_| BackendError::FormatNotSupported(fourcc.to_string()))?;

    let requested = Format::new(preferred.0, preferred.1, FourCC::new(&code));
    let actual = dev.set_format(&requested)?;
    let actual_fourcc = actual
        .fourcc
        .str()
        .map(str::to_string)
        .map_err(|_| BackendError::FormatNotSupported("non-ASCII FourCC".into()))?;

    Ok((
        CameraFormat {
            width: actual.width,
            height: actual.height,
            fourcc: actual_fourcc,
        },
        actual.stride,
    ))
}

fn capture_loop(
    path: &str,
    preferred: (u32, u32),
    stop: Arc<AtomicBool>,
    latest: Arc<Mutex<Option<CameraFrame>>>,
    mut sender: Option<FrameSender>,
    ready: std::sync::mpsc::Sender<BackendResult<CameraFormat>>,
) {
    let dev = match Device::with_path(path) {
        Ok(dev) => dev,
        Err(e) => {
            let _ = ready.send(Err(BackendError::InitializationFailed(format!(
                "Failed to open {}: {}",
                path, e
            ))));
            return;
        }
    };

    let (format, stride) = match negotiate_format(&dev, preferred) {
        Ok(negotiated) => negotiated,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    let mut stream =
        match Stream::with_buffers(&dev, Type::VideoCapture, capture_consts::V4L2_BUFFER_COUNT) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(BackendError::InitializationFailed(format!(
                    "Failed to create buffer stream: {}",
                    e
                ))));
                return;
            }
        };

    let _ = ready.send(Ok(format.clone()));

    let mut consecutive_errors = 0u32;
    while !stop.load(Ordering::SeqCst) {
        let converted = match stream.next() {
            Ok((buf, _meta)) => {
                consecutive_errors = 0;
                frame_from_buffer(buf, &format, stride)
            }
            Err(e) => {
                consecutive_errors += 1;
                warn!(path, error = %e, "Failed to dequeue frame");
                if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                    warn!(path, "Too many capture errors, closing stream");
                    break;
                }
                continue;
            }
        };

        match converted {
            Ok(frame) => {
                if let Ok(mut guard) = latest.lock() {
                    *guard = Some(frame.clone());
                }
                if let Some(sender) = sender.as_mut() {
                    // Full channel means the UI is behind; drop the frame
                    let _ = sender.try_send(frame);
                }
            }
            Err(e) => debug!(path, error = %e, "Dropping unreadable frame"),
        }
    }

    debug!(path, "Capture thread exiting");
}

/// Block until the capture thread publishes a frame taken after `not_before`
fn wait_for_frame(
    latest: &Mutex<Option<CameraFrame>>,
    not_before: Instant,
) -> BackendResult<CameraFrame> {
    let deadline = not_before + capture_consts::FRAME_TIMEOUT;

    loop {
        if let Ok(guard) = latest.lock()
            && let Some(frame) = guard.as_ref()
            && frame.captured_at >= not_before
        {
            return Ok(frame.clone());
        }

        if Instant::now() >= deadline {
            return Err(BackendError::Timeout("No frame from camera".into()));
        }
        std::thread::sleep(capture_consts::POLL_INTERVAL);
    }
}

/// Whether a path looks like a V4L2 node this backend would open
pub fn is_video_node(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_prefix("video"))
        .is_some_and(|n| n.parse::<u32>().is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_ids_match_kernel_headers() {
        assert_eq!(V4L2_CID_CAMERA_ORIENTATION, 0x009a0922);
        assert_eq!(V4L2_CID_CAMERA_SENSOR_ROTATION, 0x009a0923);
    }

    #[test]
    fn video_node_names() {
        assert!(is_video_node(Path::new("/dev/video0")));
        assert!(is_video_node(Path::new("/dev/video12")));
        assert!(!is_video_node(Path::new("/dev/video")));
        assert!(!is_video_node(Path::new("/dev/v4l-subdev0")));
    }

    #[test]
    fn waiting_returns_fresh_frames_only() {
        let latest = Mutex::new(Some(CameraFrame::from_rgb(1, 1, vec![1, 2, 3])));
        let before = Instant::now() - std::time::Duration::from_secs(1);
        let frame = wait_for_frame(&latest, before).unwrap();
        assert_eq!(&frame.data[..], &[1, 2, 3]);
    }
}
