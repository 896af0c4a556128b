// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Instant-film frame geometry
pub mod polaroid {
    /// Caption shown under the live preview, before anything is captured
    pub const PLACEHOLDER_CAPTION: &str = "Polaroid";

    /// Share of the available width taken by the frame
    pub const FRAME_WIDTH_RATIO: f32 = 0.8;

    /// Frame aspect ratio (width / height), portrait 3:4
    pub const FRAME_ASPECT: f32 = 3.0 / 4.0;

    /// Share of the frame height used by the photo; the rest is the caption strip
    pub const PHOTO_HEIGHT_RATIO: f32 = 0.78;

    /// Caption date format (zero-padded `YYYY/MM/DD`)
    pub const CAPTION_DATE_FORMAT: &str = "%Y/%m/%d";
}

/// Flash metering and hardware
pub mod flash {
    use std::time::Duration;

    /// sysfs directory holding LED class devices
    pub const LEDS_DIR: &str = "/sys/class/leds";

    /// Auto flash fires below this average luminance (0.0 - 1.0)
    pub const AUTO_LUMINANCE_THRESHOLD: f32 = 0.25;

    /// Metering samples per axis
    pub const METERING_GRID: u32 = 16;

    /// How long the LED burns before the frame is taken, so exposure can adapt
    pub const SETTLE_TIME: Duration = Duration::from_millis(250);
}

/// Camera capture timing
pub mod capture {
    use std::time::Duration;

    /// Give up waiting for a frame after this long
    pub const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

    /// Auto exposure needs a few frames after the stream starts
    pub const WARMUP: Duration = Duration::from_millis(500);

    /// Poll interval while waiting for a fresh frame
    pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

    /// Preview frames buffered between the capture thread and the UI
    pub const PREVIEW_CHANNEL_CAPACITY: usize = 2;

    /// Number of mmap buffers requested from the driver
    pub const V4L2_BUFFER_COUNT: u32 = 4;

    /// Preferred stream resolution (photos and preview share one stream)
    pub const PREFERRED_WIDTH: u32 = 1280;
    pub const PREFERRED_HEIGHT: u32 = 720;

    /// FourCC codes in order of preference
    pub const PREFERRED_FOURCCS: [&str; 6] = ["YUYV", "MJPG", "RGB3", "UYVY", "NV12", "GREY"];
}

/// Virtual camera source
pub mod virtual_camera {
    use std::time::Duration;

    /// Generated test pattern size
    pub const PATTERN_WIDTH: u32 = 640;
    pub const PATTERN_HEIGHT: u32 = 480;

    /// Interval between generated frames (~15 fps)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(66);
}

/// Photo files
pub mod storage {
    /// Folder created under the XDG Pictures directory
    pub const DEFAULT_SAVE_FOLDER: &str = "Polaroid";

    /// Prefix of saved photo file names
    pub const FILENAME_PREFIX: &str = "IMG_";

    /// Timestamp part of saved photo file names
    pub const FILENAME_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
}

/// Terminal UI timing
pub mod ui {
    use std::time::Duration;

    /// Redraw / input poll interval (~60 Hz)
    pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

    /// How long transient notices stay on the status line by default
    pub const DEFAULT_NOTICE_DURATION_MS: u64 = 3000;
}

/// Application version string (git describe, set by build.rs)
pub fn app_version() -> &'static str {
    env!("GIT_VERSION")
}
