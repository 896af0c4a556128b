// SPDX-License-Identifier: GPL-3.0-only

//! Flash mode and hardware flash LED control via Linux sysfs
//!
//! Discovers and controls flash LEDs exposed at `/sys/class/leds/*:flash`.
//! Uses torch mode (brightness file) which is group-writable by `feedbackd`,
//! avoiding the root-only `flash_strobe`/`flash_brightness` interface.

use crate::backends::camera::format_converters::sample_pixel_rgb;
use crate::backends::camera::types::CameraFrame;
use crate::constants::flash as flash_consts;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Flash operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlashMode {
    /// Flash never fires
    #[default]
    Off,
    /// Flash fires on every capture
    On,
    /// Flash fires when the scene is dark
    Auto,
}

impl FlashMode {
    /// All modes in cycling order
    pub const ALL: [FlashMode; 3] = [FlashMode::Off, FlashMode::On, FlashMode::Auto];

    /// Cycle to the next mode: Off -> On -> Auto -> Off
    pub fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }

    /// Upper-case label shown next to the flash icon
    pub fn label(&self) -> &'static str {
        match self {
            FlashMode::Off => "OFF",
            FlashMode::On => "ON",
            FlashMode::Auto => "AUTO",
        }
    }

    /// Whether the flash should fire given the scene luminance (0.0 - 1.0).
    ///
    /// Auto fires when luminance is unknown, matching what phone cameras do
    /// before metering has settled.
    pub fn fires(&self, luminance: Option<f32>) -> bool {
        match self {
            FlashMode::Off => false,
            FlashMode::On => true,
            FlashMode::Auto => {
                luminance.is_none_or(|l| l < flash_consts::AUTO_LUMINANCE_THRESHOLD)
            }
        }
    }
}

impl std::fmt::Display for FlashMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Average luminance (0.0 - 1.0) over a sparse sample grid of the frame
pub fn estimate_luminance(frame: &CameraFrame) -> Option<f32> {
    if frame.width == 0 || frame.height == 0 || frame.data.is_empty() {
        return None;
    }

    let step_x = (frame.width / flash_consts::METERING_GRID).max(1);
    let step_y = (frame.height / flash_consts::METERING_GRID).max(1);

    let mut total = 0.0f32;
    let mut samples = 0u32;
    for y in (0..frame.height).step_by(step_y as usize) {
        for x in (0..frame.width).step_by(step_x as usize) {
            let (r, g, b) = sample_pixel_rgb(frame, x, y);
            // BT.601 luma weights
            total += 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            samples += 1;
        }
    }

    Some(total / samples as f32 / 255.0)
}

/// A flash LED device discovered via sysfs
#[derive(Debug, Clone)]
pub struct FlashDevice {
    /// Sysfs path, e.g. `/sys/class/leds/white:flash`
    path: PathBuf,
    /// Maximum brightness value (from `max_brightness` file)
    max_brightness: u32,
    /// Human-readable name (directory basename)
    name: String,
}

impl FlashDevice {
    /// Get the device name (e.g. "white:flash")
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set raw brightness value (0 = off, max_brightness = full)
    pub fn set_brightness(&self, value: u32) -> io::Result<()> {
        let clamped = value.min(self.max_brightness);
        std::fs::write(self.path.join("brightness"), clamped.to_string())
    }

    /// Turn off the LED
    pub fn off(&self) -> io::Result<()> {
        self.set_brightness(0)
    }

    /// Turn on at a fraction of max brightness (0.0 = off, 1.0 = full)
    pub fn torch(&self, intensity: f32) -> io::Result<()> {
        let clamped = intensity.clamp(0.0, 1.0);
        let value = (clamped * self.max_brightness as f32).round() as u32;
        self.set_brightness(value)
    }
}

/// Result of hardware flash detection.
///
/// Separates "hardware exists" from "we can control it" so a permission
/// problem can be reported instead of silently doing nothing.
#[derive(Debug, Default)]
pub struct FlashHardware {
    /// Devices we can actually control (writable)
    pub devices: Vec<FlashDevice>,
    /// Error if hardware was found but not writable
    pub permission_error: Option<String>,
}

impl FlashHardware {
    /// Scan `/sys/class/leds/` for `*:flash` entries.
    pub fn detect() -> FlashHardware {
        Self::detect_in(Path::new(flash_consts::LEDS_DIR))
    }

    /// Scan a sysfs-like LED directory for `*:flash` entries
    pub fn detect_in(leds_dir: &Path) -> FlashHardware {
        let Ok(entries) = std::fs::read_dir(leds_dir) else {
            debug!(dir = %leds_dir.display(), "No LED class directory, flash disabled");
            return FlashHardware::default();
        };

        let mut devices = Vec::new();
        let mut unwritable = Vec::new();

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name_str) = name.to_str() else {
                continue;
            };

            // Match entries like "white:flash", "yellow:flash"
            if !name_str.ends_with(":flash") {
                continue;
            }

            let led_path = entry.path();
            let max_brightness_path = led_path.join("max_brightness");

            let max_brightness = match std::fs::read_to_string(&max_brightness_path) {
                Ok(s) => match s.trim().parse::<u32>() {
                    Ok(v) if v > 0 => v,
                    _ => {
                        warn!(
                            path = %max_brightness_path.display(),
                            "Invalid max_brightness value"
                        );
                        continue;
                    }
                },
                Err(e) => {
                    warn!(
                        path = %max_brightness_path.display(),
                        error = %e,
                        "Cannot read max_brightness"
                    );
                    continue;
                }
            };

            let brightness_path = led_path.join("brightness");
            match std::fs::OpenOptions::new()
                .write(true)
                .open(&brightness_path)
            {
                Ok(_) => {
                    info!(name = name_str, max_brightness, "Discovered flash LED");
                    devices.push(FlashDevice {
                        path: led_path,
                        max_brightness,
                        name: name_str.to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        path = %brightness_path.display(),
                        error = %e,
                        "Flash LED found but not writable"
                    );
                    unwritable.push(name_str.to_string());
                }
            }
        }

        // Deterministic ordering (white before yellow)
        devices.sort_by(|a, b| a.name.cmp(&b.name));

        let permission_error = if devices.is_empty() && !unwritable.is_empty() {
            let username = std::env::var("USER").unwrap_or_else(|_| "user".to_string());
            Some(format!(
                "Flash LEDs detected ({}) but cannot be controlled. \
                 Add {} to the 'feedbackd' group and log in again.",
                unwritable.join(", "),
                username
            ))
        } else {
            None
        };

        FlashHardware {
            devices,
            permission_error,
        }
    }

    /// Whether any controllable flash devices were found
    pub fn has_devices(&self) -> bool {
        !self.devices.is_empty()
    }

    /// Turn all LEDs on until the returned guard is dropped
    pub fn fire(&self) -> FlashGuard<'_> {
        for dev in &self.devices {
            if let Err(e) = dev.torch(1.0) {
                warn!(device = %dev.name, error = %e, "Failed to turn on flash LED");
            }
        }
        FlashGuard {
            devices: &self.devices,
        }
    }
}

/// Keeps the flash lit; switches every LED off when dropped
pub struct FlashGuard<'a> {
    devices: &'a [FlashDevice],
}

impl Drop for FlashGuard<'_> {
    fn drop(&mut self) {
        for dev in self.devices {
            if let Err(e) = dev.off() {
                warn!(device = %dev.name, error = %e, "Failed to turn off flash LED");
            }
        }
    }
}
