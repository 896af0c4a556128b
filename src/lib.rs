// SPDX-License-Identifier: MPL-2.0

//! Polaroid - instant-film style photo capture
//!
//! A single screen: live preview framed like an instant photo, a shutter,
//! flash and facing toggles, then a review of the shot with save and
//! retake actions.
//!
//! # Architecture
//!
//! - [`app`]: The capture screen, its messages and rendering
//! - [`backends`]: Camera, permission and photo library collaborators
//! - [`pipelines`]: Frame to photo processing and encoding
//! - [`config`]: User configuration handling
//! - [`storage`]: Photo file locations
//! - [`terminal`]: Interactive terminal front-end

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod flash;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{CaptureScreen, Message, ScreenSettings, Stage};
pub use config::Config;
pub use flash::FlashMode;
