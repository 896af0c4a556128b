// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Taking a photo without the interactive screen

use polaroid::app::{CaptureScreen, Message, ScreenSettings, Stage};
use polaroid::backends::Platform;
use polaroid::config::Config;
use std::fs::File;

/// List all available cameras
pub fn list_cameras(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let platform = Platform::from_config(config)?;
    let cameras = platform.camera.enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", platform.camera.backend_type());
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      Path: {}", camera.path);
        if let Some(driver) = &camera.driver {
            println!("      Driver: {}", driver);
        }
        match camera.facing {
            Some(facing) => println!("      Facing: {}", facing),
            None => println!("      Facing: unknown"),
        }
        println!("      Rotation: {}", camera.rotation);
        println!();
    }

    Ok(())
}

/// Take one photo and save it, running the same flow as the interactive screen
pub fn take_photo(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(capture_and_save(config))
}

async fn capture_and_save(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let platform = Platform::from_config(config)?;
    let mut screen = CaptureScreen::new(platform, ScreenSettings::from(config));

    screen.perform(Message::RequestPermissions).await;
    let permissions = screen.permissions();
    if !permissions.camera.is_granted() {
        return Err("No access to any camera".into());
    }
    if !permissions.library.is_granted() {
        return Err(format!("Cannot write to {}", config.photo_directory().display()).into());
    }

    println!(
        "Capturing with the {} camera (flash {})...",
        screen.facing(),
        screen.flash()
    );
    screen.perform(Message::Capture).await;

    let caption = match screen.stage() {
        Stage::Reviewing(review) => review.caption.clone(),
        _ => return Err(failure(&screen, "Capture failed").into()),
    };

    screen.perform(Message::SaveToLibrary).await;
    match screen.last_saved() {
        Some(asset) if matches!(screen.stage(), Stage::LivePreview) => {
            println!("Photo saved: {} ({})", asset.path.display(), caption);
            Ok(())
        }
        _ => Err(failure(&screen, "Save failed").into()),
    }
}

fn failure(screen: &CaptureScreen, fallback: &str) -> String {
    screen
        .notice()
        .map(|notice| notice.text.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Log file for the interactive mode (`~/.cache/polaroid/polaroid.log`)
pub fn open_log_file() -> Option<File> {
    let dir = dirs::cache_dir()?.join("polaroid");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("polaroid.log"))
        .ok()
}
