// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for photo files

use crate::constants::storage as storage_consts;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Photo directory: `<Pictures>/<folder>`, falling back to `~/Pictures`
/// when the XDG directory is not configured
pub fn photo_directory(folder: &str) -> PathBuf {
    dirs::picture_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Pictures")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(folder)
}

/// `IMG_YYYYMMDD_HHMMSS.ext` inside `dir`, with a `_N` suffix when a photo
/// from the same second already exists
pub fn unique_photo_path(dir: &Path, extension: &str, timestamp: DateTime<Local>) -> PathBuf {
    let stem = format!(
        "{}{}",
        storage_consts::FILENAME_PREFIX,
        timestamp.format(storage_consts::FILENAME_TIMESTAMP_FORMAT)
    );

    let first = dir.join(format!("{}.{}", stem, extension));
    if !first.exists() {
        return first;
    }

    (1u32..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, extension)))
        .find(|path| !path.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn collisions_get_a_counter() {
        let dir = std::env::temp_dir().join(format!("polaroid-storage-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let at = Local.with_ymd_and_hms(2024, 3, 5, 9, 7, 1).unwrap();

        let first = unique_photo_path(&dir, "jpg", at);
        assert_eq!(first.file_name().unwrap(), "IMG_20240305_090701.jpg");

        std::fs::write(&first, b"x").unwrap();
        let second = unique_photo_path(&dir, "jpg", at);
        assert_eq!(second.file_name().unwrap(), "IMG_20240305_090701_1.jpg");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn folder_is_appended() {
        assert!(photo_directory("Polaroid").ends_with("Polaroid"));
    }
}
