// SPDX-License-Identifier: GPL-3.0-only

//! Photo library: where saved photos end up

use crate::errors::SaveError;
use crate::pipelines::photo::{CapturedPhoto, EncodingFormat, PhotoEncoder};
use crate::storage::unique_photo_path;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// A persisted photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAsset {
    pub path: PathBuf,
}

/// Library collaborator
///
/// Blocking; the capture screen runs it on tokio's blocking pool.
pub trait MediaLibrary: Send + Sync {
    /// Persist a captured photo as a new asset
    fn save_asset(&self, photo: &CapturedPhoto) -> Result<SavedAsset, SaveError>;
}

/// Directory of encoded photo files
pub struct PhotoLibrary {
    directory: PathBuf,
    encoder: PhotoEncoder,
}

impl PhotoLibrary {
    pub fn new(directory: PathBuf, format: EncodingFormat) -> Self {
        Self {
            directory,
            encoder: PhotoEncoder::new(format),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl MediaLibrary for PhotoLibrary {
    fn save_asset(&self, photo: &CapturedPhoto) -> Result<SavedAsset, SaveError> {
        std::fs::create_dir_all(&self.directory)?;

        let encoded = self
            .encoder
            .encode(photo.image(), photo.quality())
            .map_err(SaveError::EncodingFailed)?;

        // create_new so two saves in the same second never clobber each other
        let mut attempts = 0;
        let path = loop {
            let path = unique_photo_path(
                &self.directory,
                encoded.format.extension(),
                photo.captured_at(),
            );
            match std::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
            {
                Ok(_) => break path,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && attempts < 8 => {
                    attempts += 1;
                    debug!(path = %path.display(), "Photo path taken, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        };

        commit(&path, |file| {
            file.write_all(&encoded.data)?;
            file.sync_all()
        })?;

        info!(
            path = %path.display(),
            width = encoded.width,
            height = encoded.height,
            bytes = encoded.data.len(),
            "Photo saved"
        );
        Ok(SavedAsset { path })
    }
}

/// Fill `path` through a hidden sibling file renamed over it once written.
///
/// `path` is the empty file reserving the name. On failure neither file is
/// left in the library.
fn commit(
    path: &Path,
    write: impl FnOnce(&mut File) -> std::io::Result<()>,
) -> Result<(), SaveError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{}.tmp", file_name));

    let result = std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&staging)
        .and_then(|mut file| write(&mut file))
        .and_then(|()| std::fs::rename(&staging, path));

    if let Err(e) = result {
        warn!(path = %path.display(), error = %e, "Discarding incomplete photo");
        let _ = std::fs::remove_file(&staging);
        let _ = std::fs::remove_file(path);
        return Err(e.into());
    }
    Ok(())
}
