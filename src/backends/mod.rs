// SPDX-License-Identifier: MPL-2.0

//! Platform collaborators of the capture screen
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                CaptureScreen                │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │                  Platform                   │
//! │  ┌─────────────┐ ┌──────────┐ ┌──────────┐  │
//! │  │ Permissions │ │  Camera  │ │ Library  │  │
//! │  │  (access)   │ │  (V4L2)  │ │ (files)  │  │
//! │  └─────────────┘ └──────────┘ └──────────┘  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Device enumeration, preview streams and photo capture
//! - [`permissions`]: Camera and library access checks
//! - [`library`]: Writing photos to the photo directory

pub mod camera;
pub mod library;
pub mod permissions;

use crate::backends::camera::{CameraBackend, CameraBackendType, V4l2Backend, VirtualCamera};
use crate::backends::camera::virtual_camera::VirtualSource;
use crate::backends::library::{MediaLibrary, PhotoLibrary};
use crate::backends::permissions::{PermissionProvider, SystemPermissions};
use crate::config::{Config, VirtualSourceConfig};
use crate::errors::{AppError, AppResult};
use std::sync::Arc;
use tracing::{info, warn};

/// The collaborators injected into the capture screen
#[derive(Clone)]
pub struct Platform {
    pub camera: Arc<dyn CameraBackend>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub library: Arc<dyn MediaLibrary>,
}

impl Platform {
    /// Build the collaborators selected by `config`.
    ///
    /// The V4L2 backend falls back to the test pattern when the machine has
    /// no video nodes at all.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let photo_dir = config.photo_directory();
        let library: Arc<dyn MediaLibrary> =
            Arc::new(PhotoLibrary::new(photo_dir.clone(), config.output_format.into()));

        let backend = match config.backend {
            CameraBackendType::V4l2 if !V4l2Backend::is_available() => {
                warn!("No V4L2 devices found, using the test pattern");
                CameraBackendType::Virtual
            }
            other => other,
        };

        let (camera, permissions): (Arc<dyn CameraBackend>, Arc<dyn PermissionProvider>) =
            match backend {
                CameraBackendType::V4l2 => (
                    Arc::new(V4l2Backend::new()),
                    Arc::new(SystemPermissions::new(photo_dir)),
                ),
                CameraBackendType::Virtual => {
                    let source = match (&config.backend, &config.virtual_source) {
                        (CameraBackendType::Virtual, VirtualSourceConfig::Image(path)) => {
                            VirtualSource::Image(path.clone())
                        }
                        _ => VirtualSource::TestPattern,
                    };
                    let camera = VirtualCamera::from_source(&source)
                        .map_err(|e| AppError::Config(e.to_string()))?;
                    (
                        Arc::new(camera),
                        Arc::new(SystemPermissions::new(photo_dir).with_virtual_camera()),
                    )
                }
            };

        info!(backend = %camera.backend_type(), "Camera backend selected");

        Ok(Self {
            camera,
            permissions,
            library,
        })
    }
}
