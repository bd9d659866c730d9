// SPDX-License-Identifier: GPL-3.0-only

//! Async photo capture pipeline
//!
//! ```text
//! Preview frame → RGB → JPEG + EXIF orientation → unique file
//!       ↓
//! Preview continues uninterrupted
//! ```
//!
//! All stages run on the blocking pool so the UI thread never waits on
//! encoding or disk I/O.

pub mod encoding;
pub mod processing;

use crate::backends::camera::types::CameraFrame;
use crate::constants::{CAPTURE_FILE_NAME, DEFAULT_JPEG_QUALITY};
use crate::errors::PhotoError;
use crate::storage::PhotoLibrary;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Frame → saved photo
#[derive(Debug, Clone, Copy)]
pub struct PhotoPipeline {
    quality: u8,
}

impl PhotoPipeline {
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode `frame` and write it to `library` under a unique
    /// `photo.jpg`-derived name. Returns the path of the new file.
    pub async fn capture_and_save(
        &self,
        frame: Arc<CameraFrame>,
        library: PhotoLibrary,
    ) -> Result<PathBuf, PhotoError> {
        let quality = self.quality;
        tokio::task::spawn_blocking(move || save_frame(&frame, &library, quality))
            .await
            .map_err(|e| PhotoError::SaveFailed(format!("Capture task failed: {}", e)))?
    }
}

impl Default for PhotoPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Synchronous body of [`PhotoPipeline::capture_and_save`]
pub fn save_frame(
    frame: &CameraFrame,
    library: &PhotoLibrary,
    quality: u8,
) -> Result<PathBuf, PhotoError> {
    info!(width = frame.width, height = frame.height, quality, "Saving photo");
    let rgb = processing::frame_to_rgb(frame)?;
    let data = encoding::encode_photo(&rgb, quality)?;
    debug!(bytes = data.len(), "Photo encoded");
    library.ensure()?;
    encoding::save(library, CAPTURE_FILE_NAME, &data)
}
