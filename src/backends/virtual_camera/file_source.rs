// SPDX-License-Identifier: GPL-3.0-only

//! Still image frame source
//!
//! Serves a static image file as if it were a camera. Every read decodes
//! the file again, so edits to the file show up on the next capture.

use crate::backends::camera::{
    BackendError, BackendResult, DeviceStream, FacingMode, FrameSource, PixelBuffer, ensure_live,
};
use crate::constants::file_formats;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Frame source backed by an image file
pub struct StillImageSource {
    path: PathBuf,
    name: String,
}

impl StillImageSource {
    /// Create a source for an image file
    ///
    /// Only the extension is checked here; the file is read on each frame.
    pub fn new(path: impl Into<PathBuf>) -> BackendResult<Self> {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !file_formats::is_image_extension(&extension) {
            return Err(BackendError::FormatNotSupported(format!(
                "Unsupported file format: {}",
                extension
            )));
        }

        let name = format!("still:{}", path.display());
        Ok(Self { path, name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl FrameSource for StillImageSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn open(&self, facing: FacingMode) -> BackendResult<DeviceStream> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(BackendError::DeviceNotFound(format!(
                "{} does not exist",
                self.path.display()
            )));
        }

        info!(path = %self.path.display(), facing = %facing, "Opening still image source");
        Ok(DeviceStream::new(self.name.clone(), facing))
    }

    async fn read_frame(&self, stream: &DeviceStream) -> BackendResult<PixelBuffer> {
        ensure_live(stream)?;
        load_image_as_frame(&self.path).await
    }
}

/// Decode an image file into an RGBA pixel buffer
pub async fn load_image_as_frame(path: &Path) -> BackendResult<PixelBuffer> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| BackendError::IoError(format!("{}: {}", path.display(), e)))?;

    let frame = tokio::task::spawn_blocking(move || {
        image::load_from_memory(&bytes)
            .map(|img| PixelBuffer::from(img.to_rgba8()))
            .map_err(|e| BackendError::FormatNotSupported(e.to_string()))
    })
    .await
    .map_err(|e| BackendError::Other(format!("Decode task error: {}", e)))??;

    debug!(
        width = frame.width(),
        height = frame.height(),
        path = %path.display(),
        "Image frame loaded"
    );
    Ok(frame)
}
