// SPDX-License-Identifier: GPL-3.0-only

//! Photo capture from a frame source
//!
//! Grabs a single frame from an open device stream and fits it into the
//! capture box. Nothing is buffered between captures; every call reads the
//! current frame.

use super::processing;
use crate::backends::camera::types::{DeviceStream, PixelBuffer};
use crate::backends::camera::FrameSource;
use crate::errors::{PhotoError, PhotoResult};
use tracing::{debug, info};

/// Bounding box a captured frame must fit into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureBox {
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for CaptureBox {
    fn default() -> Self {
        Self {
            max_width: crate::constants::capture::MAX_WIDTH,
            max_height: crate::constants::capture::MAX_HEIGHT,
        }
    }
}

/// Read the current frame and downscale it into `bounds`
///
/// A stream that is stopped or not ready fails with `SourceUnavailable`.
pub async fn grab_frame(
    source: &dyn FrameSource,
    stream: &DeviceStream,
    bounds: CaptureBox,
) -> PhotoResult<PixelBuffer> {
    info!(source = source.name(), "Capturing photo from frame source");

    let frame = source.read_frame(stream).await?;
    if frame.is_empty() {
        return Err(PhotoError::SourceUnavailable(
            "frame source returned an empty frame".into(),
        ));
    }

    debug!(
        width = frame.width(),
        height = frame.height(),
        "Frame captured from source"
    );

    tokio::task::spawn_blocking(move || {
        processing::resize(frame, bounds.max_width, bounds.max_height)
    })
    .await
    .map_err(|e| PhotoError::SourceUnavailable(format!("Resize task error: {}", e)))?
}

/// Mirror front camera frames, then apply the exposure bias
pub async fn develop(
    frame: PixelBuffer,
    mirrored: bool,
    exposure: f64,
) -> PhotoResult<PixelBuffer> {
    tokio::task::spawn_blocking(move || {
        let frame = if mirrored {
            processing::mirror_horizontal(frame)
        } else {
            frame
        };
        processing::adjust_exposure(frame, exposure)
    })
    .await
    .map_err(|e| PhotoError::InvalidBuffer(format!("Exposure task error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::FacingMode;
    use crate::backends::virtual_camera::TestPatternSource;

    #[tokio::test]
    async fn test_grab_frame_fits_box() {
        let source = TestPatternSource::new(3840, 2160);
        let stream = source.open(FacingMode::Environment).await.unwrap();
        let frame = grab_frame(&source, &stream, CaptureBox::default()).await.unwrap();
        assert_eq!(frame.dimensions(), (1920, 1080));
    }

    #[tokio::test]
    async fn test_grab_frame_never_upscales() {
        let source = TestPatternSource::new(640, 360);
        let stream = source.open(FacingMode::Environment).await.unwrap();
        let frame = grab_frame(&source, &stream, CaptureBox::default()).await.unwrap();
        assert_eq!(frame.dimensions(), (640, 360));
    }

    #[tokio::test]
    async fn test_stopped_stream_is_source_unavailable() {
        let source = TestPatternSource::new(64, 64);
        let stream = source.open(FacingMode::Environment).await.unwrap();
        stream.stop();
        let err = grab_frame(&source, &stream, CaptureBox::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_develop_mirrors_before_exposure() {
        let frame = PixelBuffer::new(2, 1, vec![10, 10, 10, 255, 200, 200, 200, 255]).unwrap();
        let out = develop(frame, true, 1.0).await.unwrap();
        assert_eq!(out.pixel(0, 0), Some([225, 225, 225, 255]));
        assert_eq!(out.pixel(1, 0), Some([35, 35, 35, 255]));
    }
}
