// SPDX-License-Identifier: GPL-3.0-only

//! Virtual frame sources
//!
//! Stand-ins for a physical camera: a still image file and a synthetic
//! test pattern. Both follow the same stream contract as a real device.

pub mod file_source;

pub use file_source::StillImageSource;

use crate::backends::camera::{
    BackendError, BackendResult, DeviceStream, FacingMode, FrameSource, PixelBuffer, ensure_live,
};
use async_trait::async_trait;
use tracing::debug;

/// Constant blue level of the test pattern
const PATTERN_BLUE: u8 = 128;

/// Deterministic gradient source at a fixed native resolution
///
/// Red ramps left to right, green top to bottom, blue is constant. Useful
/// for exercising resize and exposure paths without a device.
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render one frame of the pattern
    pub fn render(&self) -> PixelBuffer {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut data = Vec::with_capacity(w * h * 4);

        for y in 0..h {
            let g = ramp(y, h);
            for x in 0..w {
                data.extend_from_slice(&[ramp(x, w), g, PATTERN_BLUE, 255]);
            }
        }

        // Length matches width * height * 4 by construction
        PixelBuffer::new(self.width, self.height, data).unwrap_or_else(|_| PixelBuffer::empty())
    }
}

/// Map a position onto 0..=255
fn ramp(pos: usize, len: usize) -> u8 {
    if len <= 1 {
        0
    } else {
        (pos * 255 / (len - 1)) as u8
    }
}

#[async_trait]
impl FrameSource for TestPatternSource {
    fn name(&self) -> &str {
        "test-pattern"
    }

    async fn open(&self, facing: FacingMode) -> BackendResult<DeviceStream> {
        if self.width == 0 || self.height == 0 {
            return Err(BackendError::DeviceNotFound(
                "test pattern has zero size".into(),
            ));
        }
        Ok(DeviceStream::new(
            format!("pattern-{}x{}", self.width, self.height),
            facing,
        ))
    }

    async fn read_frame(&self, stream: &DeviceStream) -> BackendResult<PixelBuffer> {
        ensure_live(stream)?;

        let pattern = self.clone();
        let frame = tokio::task::spawn_blocking(move || pattern.render())
            .await
            .map_err(|e| BackendError::Other(format!("Pattern task error: {}", e)))?;

        debug!(
            width = frame.width(),
            height = frame.height(),
            "Test pattern frame rendered"
        );
        Ok(frame)
    }
}
