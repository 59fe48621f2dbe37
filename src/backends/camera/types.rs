// SPDX-License-Identifier: GPL-3.0-only
// Shared types for frame source abstraction

//! Shared types for frame sources

use crate::errors::{PhotoError, PhotoResult};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// Raw RGBA image owned by one pipeline stage at a time
///
/// Row-major, 8 bits per channel, no row padding. The length invariant
/// `data.len() == width * height * 4` holds for every constructed buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw RGBA bytes, validating the length invariant
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> PhotoResult<Self> {
        let expected = Self::expected_len(width, height);
        if data.len() != expected {
            return Err(PhotoError::InvalidBuffer(format!(
                "{}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer where every pixel has the same RGBA value
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * BYTES_PER_PIXEL);
        for _ in 0..pixels {
            data.extend_from_slice(&rgba);
        }

        Self {
            width,
            height,
            data,
        }
    }

    /// Zero-sized buffer
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
        }
    }

    fn expected_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True when the buffer holds no pixels
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// RGBA value at (x, y), `None` outside the buffer
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.data[idx..idx + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert into an `image` buffer for codec and resampling work
    pub fn into_rgba_image(self) -> PhotoResult<RgbaImage> {
        let (width, height) = (self.width, self.height);
        RgbaImage::from_raw(width, height, self.data).ok_or_else(|| {
            PhotoError::InvalidBuffer(format!("cannot view {}x{} buffer as image", width, height))
        })
    }
}

impl From<RgbaImage> for PixelBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PixelBuffer({}x{}, {} bytes)",
            self.width,
            self.height,
            self.data.len()
        )
    }
}

/// Which camera a stream is opened on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Back camera
    #[default]
    Environment,
    /// Front (selfie) camera
    User,
}

impl FacingMode {
    /// The opposite camera
    pub fn flipped(&self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }

    /// Front camera frames are stored mirrored, the way the preview shows them
    pub fn is_mirrored(&self) -> bool {
        matches!(self, FacingMode::User)
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment" | "back" | "rear" => Ok(FacingMode::Environment),
            "user" | "front" | "selfie" => Ok(FacingMode::User),
            other => Err(format!("unknown facing mode: {}", other)),
        }
    }
}

/// Handle to an opened camera device stream
///
/// Clones share the same live flag, so any clone can observe or stop the
/// underlying track.
#[derive(Debug, Clone)]
pub struct DeviceStream {
    label: String,
    facing: FacingMode,
    live: Arc<AtomicBool>,
}

impl DeviceStream {
    /// Create a live stream handle
    pub fn new(label: impl Into<String>, facing: FacingMode) -> Self {
        Self {
            label: label.into(),
            facing,
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    /// True until the stream is stopped
    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Stop the track, releasing the device
    ///
    /// Returns true if this call stopped a live stream.
    pub fn stop(&self) -> bool {
        self.live.swap(false, Ordering::SeqCst)
    }
}

/// Result type for frame source operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for frame source operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Stream stopped or never started
    #[error("Stream not ready: {0}")]
    NotReady(String),
    /// Camera device not found or access denied
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// Source produced data the pipeline cannot use
    #[error("Format not supported: {0}")]
    FormatNotSupported(String),
    /// General I/O error
    #[error("I/O error: {0}")]
    IoError(String),
    /// Other errors
    #[error("Error: {0}")]
    Other(String),
}
