// SPDX-License-Identifier: GPL-3.0-only

//! Pipeline policy constants
//!
//! Values that the capture and edit paths treat as policy rather than
//! configuration. Capture and edit encode at different qualities.

use std::time::Duration;

/// Capture bounding box and exposure limits
pub mod capture {
    /// Maximum width of a captured photo
    pub const MAX_WIDTH: u32 = 1920;
    /// Maximum height of a captured photo
    pub const MAX_HEIGHT: u32 = 1080;

    /// Lowest exposure bias accepted by the capture path
    pub const EXPOSURE_MIN: f64 = -2.0;
    /// Highest exposure bias accepted by the capture path
    pub const EXPOSURE_MAX: f64 = 2.0;
    /// Channel delta per exposure unit (exposure 1.0 adds 25 to R, G and B)
    pub const EXPOSURE_STEP: f64 = 25.0;

    /// File name prefix for captured photos
    pub const FILE_PREFIX: &str = "photo";
}

/// Edit-save path settings
pub mod edit {
    /// File name prefix for edited photos
    pub const FILE_PREFIX: &str = "edited";
}

/// Encoder quality policies (0.0 exclusive to 1.0 inclusive)
pub mod quality {
    /// JPEG quality used when storing a fresh capture
    pub const CAPTURE: f64 = 0.85;
    /// JPEG quality used when storing an edited photo
    pub const EDIT: f64 = 0.95;
}

/// Coarse progress checkpoints reported while saving a photo
pub mod progress {
    /// Pixel buffer has been encoded
    pub const ENCODED: u8 = 30;
    /// Upload payload has been built
    pub const BLOB_READY: u8 = 50;
    /// Storage accepted the upload
    pub const UPLOADED: u8 = 80;
    /// Photo record has been written
    pub const COMPLETE: u8 = 100;
}

/// Upload retry policy defaults
pub mod upload {
    use super::Duration;

    /// Attempts in total, including the first one
    pub const MAX_ATTEMPTS: u32 = 3;
    /// Fixed wait between failed attempts
    pub const BACKOFF: Duration = Duration::from_secs(1);
    /// Content type of every encoded photo
    pub const CONTENT_TYPE: &str = "image/jpeg";
}

/// Fixed camera settings stored with each capture
///
/// Frame sources do not report sensor values, so every capture records the
/// same payload.
pub mod camera_settings {
    pub const ISO: &str = "AUTO";
    pub const APERTURE: &str = "f/2.8";
    pub const SHUTTER_SPEED: &str = "1/60";
}

/// Histogram layout
pub mod histogram {
    /// Bins per channel
    pub const BINS: usize = 256;
}

/// Filter preview strip
pub mod preview {
    /// Bounding box edge of a filter preview thumbnail
    pub const THUMBNAIL_EDGE: u32 = 160;
}

/// File extensions accepted as still-image frame sources
pub mod file_formats {
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "tiff", "tif"];

    /// Check whether an extension (without the dot) names a supported image
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_policies_are_distinct() {
        assert!(quality::CAPTURE < quality::EDIT);
        assert!(quality::EDIT <= 1.0);
    }

    #[test]
    fn test_image_extension_matching() {
        assert!(file_formats::is_image_extension("JPG"));
        assert!(file_formats::is_image_extension("png"));
        assert!(!file_formats::is_image_extension("mp4"));
    }
}
