// SPDX-License-Identifier: GPL-3.0-only

//! JPEG encoding and decoding of pixel buffers
//!
//! Quality is passed per call as a fraction in (0, 1]. The capture and edit
//! paths use different policies (see [`crate::constants::quality`]).

use crate::backends::camera::types::PixelBuffer;
use crate::errors::{PhotoError, PhotoResult};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};
use tracing::{debug, info};

/// Convert a quality fraction into the encoder's 1..=100 scale
pub fn jpeg_quality(quality: f64) -> PhotoResult<u8> {
    if !(quality > 0.0 && quality <= 1.0) {
        return Err(PhotoError::EncodingFailed(format!(
            "quality {} outside (0, 1]",
            quality
        )));
    }
    Ok(((quality * 100.0).round() as u8).max(1))
}

/// Encode a buffer as JPEG on the calling thread
///
/// Alpha is dropped first; JPEG has no alpha channel.
pub fn encode_jpeg(buffer: &PixelBuffer, quality: f64) -> PhotoResult<Vec<u8>> {
    if buffer.is_empty() || buffer.width() == 0 || buffer.height() == 0 {
        return Err(PhotoError::EncodingFailed(format!(
            "cannot encode empty {}x{} buffer",
            buffer.width(),
            buffer.height()
        )));
    }
    let jpeg_quality = jpeg_quality(quality)?;

    let rgb: Vec<u8> = buffer
        .as_bytes()
        .chunks_exact(4)
        .flat_map(|rgba| [rgba[0], rgba[1], rgba[2]])
        .collect();

    let mut output = Vec::new();
    JpegEncoder::new_with_quality(&mut output, jpeg_quality)
        .write_image(
            &rgb,
            buffer.width(),
            buffer.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| PhotoError::EncodingFailed(format!("JPEG encoding failed: {}", e)))?;

    Ok(output)
}

/// Encode a buffer as JPEG on the blocking pool
pub async fn encode(buffer: PixelBuffer, quality: f64) -> PhotoResult<Vec<u8>> {
    info!(
        width = buffer.width(),
        height = buffer.height(),
        quality,
        "Starting encoding"
    );

    let data = tokio::task::spawn_blocking(move || encode_jpeg(&buffer, quality))
        .await
        .map_err(|e| PhotoError::EncodingFailed(format!("Encoding task error: {}", e)))??;

    debug!(size = data.len(), "Encoding complete");
    Ok(data)
}

/// Decode stored image bytes into an RGBA buffer
pub fn decode_image(bytes: &[u8]) -> PhotoResult<PixelBuffer> {
    image::load_from_memory(bytes)
        .map(|img: DynamicImage| PixelBuffer::from(img.to_rgba8()))
        .map_err(|e| PhotoError::InvalidBuffer(format!("decode failed: {}", e)))
}

/// Decode on the blocking pool
pub async fn decode(bytes: Vec<u8>) -> PhotoResult<PixelBuffer> {
    tokio::task::spawn_blocking(move || decode_image(&bytes))
        .await
        .map_err(|e| PhotoError::InvalidBuffer(format!("Decode task error: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_conversion() {
        assert_eq!(jpeg_quality(0.85).unwrap(), 85);
        assert_eq!(jpeg_quality(0.95).unwrap(), 95);
        assert_eq!(jpeg_quality(1.0).unwrap(), 100);
        assert!(jpeg_quality(0.0).is_err());
        assert!(jpeg_quality(1.2).is_err());
    }

    #[test]
    fn test_empty_buffer_fails() {
        let err = encode_jpeg(&PixelBuffer::empty(), 0.85).unwrap_err();
        assert!(matches!(err, PhotoError::EncodingFailed(_)));
    }

    #[tokio::test]
    async fn test_encode_produces_decodable_jpeg() {
        let buffer = PixelBuffer::filled(64, 48, [120, 60, 30, 255]);
        let bytes = encode(buffer, 0.85).await.unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);

        let decoded = decode(bytes).await.unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
        let [r, g, b, a] = decoded.pixel(10, 10).unwrap();
        assert!(r.abs_diff(120) <= 3 && g.abs_diff(60) <= 3 && b.abs_diff(30) <= 3);
        assert_eq!(a, 255);
    }

    #[test]
    fn test_garbage_does_not_decode() {
        assert!(decode_image(b"not an image").is_err());
    }
}
