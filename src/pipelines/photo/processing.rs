// SPDX-License-Identifier: GPL-3.0-only

//! Pixel stages applied between frame acquisition and encoding
//!
//! - [`resize`]: fit a frame into a bounding box, never upscaling
//! - [`adjust_exposure`]: add a flat exposure bias to R, G and B
//! - [`mirror_horizontal`]: flip front camera frames
//!
//! All stages take the buffer by value and hand it back, so only one
//! stage owns the pixels at a time. Invalid inputs cannot reach these
//! functions because [`PixelBuffer`] guards its own length.

use crate::backends::camera::types::{BYTES_PER_PIXEL, PixelBuffer};
use crate::constants::capture::{EXPOSURE_MAX, EXPOSURE_MIN, EXPOSURE_STEP};
use crate::errors::PhotoResult;
use image::imageops::{self, FilterType};
use tracing::{debug, warn};

/// Target dimensions for fitting `width`×`height` into a box
///
/// Returns the input size when it already fits. Otherwise scales by
/// `min(max_width / width, max_height / height)` and truncates, keeping
/// each side at least one pixel.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let ratio =
        (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    let new_width = ((width as f64 * ratio) as u32).clamp(1, max_width.max(1));
    let new_height = ((height as f64 * ratio) as u32).clamp(1, max_height.max(1));
    (new_width, new_height)
}

/// Downscale a buffer to fit the box, preserving aspect ratio
///
/// Identity when both dimensions already fit. Resampling is bilinear and
/// deterministic.
pub fn resize(buffer: PixelBuffer, max_width: u32, max_height: u32) -> PhotoResult<PixelBuffer> {
    let (width, height) = buffer.dimensions();
    let (new_width, new_height) = fit_dimensions(width, height, max_width, max_height);
    if (new_width, new_height) == (width, height) {
        return Ok(buffer);
    }

    debug!(
        from_width = width,
        from_height = height,
        to_width = new_width,
        to_height = new_height,
        "Resizing frame"
    );

    let image = buffer.into_rgba_image()?;
    Ok(PixelBuffer::from(imageops::resize(
        &image,
        new_width,
        new_height,
        FilterType::Triangle,
    )))
}

/// Add `exposure * 25` to every color channel
///
/// Exposure outside -2.0..=2.0 is clamped with a warning. Channels saturate
/// at 0 and 255, fractional results round half to even, and alpha is left
/// alone. Zero exposure returns the buffer untouched.
pub fn adjust_exposure(mut buffer: PixelBuffer, exposure: f64) -> PixelBuffer {
    let exposure = clamp_exposure(exposure);
    if exposure == 0.0 {
        return buffer;
    }

    let delta = exposure * EXPOSURE_STEP;
    for px in buffer.as_bytes_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
        for channel in &mut px[..3] {
            *channel = (*channel as f64 + delta).clamp(0.0, 255.0).round_ties_even() as u8;
        }
    }

    buffer
}

/// Clamp an exposure bias into the supported range
pub fn clamp_exposure(exposure: f64) -> f64 {
    if exposure.is_nan() {
        warn!("Exposure is NaN, using 0");
        return 0.0;
    }
    if !(EXPOSURE_MIN..=EXPOSURE_MAX).contains(&exposure) {
        let clamped = exposure.clamp(EXPOSURE_MIN, EXPOSURE_MAX);
        warn!(requested = exposure, clamped, "Exposure out of range, clamping");
        return clamped;
    }
    exposure
}

/// Flip a buffer left to right
pub fn mirror_horizontal(buffer: PixelBuffer) -> PixelBuffer {
    let row_len = buffer.width() as usize * BYTES_PER_PIXEL;
    if row_len == 0 {
        return buffer;
    }

    let mut buffer = buffer;
    for row in buffer.as_bytes_mut().chunks_exact_mut(row_len) {
        let pixels = row.len() / BYTES_PER_PIXEL;
        for x in 0..pixels / 2 {
            let left = x * BYTES_PER_PIXEL;
            let right = (pixels - 1 - x) * BYTES_PER_PIXEL;
            for c in 0..BYTES_PER_PIXEL {
                row.swap(left + c, right + c);
            }
        }
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_dimensions() {
        assert_eq!(fit_dimensions(3840, 2160, 1920, 1080), (1920, 1080));
        assert_eq!(fit_dimensions(4000, 3000, 1920, 1080), (1440, 1080));
        assert_eq!(fit_dimensions(1000, 500, 1920, 1080), (1000, 500));
        assert_eq!(fit_dimensions(10_000, 1, 100, 100), (100, 1));
    }

    #[test]
    fn test_resize_within_bounds_is_identity() {
        let buffer = PixelBuffer::filled(320, 240, [1, 2, 3, 4]);
        let out = resize(buffer.clone(), 1920, 1080).unwrap();
        assert_eq!(out, buffer);
    }

    #[test]
    fn test_resize_is_idempotent_and_bounded() {
        let buffer = PixelBuffer::filled(1000, 900, [10, 20, 30, 255]);
        let once = resize(buffer, 640, 480).unwrap();
        assert!(once.width() <= 640 && once.height() <= 480);
        assert_eq!(once.dimensions(), (533, 480));

        let twice = resize(once.clone(), 640, 480).unwrap();
        assert_eq!(twice, once);
    }

    #[test]
    fn test_resize_output_is_a_whole_buffer() {
        for (w, h, bw, bh) in [(1001, 3, 100, 100), (7, 999, 5, 5), (400, 300, 1, 1)] {
            let out = resize(PixelBuffer::filled(w, h, [200, 100, 50, 255]), bw, bh).unwrap();
            let (ow, oh) = out.dimensions();
            assert_eq!((ow, oh), fit_dimensions(w, h, bw, bh));
            assert_eq!(out.as_bytes().len(), ow as usize * oh as usize * BYTES_PER_PIXEL);
            assert_eq!(out.pixel(ow - 1, oh - 1), Some([200, 100, 50, 255]));
        }
    }

    #[test]
    fn test_exposure_formula() {
        let buffer = PixelBuffer::new(
            2,
            1,
            vec![0, 100, 250, 17, 128, 128, 128, 255],
        )
        .unwrap();

        let brighter = adjust_exposure(buffer.clone(), 1.0);
        assert_eq!(brighter.as_bytes(), &[25, 125, 255, 17, 153, 153, 153, 255]);

        let darker = adjust_exposure(buffer.clone(), -2.0);
        assert_eq!(darker.as_bytes(), &[0, 50, 200, 17, 78, 78, 78, 255]);

        assert_eq!(adjust_exposure(buffer.clone(), 0.0), buffer);
    }

    #[test]
    fn test_exposure_sweep_matches_formula() {
        let data: Vec<u8> = (0..=255u8).flat_map(|p| [p, p, p, 255 - p]).collect();
        let buffer = PixelBuffer::new(256, 1, data).unwrap();

        for step in -4..=4 {
            let e = step as f64 * 0.5;
            let out = adjust_exposure(buffer.clone(), e);
            for p in 0..=255u8 {
                let expected = (p as f64 + e * 25.0).clamp(0.0, 255.0).round_ties_even() as u8;
                assert_eq!(
                    out.pixel(p as u32, 0),
                    Some([expected, expected, expected, 255 - p]),
                    "exposure {} at {}",
                    e,
                    p
                );
            }
        }
    }

    #[test]
    fn test_exposure_rounds_half_to_even() {
        // 0.1 * 25 = 2.5
        let buffer = PixelBuffer::filled(1, 1, [10, 11, 0, 255]);
        let out = adjust_exposure(buffer, 0.1);
        assert_eq!(out.pixel(0, 0), Some([12, 14, 2, 255]));
    }

    #[test]
    fn test_exposure_is_clamped_to_range() {
        let buffer = PixelBuffer::filled(1, 1, [100, 100, 100, 255]);
        let out = adjust_exposure(buffer, 5.0);
        assert_eq!(out.pixel(0, 0), Some([150, 150, 150, 255]));
        assert_eq!(clamp_exposure(-7.0), -2.0);
    }

    #[test]
    fn test_mirror_horizontal() {
        let buffer = PixelBuffer::new(3, 1, vec![1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3]).unwrap();
        let out = mirror_horizontal(buffer);
        assert_eq!(out.as_bytes(), &[3, 3, 3, 3, 2, 2, 2, 2, 1, 1, 1, 1]);
    }
}
