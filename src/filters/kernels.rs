// SPDX-License-Identifier: GPL-3.0-only

//! Per-operation pixel kernels
//!
//! Each kernel maps one normalized RGB triple to another and clamps the
//! result into 0.0..=1.0. Coefficients are the CSS Filter Effects matrices.

use crate::media::color::{LUMA_B, LUMA_G, LUMA_R, hsl_to_rgb, rgb_to_hsl};

pub type Rgb = [f32; 3];

#[inline]
fn clamp(rgb: Rgb) -> Rgb {
    [
        rgb[0].clamp(0.0, 1.0),
        rgb[1].clamp(0.0, 1.0),
        rgb[2].clamp(0.0, 1.0),
    ]
}

#[inline]
fn mix(m: &[[f32; 3]; 3], [r, g, b]: Rgb) -> Rgb {
    clamp([
        m[0][0] * r + m[0][1] * g + m[0][2] * b,
        m[1][0] * r + m[1][1] * g + m[1][2] * b,
        m[2][0] * r + m[2][1] * g + m[2][2] * b,
    ])
}

/// Blend toward the sepia tone matrix by `amount` (0 = unchanged, 1 = full)
#[inline]
pub fn sepia(rgb: Rgb, amount: f32) -> Rgb {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    let m = [
        [0.393 + 0.607 * k, 0.769 - 0.769 * k, 0.189 - 0.189 * k],
        [0.349 - 0.349 * k, 0.686 + 0.314 * k, 0.168 - 0.168 * k],
        [0.272 - 0.272 * k, 0.534 - 0.534 * k, 0.131 + 0.869 * k],
    ];
    mix(&m, rgb)
}

/// Scale saturation around luminance (1 = unchanged, 0 = gray)
#[inline]
pub fn saturate(rgb: Rgb, s: f32) -> Rgb {
    let s = s.max(0.0);
    let m = [
        [LUMA_R + (1.0 - LUMA_R) * s, LUMA_G - LUMA_G * s, LUMA_B - LUMA_B * s],
        [LUMA_R - LUMA_R * s, LUMA_G + (1.0 - LUMA_G) * s, LUMA_B - LUMA_B * s],
        [LUMA_R - LUMA_R * s, LUMA_G - LUMA_G * s, LUMA_B + (1.0 - LUMA_B) * s],
    ];
    mix(&m, rgb)
}

/// Reduce toward luminance by `amount` (0 = unchanged, 1 = fully gray)
#[inline]
pub fn grayscale(rgb: Rgb, amount: f32) -> Rgb {
    let k = 1.0 - amount.clamp(0.0, 1.0);
    let m = [
        [LUMA_R + (1.0 - LUMA_R) * k, LUMA_G - LUMA_G * k, LUMA_B - LUMA_B * k],
        [LUMA_R - LUMA_R * k, LUMA_G + (1.0 - LUMA_G) * k, LUMA_B - LUMA_B * k],
        [LUMA_R - LUMA_R * k, LUMA_G - LUMA_G * k, LUMA_B + (1.0 - LUMA_B) * k],
    ];
    mix(&m, rgb)
}

/// Remap around mid-gray
#[inline]
pub fn contrast([r, g, b]: Rgb, c: f32) -> Rgb {
    let c = c.max(0.0);
    clamp([(r - 0.5) * c + 0.5, (g - 0.5) * c + 0.5, (b - 0.5) * c + 0.5])
}

/// Linear multiplier
#[inline]
pub fn brightness([r, g, b]: Rgb, factor: f32) -> Rgb {
    let factor = factor.max(0.0);
    clamp([r * factor, g * factor, b * factor])
}

/// Rotate hue by `degrees` in HSL space
#[inline]
pub fn hue_rotate([r, g, b]: Rgb, degrees: f32) -> Rgb {
    let mut hsl = rgb_to_hsl(r, g, b);
    if hsl.s == 0.0 {
        return [r, g, b];
    }
    hsl.h = (hsl.h + degrees).rem_euclid(360.0);
    let (r, g, b) = hsl_to_rgb(hsl);
    clamp([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-4)
    }

    const SAMPLE: Rgb = [0.8, 0.4, 0.2];

    #[test]
    fn test_neutral_parameters_are_identity() {
        assert!(close(sepia(SAMPLE, 0.0), SAMPLE));
        assert!(close(saturate(SAMPLE, 1.0), SAMPLE));
        assert!(close(grayscale(SAMPLE, 0.0), SAMPLE));
        assert!(close(contrast(SAMPLE, 1.0), SAMPLE));
        assert!(close(brightness(SAMPLE, 1.0), SAMPLE));
        assert!(close(hue_rotate(SAMPLE, 0.0), SAMPLE));
    }

    #[test]
    fn test_full_grayscale_collapses_channels() {
        let [r, g, b] = grayscale(SAMPLE, 1.0);
        assert_eq!(r, g);
        assert_eq!(g, b);
    }

    #[test]
    fn test_zero_contrast_is_mid_gray() {
        assert!(close(contrast(SAMPLE, 0.0), [0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_brightness_clamps() {
        assert!(close(brightness(SAMPLE, 2.0), [1.0, 0.8, 0.4]));
    }

    #[test]
    fn test_hue_rotate_full_turn() {
        assert!(close(hue_rotate(SAMPLE, 360.0), SAMPLE));
        assert!(close(hue_rotate([1.0, 0.0, 0.0], 120.0), [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_full_sepia_on_white() {
        // Row sums of the sepia matrix, clamped
        assert!(close(sepia([1.0, 1.0, 1.0], 1.0), [1.0, 1.0, 0.937]));
    }
}
