// SPDX-License-Identifier: GPL-3.0-only

//! Static film filter catalog
//!
//! Film stock looks from the photo editor followed by the extra looks of the
//! preview strip. Identifiers are persisted in photo records, so they never
//! change once shipped.

use super::{FilterOp, FilterProfile};
use FilterOp::{Brightness, Contrast, Grayscale, HueRotate, Saturate, Sepia};

/// Identifier of the identity profile
pub const NONE_ID: &str = "none";

pub static CATALOG: &[FilterProfile] = &[
    FilterProfile::new(NONE_ID, "Original", &[]),
    FilterProfile::new(
        "polaroid",
        "Polaroid Classic",
        &[Contrast(1.1), Brightness(1.1), Saturate(0.9), Sepia(0.1)],
    ),
    FilterProfile::new(
        "kodak_gold",
        "Kodak Gold",
        &[Saturate(1.3), Brightness(1.05), Contrast(1.1), HueRotate(-5.0)],
    ),
    FilterProfile::new(
        "fuji_velvia",
        "Fuji Velvia",
        &[Saturate(1.6), Contrast(1.2), Brightness(1.02)],
    ),
    FilterProfile::new(
        "vintage_sepia",
        "Vintage Sepia",
        &[Sepia(0.6), Contrast(1.1), Brightness(1.05)],
    ),
    FilterProfile::new(
        "bw_film",
        "Black & White Film",
        &[Grayscale(1.0), Contrast(1.2), Brightness(1.05)],
    ),
    FilterProfile::new(
        "lomography",
        "Lomography",
        &[Saturate(1.5), Contrast(1.3), Brightness(0.95), HueRotate(5.0)],
    ),
    FilterProfile::new(
        "retro_warm",
        "Retro Warm",
        &[Sepia(0.3), Saturate(1.2), Brightness(1.08), Contrast(1.1)],
    ),
    FilterProfile::new(
        "cool_film",
        "Cool Film",
        &[Saturate(0.9), Brightness(1.05), Contrast(1.15), HueRotate(10.0)],
    ),
    FilterProfile::new(
        "high_contrast",
        "High Contrast",
        &[Contrast(1.4), Saturate(1.1), Brightness(0.98)],
    ),
    FilterProfile::new(
        "vintage_warm",
        "Vintage Warm",
        &[Sepia(0.3), Contrast(1.1), Brightness(1.05)],
    ),
    FilterProfile::new(
        "classic_bw",
        "Classic B&W",
        &[Grayscale(1.0), Contrast(1.2)],
    ),
    FilterProfile::new(
        "faded_film",
        "Faded Film",
        &[Contrast(0.85), Brightness(1.1), Saturate(0.7)],
    ),
    FilterProfile::new(
        "golden_hour",
        "Golden Hour",
        &[Sepia(0.2), Saturate(1.3), Brightness(1.1)],
    ),
    FilterProfile::new(
        "kodachrome",
        "Kodachrome",
        &[Saturate(1.5), Contrast(1.2), HueRotate(-5.0)],
    ),
    FilterProfile::new(
        "cinestill",
        "Cinestill",
        &[Saturate(1.2), Contrast(1.15), Brightness(1.05), HueRotate(5.0)],
    ),
    FilterProfile::new(
        "cross_process",
        "Cross Process",
        &[Saturate(1.4), Contrast(1.3), HueRotate(10.0)],
    ),
    FilterProfile::new(
        "bleach_bypass",
        "Bleach Bypass",
        &[Saturate(0.7), Contrast(1.4)],
    ),
    FilterProfile::new(
        "push_process",
        "Push Process",
        &[Contrast(1.3), Brightness(0.95), Saturate(1.1)],
    ),
    FilterProfile::new("velvia", "Velvia", &[Saturate(1.6), Contrast(1.2)]),
];

/// Look up a profile by identifier
pub fn find_profile(id: &str) -> Option<&'static FilterProfile> {
    CATALOG.iter().find(|p| p.id == id)
}

/// The identity profile
pub fn none() -> &'static FilterProfile {
    &CATALOG[0]
}
