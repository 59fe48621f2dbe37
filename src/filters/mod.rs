// SPDX-License-Identifier: GPL-3.0-only

//! Film filter compositor
//!
//! A [`FilterProfile`] is an ordered chain of [`FilterOp`]s written in the
//! CSS filter syntax, e.g. `sepia(0.3) contrast(1.1) hue-rotate(-5deg)`.
//! [`apply`] runs the chain over every pixel of a [`PixelBuffer`]:
//!
//! - channels are normalized to 0.0..=1.0 once per pixel
//! - each operation clamps its output before the next one runs
//! - the result is quantized back to 8 bits once, rounding to nearest
//! - alpha is carried through untouched
//!
//! The identity profile returns its input byte-for-byte.

pub mod catalog;
pub mod kernels;

pub use catalog::{CATALOG, NONE_ID, find_profile};

use crate::backends::camera::types::{BYTES_PER_PIXEL, PixelBuffer};
use crate::errors::PhotoResult;
use crate::media::color::{from_unit, to_unit};
use crate::pipelines::photo::processing;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// A single parametrized transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    /// Blend toward sepia, 0..=1
    Sepia(f32),
    /// Saturation multiplier, 1 = unchanged
    Saturate(f32),
    /// Contrast around mid-gray, 1 = unchanged
    Contrast(f32),
    /// Linear brightness multiplier, 1 = unchanged
    Brightness(f32),
    /// Hue rotation in degrees
    HueRotate(f32),
    /// Blend toward luminance, 0..=1
    Grayscale(f32),
}

impl FilterOp {
    /// CSS function name
    pub fn name(&self) -> &'static str {
        match self {
            FilterOp::Sepia(_) => "sepia",
            FilterOp::Saturate(_) => "saturate",
            FilterOp::Contrast(_) => "contrast",
            FilterOp::Brightness(_) => "brightness",
            FilterOp::HueRotate(_) => "hue-rotate",
            FilterOp::Grayscale(_) => "grayscale",
        }
    }

    #[inline]
    fn apply_rgb(&self, rgb: kernels::Rgb) -> kernels::Rgb {
        match *self {
            FilterOp::Sepia(a) => kernels::sepia(rgb, a),
            FilterOp::Saturate(s) => kernels::saturate(rgb, s),
            FilterOp::Contrast(c) => kernels::contrast(rgb, c),
            FilterOp::Brightness(b) => kernels::brightness(rgb, b),
            FilterOp::HueRotate(deg) => kernels::hue_rotate(rgb, deg),
            FilterOp::Grayscale(a) => kernels::grayscale(rgb, a),
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FilterOp::HueRotate(deg) => write!(f, "hue-rotate({}deg)", deg),
            FilterOp::Sepia(v)
            | FilterOp::Saturate(v)
            | FilterOp::Contrast(v)
            | FilterOp::Brightness(v)
            | FilterOp::Grayscale(v) => write!(f, "{}({})", self.name(), v),
        }
    }
}

/// Errors from parsing filter text
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterParseError {
    #[error("malformed filter operation: {0}")]
    Malformed(String),

    #[error("unknown filter operation: {0}")]
    UnknownOperation(String),

    #[error("invalid argument for {op}: {value}")]
    InvalidArgument { op: String, value: String },
}

impl FromStr for FilterOp {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, rest) = s
            .split_once('(')
            .ok_or_else(|| FilterParseError::Malformed(s.to_string()))?;
        let arg = rest
            .strip_suffix(')')
            .ok_or_else(|| FilterParseError::Malformed(s.to_string()))?
            .trim();

        let number = |text: &str| {
            text.trim()
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| FilterParseError::InvalidArgument {
                    op: name.to_string(),
                    value: arg.to_string(),
                })
        };

        match name.trim() {
            "sepia" => Ok(FilterOp::Sepia(number(arg)?)),
            "saturate" => Ok(FilterOp::Saturate(number(arg)?)),
            "contrast" => Ok(FilterOp::Contrast(number(arg)?)),
            "brightness" => Ok(FilterOp::Brightness(number(arg)?)),
            "grayscale" => Ok(FilterOp::Grayscale(number(arg)?)),
            "hue-rotate" => {
                let degrees = arg.strip_suffix("deg").unwrap_or(arg);
                Ok(FilterOp::HueRotate(number(degrees)?))
            }
            other => Err(FilterParseError::UnknownOperation(other.to_string())),
        }
    }
}

/// Parse a whitespace-separated chain such as `sepia(0.3) contrast(1.1)`
///
/// Empty text and `none` both yield an empty chain.
pub fn parse_chain(text: &str) -> Result<Vec<FilterOp>, FilterParseError> {
    let text = text.trim();
    if text.is_empty() || text == "none" {
        return Ok(Vec::new());
    }
    text.split_whitespace().map(str::parse).collect()
}

/// Named, immutable filter chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterProfile {
    pub id: &'static str,
    pub label: &'static str,
    pub ops: &'static [FilterOp],
}

impl FilterProfile {
    pub const fn new(id: &'static str, label: &'static str, ops: &'static [FilterOp]) -> Self {
        Self { id, label, ops }
    }

    pub fn is_identity(&self) -> bool {
        self.ops.is_empty()
    }

    /// Chain in CSS filter text form, `none` for the identity
    pub fn chain(&self) -> String {
        if self.ops.is_empty() {
            return "none".to_string();
        }
        self.ops
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Run a chain of operations over a buffer
///
/// Takes ownership and writes in place. An empty chain returns the buffer
/// untouched.
pub fn apply_ops(mut buffer: PixelBuffer, ops: &[FilterOp]) -> PixelBuffer {
    if ops.is_empty() {
        return buffer;
    }

    for px in buffer.as_bytes_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
        let mut rgb = [to_unit(px[0]), to_unit(px[1]), to_unit(px[2])];
        for op in ops {
            rgb = op.apply_rgb(rgb);
        }
        px[0] = from_unit(rgb[0]);
        px[1] = from_unit(rgb[1]);
        px[2] = from_unit(rgb[2]);
    }

    buffer
}

/// Apply a catalog profile to a buffer
pub fn apply(buffer: PixelBuffer, profile: &FilterProfile) -> PixelBuffer {
    debug!(
        filter = profile.id,
        width = buffer.width(),
        height = buffer.height(),
        "Applying filter"
    );
    apply_ops(buffer, profile.ops)
}

/// One rendered entry of the preview strip
#[derive(Debug, Clone)]
pub struct FilterPreview {
    pub profile: &'static FilterProfile,
    pub thumbnail: PixelBuffer,
}

/// Render every catalog profile onto a thumbnail of `source`
///
/// The source is downscaled once to fit an `edge`×`edge` box, then each
/// profile is applied to a copy. Order follows the catalog.
pub fn render_previews(source: &PixelBuffer, edge: u32) -> PhotoResult<Vec<FilterPreview>> {
    let thumbnail = processing::resize(source.clone(), edge, edge)?;
    Ok(CATALOG
        .iter()
        .map(|profile| FilterPreview {
            profile,
            thumbnail: apply(thumbnail.clone(), profile),
        })
        .collect())
}
