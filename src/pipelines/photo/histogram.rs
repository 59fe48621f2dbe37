// SPDX-License-Identifier: GPL-3.0-only

//! RGB histogram of a photo
//!
//! Counts are per channel with 256 bins. Alpha is ignored. The histogram
//! is derived on demand and never persisted.

use super::encoding;
use crate::backends::camera::types::{BYTES_PER_PIXEL, PixelBuffer};
use crate::constants::histogram::BINS;
use crate::errors::{PhotoError, PhotoResult};
use crate::storage::ObjectStorage;
use serde::{Serialize, Serializer};
use tracing::debug;

/// Color channel selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

/// Per-channel pixel counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Histogram {
    #[serde(serialize_with = "as_slice")]
    pub red: [u32; BINS],
    #[serde(serialize_with = "as_slice")]
    pub green: [u32; BINS],
    #[serde(serialize_with = "as_slice")]
    pub blue: [u32; BINS],
    /// Largest count across all three channels
    pub max: u32,
}

fn as_slice<S: Serializer>(bins: &[u32; BINS], serializer: S) -> Result<S::Ok, S::Error> {
    bins.as_slice().serialize(serializer)
}

impl Default for Histogram {
    fn default() -> Self {
        Self {
            red: [0; BINS],
            green: [0; BINS],
            blue: [0; BINS],
            max: 0,
        }
    }
}

impl Histogram {
    pub fn channel(&self, channel: Channel) -> &[u32; BINS] {
        match channel {
            Channel::Red => &self.red,
            Channel::Green => &self.green,
            Channel::Blue => &self.blue,
        }
    }

    /// Polyline for drawing one channel into a `width`×`height` box
    ///
    /// Point `i` sits at `x = i / 256 * width` and
    /// `y = height - count / max * height`. An empty histogram yields a flat
    /// line along the bottom edge.
    pub fn curve(&self, channel: Channel, width: f32, height: f32) -> Vec<(f32, f32)> {
        let bins = self.channel(channel);
        bins.iter()
            .enumerate()
            .map(|(i, &count)| {
                let x = i as f32 / BINS as f32 * width;
                let y = if self.max == 0 {
                    height
                } else {
                    height - count as f32 / self.max as f32 * height
                };
                (x, y)
            })
            .collect()
    }
}

/// Count channel values over every pixel
pub fn analyze(buffer: &PixelBuffer) -> Histogram {
    let mut histogram = Histogram::default();

    for px in buffer.as_bytes().chunks_exact(BYTES_PER_PIXEL) {
        histogram.red[px[0] as usize] += 1;
        histogram.green[px[1] as usize] += 1;
        histogram.blue[px[2] as usize] += 1;
    }

    histogram.max = histogram
        .red
        .iter()
        .chain(histogram.green.iter())
        .chain(histogram.blue.iter())
        .copied()
        .max()
        .unwrap_or(0);

    histogram
}

/// Analyze a stored photo without touching its record
pub async fn analyze_url(storage: &dyn ObjectStorage, url: &str) -> PhotoResult<Histogram> {
    let bytes = storage
        .download(url)
        .await
        .map_err(|e| PhotoError::PhotoNotFound(format!("{}: {}", url, e)))?;
    let buffer = encoding::decode(bytes).await?;

    debug!(
        url,
        width = buffer.width(),
        height = buffer.height(),
        "Computing histogram"
    );

    tokio::task::spawn_blocking(move || analyze(&buffer))
        .await
        .map_err(|e| PhotoError::InvalidBuffer(format!("Histogram task error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryObjectStorage;

    #[test]
    fn test_all_black_buffer() {
        let buffer = PixelBuffer::filled(10, 10, [0, 0, 0, 255]);
        let histogram = analyze(&buffer);
        assert_eq!(histogram.red[0], 100);
        assert_eq!(histogram.green[0], 100);
        assert_eq!(histogram.blue[0], 100);
        for bins in [&histogram.red, &histogram.green, &histogram.blue] {
            assert_eq!(bins[1..].iter().sum::<u32>(), 0);
        }
        assert_eq!(histogram.max, 100);
    }

    #[test]
    fn test_empty_buffer_is_all_zero() {
        let histogram = analyze(&PixelBuffer::empty());
        assert_eq!(histogram, Histogram::default());
    }

    #[test]
    fn test_curve_scaling_and_flat_baseline() {
        let buffer = PixelBuffer::new(2, 1, vec![0, 10, 20, 255, 255, 10, 20, 255]).unwrap();
        let histogram = analyze(&buffer);
        assert_eq!(histogram.max, 2);

        let red = histogram.curve(Channel::Red, 256.0, 100.0);
        assert_eq!(red.len(), 256);
        assert_eq!(red[0], (0.0, 50.0));
        assert_eq!(red[255], (255.0, 50.0));
        assert_eq!(histogram.curve(Channel::Green, 256.0, 100.0)[10], (10.0, 0.0));

        let flat = Histogram::default().curve(Channel::Blue, 256.0, 80.0);
        assert!(flat.iter().all(|&(_, y)| y == 80.0));
    }

    #[tokio::test]
    async fn test_analyze_url_reads_stored_photo() {
        let storage = MemoryObjectStorage::new();
        let jpeg = encoding::encode(PixelBuffer::filled(16, 16, [0, 0, 0, 255]), 0.95)
            .await
            .unwrap();
        let url = storage.upload("h.jpg", &jpeg, "image/jpeg").await.unwrap();

        let histogram = analyze_url(&storage, &url).await.unwrap();
        assert_eq!(histogram.max, 256);

        assert!(analyze_url(&storage, "memory://missing.jpg").await.is_err());
    }
}
