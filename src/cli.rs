// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for photo operations
//!
//! This module provides command-line functionality for:
//! - Capturing photos from an image file or test pattern
//! - Applying film filters to stored photos
//! - Inspecting histograms and filter previews
//! - Listing stored photos
//! - Showing and writing the configuration

use filmcam::backends::camera::FrameSource;
use filmcam::backends::virtual_camera::file_source::load_image_as_frame;
use filmcam::backends::virtual_camera::{StillImageSource, TestPatternSource};
use filmcam::constants::preview::THUMBNAIL_EDGE;
use filmcam::filters::{self, CATALOG};
use filmcam::pipelines::photo::histogram::{self, Histogram};
use filmcam::pipelines::photo::{ProgressTracker, UploadManager};
use filmcam::records::{JsonPhotoRepository, PhotoRepository, StaticPreferences};
use filmcam::storage::FsObjectStorage;
use filmcam::{
    AppError, AppResult, CaptureDeps, CaptureOrchestrator, CaptureRequest, Config,
    EditOrchestrator, FacingMode,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

/// Native size used when no source is given
const DEFAULT_PATTERN: (u32, u32) = (1920, 1080);

/// Parse `WIDTHxHEIGHT`
pub fn parse_dimensions(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("invalid width '{}'", w))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("invalid height '{}'", h))?;
    if w == 0 || h == 0 {
        return Err("dimensions must be non-zero".to_string());
    }
    Ok((w, h))
}

fn uploads(config: &Config) -> UploadManager {
    UploadManager::new(
        Arc::new(FsObjectStorage::new(&config.storage_root)),
        config.retry_policy(),
    )
}

fn records(config: &Config) -> Arc<JsonPhotoRepository> {
    Arc::new(JsonPhotoRepository::new(&config.records_file))
}

fn print_progress() -> ProgressTracker {
    ProgressTracker::new(|percent| println!("  {:>3}%", percent))
}

/// Capture one photo and record it
pub async fn capture(
    config: &Config,
    image: Option<PathBuf>,
    pattern: Option<(u32, u32)>,
    exposure: f64,
    facing: FacingMode,
) -> AppResult<()> {
    let source: Arc<dyn FrameSource> = match image {
        Some(path) => Arc::new(StillImageSource::new(path)?),
        None => {
            let (w, h) = pattern.unwrap_or(DEFAULT_PATTERN);
            Arc::new(TestPatternSource::new(w, h))
        }
    };
    println!("Using source: {}", source.name());

    let orchestrator = CaptureOrchestrator::new(CaptureDeps {
        source,
        uploads: uploads(config),
        records: records(config),
        preferences: Arc::new(StaticPreferences(config.privacy.clone())),
        bounds: config.capture_box(),
    });

    println!("Capturing...");
    let record = orchestrator
        .capture(CaptureRequest { exposure, facing }, print_progress())
        .await?;
    orchestrator.teardown();

    println!("Saved photo {}", record.id);
    println!("  Title:      {}", record.title);
    println!("  URL:        {}", record.image_url);
    println!("  Visibility: {}", record.visibility);
    Ok(())
}

/// Apply a catalog filter to a stored photo
pub async fn edit(config: &Config, photo_id: Uuid, filter: &str) -> AppResult<()> {
    let editor = EditOrchestrator::new(uploads(config), records(config));

    println!("Applying '{}'...", filter);
    let record = editor.apply_filter(photo_id, filter, print_progress()).await?;

    println!("Edited photo {}", record.id);
    println!("  Filter: {}", record.filter_applied);
    println!("  URL:    {}", record.image_url);
    Ok(())
}

/// Print the histogram of a local image or stored photo
pub async fn histogram(config: &Config, source: &str, json: bool) -> AppResult<()> {
    let histogram = if source.contains("://") {
        let storage = FsObjectStorage::new(&config.storage_root);
        histogram::analyze_url(&storage, source).await?
    } else {
        let frame = load_image_as_frame(Path::new(source)).await?;
        histogram::analyze(&frame)
    };

    if json {
        let text = serde_json::to_string(&histogram)
            .map_err(|e| AppError::Other(format!("JSON encoding failed: {}", e)))?;
        println!("{}", text);
    } else {
        print_histogram_summary(&histogram);
    }
    Ok(())
}

fn print_histogram_summary(histogram: &Histogram) {
    let describe = |name: &str, bins: &[u32]| {
        let total: u64 = bins.iter().map(|&c| c as u64).sum();
        let mean = if total == 0 {
            0.0
        } else {
            bins.iter()
                .enumerate()
                .map(|(value, &count)| value as f64 * count as f64)
                .sum::<f64>()
                / total as f64
        };
        println!("  {:<5} mean {:>6.1}  pixels {}", name, mean, total);
    };

    println!("Histogram (max bin {}):", histogram.max);
    describe("red", &histogram.red);
    describe("green", &histogram.green);
    describe("blue", &histogram.blue);
}

/// List the filter catalog
pub fn list_filters() {
    println!("Available filters:");
    println!();
    for profile in CATALOG {
        println!("  {:<14} {:<20} {}", profile.id, profile.label, profile.chain());
    }
}

/// Render the preview strip for an image into a directory
pub async fn previews(path: &Path, output: &Path) -> AppResult<()> {
    let frame = load_image_as_frame(path).await?;
    tokio::fs::create_dir_all(output).await?;

    let output = output.to_path_buf();
    let written = tokio::task::spawn_blocking(move || -> AppResult<usize> {
        let previews = filters::render_previews(&frame, THUMBNAIL_EDGE)?;
        for preview in &previews {
            let target = output.join(format!("{}.png", preview.profile.id));
            preview
                .thumbnail
                .clone()
                .into_rgba_image()?
                .save(&target)
                .map_err(|e| AppError::Other(format!("{}: {}", target.display(), e)))?;
        }
        Ok(previews.len())
    })
    .await
    .map_err(|e| AppError::Other(format!("Preview task error: {}", e)))??;

    println!("Wrote {} previews", written);
    Ok(())
}

/// List stored photos, newest first
pub async fn list_photos(config: &Config) -> AppResult<()> {
    let photos = records(config).list().await?;

    if photos.is_empty() {
        println!("No photos found.");
        return Ok(());
    }

    println!("Stored photos:");
    println!();
    for photo in photos {
        println!("  {} {}", photo.id, photo.title);
        println!(
            "      filter: {}  edited: {}  visibility: {}",
            photo.filter_applied, photo.edited, photo.visibility
        );
        println!("      {}", photo.image_url);
    }
    Ok(())
}

/// Print the effective configuration, optionally saving it
pub fn show_config(config: &Config, path: Option<&Path>, write: bool) -> AppResult<()> {
    let text = serde_json::to_string_pretty(config)
        .map_err(|e| AppError::Other(format!("JSON encoding failed: {}", e)))?;
    println!("{}", text);

    if write {
        match path {
            Some(path) => config.save_to(path)?,
            None => config.save()?,
        }
        println!("Configuration written");
    }
    Ok(())
}
