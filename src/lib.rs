// SPDX-License-Identifier: GPL-3.0-only

//! Filmcam - photo capture with film filters
//!
//! This library provides the capture, edit and upload pipeline behind the
//! `filmcam` command: grab a frame from a camera, adjust exposure, encode,
//! upload with retry and record it; later re-render it through a film filter.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`backends`]: Frame sources and camera stream lifecycle
//! - [`filters`]: Film filter catalog and per-pixel compositor
//! - [`media`]: Color space helpers
//! - [`pipelines`]: Capture and edit orchestration, encoding, upload, histogram
//! - [`storage`]: Object storage for encoded photos
//! - [`records`]: Photo records and user privacy preferences
//! - [`config`]: User configuration handling

pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filters;
pub mod media;
pub mod pipelines;
pub mod records;
pub mod storage;

// Re-export commonly used types
pub use backends::camera::types::{FacingMode, PixelBuffer};
pub use config::Config;
pub use errors::{AppError, AppResult, PhotoError, PhotoResult};
pub use filters::{FilterOp, FilterProfile};
pub use pipelines::photo::{
    CaptureDeps, CaptureOrchestrator, CaptureRequest, CaptureState, EditOrchestrator,
};
pub use records::{PhotoRecord, PrivacySettings, Visibility};
