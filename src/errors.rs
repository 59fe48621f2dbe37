// SPDX-License-Identifier: GPL-3.0-only

//! Error types for the photo pipeline

use crate::backends::camera::types::BackendError;
use crate::config::ConfigError;
use crate::storage::StorageError;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for pipeline operations
pub type PhotoResult<T> = Result<T, PhotoError>;

/// Top-level error used by the command-line front end
#[derive(Debug, Error)]
pub enum AppError {
    /// Capture or edit pipeline failure
    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    /// Storage or record store errors outside a pipeline run
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    /// Frame source errors outside a pipeline run
    #[error("Camera error: {0}")]
    Camera(#[from] BackendError),
    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

/// Capture and edit pipeline errors
///
/// I/O failures are classified here so callers can show a specific message.
/// Pixel-stage problems only show up as `InvalidBuffer`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhotoError {
    /// Camera device missing, not ready or unreadable
    #[error("camera unavailable: {0}")]
    SourceUnavailable(String),
    /// Buffer could not be encoded (empty or zero-sized)
    #[error("encoding failed: {0}")]
    EncodingFailed(String),
    /// Storage kept failing until the retry budget ran out
    #[error("upload failed after {attempts} attempts: {last_error}")]
    UploadFailedAfterRetries { attempts: u32, last_error: String },
    /// The image is stored but its record was rejected
    #[error("photo record write failed: {0}")]
    MetadataWriteFailed(String),
    /// Original image could not be loaded or decoded for editing
    #[error("edit failed: {0}")]
    EditFailed(String),
    /// Filter identifier not present in the catalog
    #[error("unknown filter profile: {0}")]
    UnknownFilter(String),
    /// No record with this id
    #[error("photo not found: {0}")]
    PhotoNotFound(String),
    /// A capture is already running on this orchestrator
    #[error("capture already in progress")]
    CaptureInProgress,
    /// The originating context was torn down before completion
    #[error("operation cancelled")]
    Cancelled,
    /// Pixel buffer does not satisfy `len == width * height * 4`
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(String),
}

impl PhotoError {
    /// Message shown to the user for this failure
    pub fn user_message(&self) -> &'static str {
        match self {
            PhotoError::SourceUnavailable(_) => {
                "Could not access camera. Please check permissions."
            }
            PhotoError::EncodingFailed(_) => "Could not process the photo. Please try again.",
            PhotoError::UploadFailedAfterRetries { .. } => {
                "Could not save photo after multiple attempts. Please try again."
            }
            PhotoError::MetadataWriteFailed(_) => {
                "Photo was uploaded but its details could not be saved."
            }
            PhotoError::EditFailed(_)
            | PhotoError::UnknownFilter(_)
            | PhotoError::PhotoNotFound(_) => "Could not apply edit.",
            PhotoError::CaptureInProgress => "A photo is already being captured.",
            PhotoError::Cancelled => "The operation was cancelled.",
            PhotoError::InvalidBuffer(_) => "Could not process the photo. Please try again.",
        }
    }
}

impl From<BackendError> for PhotoError {
    fn from(err: BackendError) -> Self {
        PhotoError::SourceUnavailable(err.to_string())
    }
}
