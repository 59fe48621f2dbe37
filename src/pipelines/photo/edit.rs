// SPDX-License-Identifier: GPL-3.0-only

//! Re-render a stored photo through a film filter
//!
//! ```text
//! record → download → decode → filter → encode (0.95) → upload → update record
//! ```
//!
//! The existing record is only touched by the final update, so any failure
//! before it leaves the photo exactly as it was.

use super::encoding;
use super::upload::{ProgressTracker, UploadManager, UploadTask, destination_now};
use crate::backends::camera::types::PixelBuffer;
use crate::constants;
use crate::errors::{PhotoError, PhotoResult};
use crate::filters::{self, FilterProfile};
use crate::records::{PhotoRecord, PhotoRepository, PhotoUpdate};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Applies catalog filters to stored photos
#[derive(Clone)]
pub struct EditOrchestrator {
    uploads: UploadManager,
    records: Arc<dyn PhotoRepository>,
}

impl EditOrchestrator {
    pub fn new(uploads: UploadManager, records: Arc<dyn PhotoRepository>) -> Self {
        Self { uploads, records }
    }

    /// Apply `filter_id` to photo `photo_id` and store the result as a new image
    ///
    /// Unknown filters and photos are rejected before any download.
    pub async fn apply_filter(
        &self,
        photo_id: Uuid,
        filter_id: &str,
        progress: ProgressTracker,
    ) -> PhotoResult<PhotoRecord> {
        let profile = filters::find_profile(filter_id)
            .ok_or_else(|| PhotoError::UnknownFilter(filter_id.to_string()))?;

        let record = self
            .records
            .get(photo_id)
            .await
            .map_err(|e| PhotoError::EditFailed(format!("record lookup failed: {}", e)))?
            .ok_or_else(|| PhotoError::PhotoNotFound(photo_id.to_string()))?;

        info!(
            id = %photo_id,
            filter = profile.id,
            source = %record.image_url,
            "Editing photo"
        );

        let bytes = self
            .uploads
            .storage()
            .download(&record.image_url)
            .await
            .map_err(|e| PhotoError::EditFailed(format!("could not load original: {}", e)))?;

        let original = encoding::decode(bytes)
            .await
            .map_err(|e| PhotoError::EditFailed(e.to_string()))?;

        let filtered = render(original, profile).await?;
        let jpeg = encoding::encode(filtered, constants::quality::EDIT).await?;

        let mut task = UploadTask::new(jpeg, destination_now(constants::edit::FILE_PREFIX))
            .with_progress(progress);
        let url = self.uploads.run(&mut task).await?;

        let updated = self
            .records
            .update(photo_id, PhotoUpdate::edited(url, profile.id))
            .await
            .map_err(|e| {
                warn!(id = %photo_id, error = %e, "Edited image stored but record update failed");
                PhotoError::MetadataWriteFailed(e.to_string())
            })?;
        task.finish();

        info!(id = %photo_id, url = %updated.image_url, "Photo edited");
        Ok(updated)
    }
}

/// Run the filter chain on the blocking pool
async fn render(
    buffer: PixelBuffer,
    profile: &'static FilterProfile,
) -> PhotoResult<PixelBuffer> {
    tokio::task::spawn_blocking(move || filters::apply(buffer, profile))
        .await
        .map_err(|e| PhotoError::EditFailed(format!("Filter task error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipelines::photo::upload::RetryPolicy;
    use crate::records::{MemoryPhotoRepository, PrivacySettings};
    use crate::storage::{MemoryObjectStorage, ObjectStorage};

    async fn setup() -> (
        EditOrchestrator,
        Arc<MemoryObjectStorage>,
        Arc<MemoryPhotoRepository>,
        PhotoRecord,
    ) {
        let storage = Arc::new(MemoryObjectStorage::new());
        let records = Arc::new(MemoryPhotoRepository::new());

        let jpeg = encoding::encode(PixelBuffer::filled(32, 24, [200, 80, 40, 255]), 0.85)
            .await
            .unwrap();
        let url = storage.upload("1_photo-1.jpg", &jpeg, "image/jpeg").await.unwrap();
        let record = records
            .create(PhotoRecord::new_capture(url, &PrivacySettings::default()))
            .await
            .unwrap();

        let editor = EditOrchestrator::new(
            UploadManager::new(storage.clone(), RetryPolicy::default()),
            records.clone(),
        );
        (editor, storage, records, record)
    }

    #[tokio::test]
    async fn test_unknown_filter_is_rejected_before_io() {
        let (editor, storage, _, record) = setup().await;
        let calls = storage.upload_calls();

        let err = editor
            .apply_filter(record.id, "instagram", ProgressTracker::silent())
            .await
            .unwrap_err();
        assert_eq!(err, PhotoError::UnknownFilter("instagram".into()));
        assert_eq!(storage.upload_calls(), calls);
    }

    #[tokio::test]
    async fn test_unknown_photo_is_rejected() {
        let (editor, _, _, _) = setup().await;
        let err = editor
            .apply_filter(Uuid::new_v4(), "classic_bw", ProgressTracker::silent())
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoError::PhotoNotFound(_)));
    }

    #[tokio::test]
    async fn test_undecodable_original_leaves_record_untouched() {
        let (editor, storage, records, _) = setup().await;
        let url = storage.upload("broken.jpg", b"garbage", "image/jpeg").await.unwrap();
        let broken = records
            .create(PhotoRecord::new_capture(url, &PrivacySettings::default()))
            .await
            .unwrap();

        let err = editor
            .apply_filter(broken.id, "classic_bw", ProgressTracker::silent())
            .await
            .unwrap_err();

        assert!(matches!(err, PhotoError::EditFailed(_)));
        assert_eq!(records.get(broken.id).await.unwrap().unwrap(), broken);
    }

    #[tokio::test]
    async fn test_edit_stores_gray_image_under_new_url() {
        let (editor, storage, _, record) = setup().await;

        let updated = editor
            .apply_filter(record.id, "classic_bw", ProgressTracker::silent())
            .await
            .unwrap();

        assert!(updated.edited);
        assert_eq!(updated.filter_applied, "classic_bw");
        assert_ne!(updated.image_url, record.image_url);
        assert_eq!(updated.thumbnail_url, updated.image_url);
        assert!(updated.image_url.contains("edited-"));

        let bytes = storage.download(&updated.image_url).await.unwrap();
        let image = encoding::decode(bytes).await.unwrap();
        let [r, g, b, _] = image.pixel(5, 5).unwrap();
        assert!(r.abs_diff(g) <= 2 && g.abs_diff(b) <= 2);
    }
}
