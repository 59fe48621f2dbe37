// SPDX-License-Identifier: GPL-3.0-only

//! Upload of encoded photos with fixed-backoff retry
//!
//! ```text
//! encoded (30%) → blob ready (50%) → attempt 1 ─┐
//!                                   wait backoff ├─ … up to max_attempts
//!                                   attempt n ───┘→ uploaded (80%) → record saved (100%)
//! ```
//!
//! Retry is the only automatic recovery in the pipeline. Progress is
//! reported through a [`ProgressTracker`] which never goes backwards.

use crate::constants::{progress, upload};
use crate::errors::{PhotoError, PhotoResult};
use crate::storage::ObjectStorage;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How failed uploads are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts in total, including the first
    pub max_attempts: u32,
    /// Wait between consecutive attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: upload::MAX_ATTEMPTS,
            backoff: upload::BACKOFF,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

/// Storage key for a new photo: `<millis>_<prefix>-<millis>.jpg`
pub fn destination_path(prefix: &str, millis: i64) -> String {
    format!("{}_{}-{}.jpg", millis, prefix, millis)
}

/// Destination for a new photo stamped with the current time
pub fn destination_now(prefix: &str) -> String {
    destination_path(prefix, chrono::Utc::now().timestamp_millis())
}

type ProgressFn = Box<dyn FnMut(u8) + Send>;

/// Forwards progress percentages, dropping any that would go backwards
pub struct ProgressTracker {
    current: u8,
    callback: Option<ProgressFn>,
}

impl ProgressTracker {
    pub fn new(callback: impl FnMut(u8) + Send + 'static) -> Self {
        Self {
            current: 0,
            callback: Some(Box::new(callback)),
        }
    }

    /// Tracker without a listener
    pub fn silent() -> Self {
        Self {
            current: 0,
            callback: None,
        }
    }

    pub fn current(&self) -> u8 {
        self.current
    }

    /// Report a new percentage; ignored unless it moves forward
    pub fn report(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent <= self.current {
            return;
        }
        self.current = percent;
        if let Some(callback) = self.callback.as_mut() {
            callback(percent);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::silent()
    }
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("current", &self.current)
            .finish()
    }
}

/// One pending upload and its bookkeeping
#[derive(Debug)]
pub struct UploadTask {
    bytes: Vec<u8>,
    destination: String,
    attempts: u32,
    progress: ProgressTracker,
    result: Option<PhotoResult<String>>,
}

impl UploadTask {
    pub fn new(bytes: Vec<u8>, destination: impl Into<String>) -> Self {
        Self {
            bytes,
            destination: destination.into(),
            attempts: 0,
            progress: ProgressTracker::silent(),
            result: None,
        }
    }

    /// Attach a progress listener
    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn progress(&self) -> u8 {
        self.progress.current()
    }

    /// Terminal result, `None` until the manager resolves the task
    pub fn result(&self) -> Option<&PhotoResult<String>> {
        self.result.as_ref()
    }

    /// Mark the task complete once the photo record is confirmed
    pub fn finish(&mut self) {
        if matches!(self.result, Some(Ok(_))) {
            self.progress.report(progress::COMPLETE);
        }
    }
}

/// Sends encoded photos to object storage
#[derive(Clone)]
pub struct UploadManager {
    storage: Arc<dyn ObjectStorage>,
    policy: RetryPolicy,
}

impl UploadManager {
    pub fn new(storage: Arc<dyn ObjectStorage>, policy: RetryPolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn storage(&self) -> &Arc<dyn ObjectStorage> {
        &self.storage
    }

    /// Upload without progress reporting
    pub async fn upload(&self, bytes: Vec<u8>, destination: &str) -> PhotoResult<String> {
        let mut task = UploadTask::new(bytes, destination);
        self.run(&mut task).await
    }

    /// Drive a task through the retry loop
    ///
    /// Reports 30% and 50% before the first attempt and 80% once storage
    /// accepts the bytes. The 100% milestone belongs to the caller, see
    /// [`UploadTask::finish`].
    pub async fn run(&self, task: &mut UploadTask) -> PhotoResult<String> {
        task.progress.report(progress::ENCODED);
        task.progress.report(progress::BLOB_READY);

        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            task.attempts = attempt;
            debug!(
                attempt,
                max_attempts,
                destination = %task.destination,
                size = task.bytes.len(),
                "Uploading photo"
            );

            match self
                .storage
                .upload(&task.destination, &task.bytes, upload::CONTENT_TYPE)
                .await
            {
                Ok(url) => {
                    info!(attempt, url = %url, "Upload complete");
                    task.progress.report(progress::UPLOADED);
                    task.result = Some(Ok(url.clone()));
                    return Ok(url);
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "Upload attempt failed");
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.backoff).await;
                    }
                }
            }
        }

        let err = PhotoError::UploadFailedAfterRetries {
            attempts: task.attempts,
            last_error,
        };
        task.result = Some(Err(err.clone()));
        Err(err)
    }
}
