//! Reconciliation pass orchestration.
//!
//! [`SyncHandler`] sequences one pass: fetch the source bundle into a fresh
//! staging directory, extract it, list the target bucket, diff, then apply
//! uploads and deletions through the bounded executor. The staging directory
//! is reclaimed on every exit path, success or failure.

pub mod diff;
pub mod executor;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::bundle;
use crate::store::ObjectStore;
use crate::utils::errors::{Result, SyncError};
use executor::UploadItem;

/// Name of the bundle inside the staging directory.
const BUNDLE_FILE_NAME: &str = "bundle.zip";

/// Settings for one reconciliation pass.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub target_bucket: String,
    pub source_bucket: String,
    pub source_key: String,
    pub upload_concurrency: usize,
    pub delete_batch_size: usize,
    pub type_overrides: HashMap<String, String>,
}

/// Reconciliation pass result.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub uploaded: usize,
    pub deleted: usize,
    pub duration_secs: u64,
}

/// Runs reconciliation passes against one target bucket.
pub struct SyncHandler {
    store: Arc<dyn ObjectStore>,
    options: SyncOptions,
    cancel: CancellationToken,
}

impl SyncHandler {
    pub fn new(store: Arc<dyn ObjectStore>, options: SyncOptions) -> Self {
        Self::with_cancel(store, options, CancellationToken::new())
    }

    /// Create a handler whose pass can be cancelled externally.
    pub fn with_cancel(
        store: Arc<dyn ObjectStore>,
        options: SyncOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            store,
            options,
            cancel,
        }
    }

    /// Run one reconciliation pass.
    ///
    /// The pass is not atomic: a failure after uploads leaves old and new
    /// objects coexisting in the target until the next run converges.
    pub async fn sync_bucket(&self) -> Result<SyncReport> {
        let started = Instant::now();
        let mut report = SyncReport::default();

        // Fresh, exclusively-owned staging area; removed when dropped
        let staging = tempfile::Builder::new().prefix("bundle-sync").tempdir()?;
        let bundle_path = staging.path().join(BUNDLE_FILE_NAME);

        self.store
            .fetch_bundle(
                &self.options.source_bucket,
                &self.options.source_key,
                &bundle_path,
            )
            .await?;
        self.check_cancelled()?;

        let staging_root = staging.path().to_path_buf();
        let mut manifest =
            tokio::task::spawn_blocking(move || bundle::extract_bundle(&bundle_path, &staging_root))
                .await
                .map_err(|e| SyncError::Bundle(format!("extraction task failed: {e}")))??;

        info!("Extracted bundle: {} file(s)", manifest.len());
        self.check_cancelled()?;

        // Fail fast: nothing is mutated unless the listing succeeds
        let remote = self.store.list_objects(&self.options.target_bucket).await?;
        info!(
            "Target '{}' holds {} object(s)",
            self.options.target_bucket,
            remote.len()
        );

        let to_delete = diff::compute_diff(&mut manifest, &remote);
        let uploads: Vec<UploadItem> = manifest
            .files
            .keys()
            .map(|key| UploadItem {
                key: key.clone(),
                path: staging.path().join(key),
            })
            .collect();
        info!(
            "Reconciliation plan: {} upload(s), {} deletion(s)",
            uploads.len(),
            to_delete.len()
        );

        let overrides = Arc::new(self.options.type_overrides.clone());
        let outcome = executor::upload_files(
            Arc::clone(&self.store),
            &self.options.target_bucket,
            uploads,
            overrides,
            self.options.upload_concurrency,
            &self.cancel,
        )
        .await;
        report.uploaded = outcome.completed;
        if let Some(err) = outcome.error {
            warn!(
                "Upload phase failed after {} upload(s): {}",
                report.uploaded, err
            );
            return Err(err);
        }

        let outcome = executor::delete_objects(
            Arc::clone(&self.store),
            &self.options.target_bucket,
            to_delete,
            self.options.delete_batch_size,
            &self.cancel,
        )
        .await;
        report.deleted = outcome.completed;
        if let Some(err) = outcome.error {
            warn!(
                "Delete phase failed after {} deletion(s): {}",
                report.deleted, err
            );
            return Err(err);
        }

        report.duration_secs = started.elapsed().as_secs();
        info!(
            "Sync complete: {} uploaded, {} deleted in {}s",
            report.uploaded, report.deleted, report.duration_secs
        );
        Ok(report)
    }

    /// Delete every object in the target bucket through the batched delete
    /// path.
    pub async fn empty_bucket(&self) -> Result<SyncReport> {
        let started = Instant::now();
        let mut report = SyncReport::default();

        let remote = self.store.list_objects(&self.options.target_bucket).await?;
        let keys: Vec<String> = remote.into_iter().map(|object| object.key).collect();
        info!(
            "Emptying '{}': {} object(s)",
            self.options.target_bucket,
            keys.len()
        );

        let outcome = executor::delete_objects(
            Arc::clone(&self.store),
            &self.options.target_bucket,
            keys,
            self.options.delete_batch_size,
            &self.cancel,
        )
        .await;
        report.deleted = outcome.completed;
        if let Some(err) = outcome.error {
            warn!(
                "Delete phase failed after {} deletion(s): {}",
                report.deleted, err
            );
            return Err(err);
        }

        report.duration_secs = started.elapsed().as_secs();
        Ok(report)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }
}
