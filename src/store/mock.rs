//! Recording object store used by executor and orchestrator tests.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::metadata::ObjectMetadata;
use super::{ObjectStore, RemoteObject};
use crate::utils::errors::{Result, SyncError};

/// Instrumented in-memory store: records every call and can inject
/// failures, a listing fixture, a bundle fixture, and artificial latency.
#[derive(Default)]
pub struct MockStore {
    pub remote: Vec<RemoteObject>,
    pub bundle_fixture: Option<PathBuf>,
    pub fail_listing: bool,
    pub fail_upload_key: Option<String>,
    pub fail_all_uploads: bool,
    pub fail_delete_batch: Option<usize>,
    pub upload_delay: Option<Duration>,

    pub uploaded: Mutex<Vec<(String, ObjectMetadata)>>,
    pub delete_batches: Mutex<Vec<Vec<String>>>,
    pub upload_attempts: AtomicUsize,
    pub peak_uploads: AtomicUsize,
    pub active_uploads: AtomicUsize,
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn list_objects(&self, bucket: &str) -> Result<Vec<RemoteObject>> {
        if self.fail_listing {
            return Err(SyncError::List(format!(
                "injected listing failure for '{bucket}'"
            )));
        }
        Ok(self.remote.clone())
    }

    async fn upload_object(
        &self,
        _bucket: &str,
        key: &str,
        _source: &Path,
        metadata: &ObjectMetadata,
    ) -> Result<()> {
        self.upload_attempts.fetch_add(1, Ordering::SeqCst);
        let active = self.active_uploads.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_uploads.fetch_max(active, Ordering::SeqCst);

        if let Some(delay) = self.upload_delay {
            tokio::time::sleep(delay).await;
        }

        let result = if self.fail_all_uploads || self.fail_upload_key.as_deref() == Some(key) {
            Err(SyncError::Upload(format!(
                "injected upload failure for '{key}'"
            )))
        } else {
            self.uploaded
                .lock()
                .unwrap()
                .push((key.to_string(), metadata.clone()));
            Ok(())
        };

        self.active_uploads.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn delete_objects(&self, _bucket: &str, keys: &[String]) -> Result<()> {
        let mut batches = self.delete_batches.lock().unwrap();
        if self.fail_delete_batch == Some(batches.len()) {
            return Err(SyncError::Delete("injected batch failure".to_string()));
        }
        batches.push(keys.to_vec());
        Ok(())
    }

    async fn fetch_bundle(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let Some(fixture) = &self.bundle_fixture else {
            return Err(SyncError::Fetch(format!(
                "no bundle fixture for '{bucket}/{key}'"
            )));
        };
        std::fs::copy(fixture, dest)?;
        Ok(())
    }
}
