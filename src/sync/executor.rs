//! Bounded-concurrency application of upload and delete sets.
//!
//! Uploads fan out one task per file behind a counting semaphore; deletions
//! run as sequential capped batches. Both phases stop admitting work after
//! the first failure or an external cancellation, and let already-dispatched
//! operations drain before reporting.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::store::metadata::resolve_object_metadata;
use crate::store::ObjectStore;
use crate::utils::errors::SyncError;

/// A single pending upload: target key plus the staged file backing it.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub key: String,
    pub path: PathBuf,
}

/// What a phase accomplished before finishing or failing.
#[derive(Debug)]
pub struct PhaseOutcome {
    pub completed: usize,
    pub error: Option<SyncError>,
}

/// Upload every item, keeping at most `concurrency` operations in flight.
///
/// The first failed upload stops admission of new operations; already
/// admitted uploads finish on their own terms and secondary failures are
/// logged and discarded.
pub async fn upload_files(
    store: Arc<dyn ObjectStore>,
    bucket: &str,
    items: Vec<UploadItem>,
    overrides: Arc<HashMap<String, String>>,
    concurrency: usize,
    cancel: &CancellationToken,
) -> PhaseOutcome {
    info!("Uploading {} file(s) -> '{}'", items.len(), bucket);

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    // Trips on the first failed upload so nothing new is admitted
    let failed = CancellationToken::new();
    let first_error: Arc<Mutex<Option<SyncError>>> = Arc::new(Mutex::new(None));
    let completed = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::with_capacity(items.len());

    for item in items {
        let store = Arc::clone(&store);
        let bucket = bucket.to_string();
        let overrides = Arc::clone(&overrides);
        let semaphore = Arc::clone(&semaphore);
        let failed = failed.clone();
        let first_error = Arc::clone(&first_error);
        let completed = Arc::clone(&completed);
        let cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            // Admission: a slot must free up before the operation starts,
            // and a cancelled or failed pass admits nothing new
            let _permit = tokio::select! {
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
                _ = cancel.cancelled() => return,
                _ = failed.cancelled() => return,
            };
            if cancel.is_cancelled() || failed.is_cancelled() {
                return;
            }

            let metadata = resolve_object_metadata(&item.key, &overrides);
            match store
                .upload_object(&bucket, &item.key, &item.path, &metadata)
                .await
            {
                Ok(()) => {
                    completed.fetch_add(1, Ordering::Relaxed);
                    info!("Uploaded {} ({})", item.key, metadata.describe());
                }
                Err(err) => {
                    let mut slot = first_error.lock().await;
                    if slot.is_none() {
                        *slot = Some(err);
                        failed.cancel();
                    } else {
                        warn!("Secondary upload failure for '{}': {}", item.key, err);
                    }
                }
            }
        }));
    }

    // Graceful drain: every dispatched task finishes or bails on its own
    for handle in handles {
        if let Err(err) = handle.await {
            warn!("Upload task panicked: {}", err);
        }
    }

    let error = first_error.lock().await.take();
    finish(completed.load(Ordering::Relaxed), error, cancel)
}

/// Delete keys in batches of at most `batch_size`, issued sequentially.
///
/// Any batch failure is fatal for the phase; batches already applied stay
/// deleted and the next run re-converges.
pub async fn delete_objects(
    store: Arc<dyn ObjectStore>,
    bucket: &str,
    keys: Vec<String>,
    batch_size: usize,
    cancel: &CancellationToken,
) -> PhaseOutcome {
    info!("Deleting {} object(s) from '{}'", keys.len(), bucket);

    let mut completed = 0usize;
    for batch in keys.chunks(batch_size.max(1)) {
        if cancel.is_cancelled() {
            return finish(completed, None, cancel);
        }
        if let Err(err) = store.delete_objects(bucket, batch).await {
            return finish(completed, Some(err), cancel);
        }
        completed += batch.len();
        info!("Deleted batch of {} object(s)", batch.len());
    }

    finish(completed, None, cancel)
}

/// A cancelled pass terminates as cancelled even when in-flight work failed
/// after the signal; those failures are side effects of the abort.
fn finish(completed: usize, error: Option<SyncError>, cancel: &CancellationToken) -> PhaseOutcome {
    let error = if cancel.is_cancelled() {
        Some(SyncError::Cancelled)
    } else {
        error
    };
    PhaseOutcome { completed, error }
}
