//! Object store capability interface.
//!
//! The reconciliation engine talks to the remote store exclusively through
//! [`ObjectStore`], keeping transport concerns (pagination, multi-part
//! transfer, credentials) out of the engine itself.

pub mod metadata;
#[cfg(test)]
pub mod mock;
pub mod s3;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::utils::errors::Result;
use metadata::ObjectMetadata;

/// One object in the remote listing, as reported by the store.
#[derive(Debug, Clone)]
pub struct RemoteObject {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Enumerate every object in `bucket`, transparently depaginating.
    async fn list_objects(&self, bucket: &str) -> Result<Vec<RemoteObject>>;

    /// Upload the file at `source` under `key`.
    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
    ) -> Result<()>;

    /// Delete one batch of keys. Callers keep the batch within the store's
    /// per-request ceiling.
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<()>;

    /// Download the bundle object to `dest`.
    async fn fetch_bundle(&self, bucket: &str, key: &str, dest: &Path) -> Result<()>;
}
