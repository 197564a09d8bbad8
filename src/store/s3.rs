//! S3-backed [`ObjectStore`] implementation.
//!
//! Wraps the AWS SDK client: depaginated listings, single-call uploads with
//! content metadata, batched deletions, and streamed bundle downloads.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use tracing::info;

use super::metadata::ObjectMetadata;
use super::{ObjectStore, RemoteObject};
use crate::utils::errors::{Result, SyncError};

/// S3 caps DeleteObjects at 1000 keys per request.
pub const MAX_DELETE_BATCH_SIZE: usize = 1000;

pub struct S3Store {
    client: Client,
}

impl S3Store {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn list_objects(&self, bucket: &str) -> Result<Vec<RemoteObject>> {
        let mut objects = Vec::new();

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                SyncError::List(format!(
                    "ListObjectsV2 on '{bucket}' failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;
            for object in page.contents() {
                let Some(key) = object.key() else { continue };
                let last_modified = object
                    .last_modified()
                    .and_then(|ts| DateTime::from_timestamp(ts.secs(), ts.subsec_nanos()))
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
                objects.push(RemoteObject {
                    key: key.to_string(),
                    last_modified,
                });
            }
        }

        Ok(objects)
    }

    async fn upload_object(
        &self,
        bucket: &str,
        key: &str,
        source: &Path,
        metadata: &ObjectMetadata,
    ) -> Result<()> {
        let body = ByteStream::from_path(source).await.map_err(|e| {
            SyncError::Upload(format!("opening '{}' failed: {e}", source.display()))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .content_type(&metadata.content_type)
            .set_content_encoding(metadata.content_encoding.clone())
            .send()
            .await
            .map_err(|e| {
                SyncError::Upload(format!(
                    "PutObject '{bucket}/{key}' failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> Result<()> {
        let identifiers = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| SyncError::Delete(format!("building delete request failed: {e}")))?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| SyncError::Delete(format!("building delete request failed: {e}")))?;

        self.client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| {
                SyncError::Delete(format!(
                    "DeleteObjects on '{bucket}' failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn fetch_bundle(&self, bucket: &str, key: &str, dest: &Path) -> Result<()> {
        let mut output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                SyncError::Fetch(format!(
                    "GetObject '{bucket}/{key}' failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = output
            .body
            .try_next()
            .await
            .map_err(|e| SyncError::Fetch(format!("reading '{bucket}/{key}' failed: {e}")))?
        {
            written += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        info!(
            "Downloaded '{}/{}' -> {} ({} bytes)",
            bucket,
            key,
            dest.display(),
            written
        );
        Ok(())
    }
}
