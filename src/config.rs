//! Configuration management for bundle-sync.
//!
//! Loads configuration from a TOML file; CLI flags override file values.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::store::s3::MAX_DELETE_BATCH_SIZE;
use crate::utils::errors::SyncError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub buckets: BucketConfig,

    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub content_types: ContentTypeConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BucketConfig {
    /// Bucket being reconciled to match the bundle
    #[serde(default)]
    pub target: String,

    /// Bucket holding the source bundle
    #[serde(default)]
    pub source: String,

    /// Object key of the source bundle
    #[serde(default)]
    pub source_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Maximum concurrent upload operations
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    /// Maximum keys per delete request
    #[serde(default = "default_delete_batch_size")]
    pub delete_batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentTypeConfig {
    /// Extension suffix -> content type, consulted before the standard table
    #[serde(default = "default_overrides")]
    pub overrides: HashMap<String, String>,
}

// Default values
fn default_upload_concurrency() -> usize {
    8
}

fn default_delete_batch_size() -> usize {
    MAX_DELETE_BATCH_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_overrides() -> HashMap<String, String> {
    HashMap::from([(".map".to_string(), "application/json".to_string())])
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: default_upload_concurrency(),
            delete_batch_size: default_delete_batch_size(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ContentTypeConfig {
    fn default() -> Self {
        Self {
            overrides: default_overrides(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Check that the buckets needed by the requested operation are set.
    pub fn validate(&self, needs_source: bool) -> crate::Result<()> {
        if self.buckets.target.is_empty() {
            return Err(SyncError::Config("target bucket is not set".to_string()));
        }
        if needs_source && (self.buckets.source.is_empty() || self.buckets.source_key.is_empty()) {
            return Err(SyncError::Config(
                "source bucket and source key are not set".to_string(),
            ));
        }
        if self.transfer.upload_concurrency == 0 {
            return Err(SyncError::Config(
                "upload concurrency must be at least 1".to_string(),
            ));
        }
        if self.transfer.delete_batch_size == 0
            || self.transfer.delete_batch_size > MAX_DELETE_BATCH_SIZE
        {
            return Err(SyncError::Config(format!(
                "delete batch size must be between 1 and {MAX_DELETE_BATCH_SIZE}"
            )));
        }
        Ok(())
    }
}
