//! Custom error types for the sync engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Bundle error: {0}")]
    Bundle(String),

    #[error("Listing error: {0}")]
    List(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Delete error: {0}")]
    Delete(String),

    #[error("Sync cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, SyncError>;
