//! Bundle Sync Library
//!
//! Reconciles a remote S3 bucket against the contents of a versioned
//! archive bundle: stale objects are deleted, changed and new files are
//! uploaded, unchanged objects are left alone.

pub mod bundle;
pub mod config;
pub mod shutdown;
pub mod store;
pub mod sync;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use utils::errors::SyncError;
pub type Result<T> = std::result::Result<T, SyncError>;
