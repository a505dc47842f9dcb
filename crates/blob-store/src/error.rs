//! Error types for the blob store.

use std::path::PathBuf;

/// Errors that can occur when working with the blob store.
#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    /// Object storage error
    #[error("object storage error: {0}")]
    ObjectStore(#[from] object_store::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content identifier could not be built or parsed
    #[error("invalid content id: {0}")]
    InvalidCid(String),

    /// Blob not found
    #[error("blob not found: {0}")]
    NotFound(String),

    /// Stored bytes no longer hash to the requested content id
    #[error("blob {0} failed content verification")]
    IntegrityMismatch(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Path error
    #[error("path error: {0}")]
    Path(PathBuf),

    /// S3 bucket not found - must be created before use
    #[error("S3 bucket '{0}' does not exist. Create it before publishing.")]
    BucketNotFound(String),
}

impl BlobStoreError {
    /// Whether retrying the same operation could plausibly succeed.
    ///
    /// Network and backend hiccups are transient; configuration problems,
    /// missing content and corrupted content are not.
    pub fn is_transient(&self) -> bool {
        match self {
            BlobStoreError::ObjectStore(err) => !matches!(
                err,
                object_store::Error::NotFound { .. }
                    | object_store::Error::InvalidPath { .. }
                    | object_store::Error::NotSupported { .. }
                    | object_store::Error::NotImplemented
                    | object_store::Error::UnknownConfigurationKey { .. }
            ),
            BlobStoreError::Io(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for blob store operations.
pub type Result<T> = std::result::Result<T, BlobStoreError>;
