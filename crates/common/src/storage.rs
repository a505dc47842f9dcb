use async_trait::async_trait;
use blob_store::{BlobStore, BlobStoreError};
use bytes::Bytes;

use crate::linked_data::LocationHandle;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The storage network could not be reached or did not answer in time
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("blob not found: {0}")]
    NotFound(LocationHandle),
    #[error("blob {0} failed content verification")]
    IntegrityMismatch(LocationHandle),
    #[error("blob store error: {0}")]
    Backend(#[from] BlobStoreError),
}

impl StorageError {
    /// Whether the same request may succeed if repeated.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Unavailable(_) => true,
            StorageError::Backend(err) => err.is_transient(),
            StorageError::NotFound(_) | StorageError::IntegrityMismatch(_) => false,
        }
    }
}

/// Content-addressed storage for sealed blobs
///
/// Implementations must be idempotent: publishing the same bytes again returns
/// the same handle and has no further effect. A handle returned from
/// `publish` must be durably retrievable.
#[async_trait]
pub trait BlobStorage: Send + Sync + std::fmt::Debug + 'static {
    /// Store `blob` and return its content-derived handle
    async fn publish(&self, blob: Bytes) -> Result<LocationHandle, StorageError>;

    /// Retrieve the exact bytes published under `handle`
    async fn fetch(&self, handle: &LocationHandle) -> Result<Bytes, StorageError>;
}

#[async_trait]
impl BlobStorage for BlobStore {
    async fn publish(&self, blob: Bytes) -> Result<LocationHandle, StorageError> {
        Ok(self.put(blob).await?.into())
    }

    async fn fetch(&self, handle: &LocationHandle) -> Result<Bytes, StorageError> {
        self.get(handle.cid()).await.map_err(|err| match err {
            BlobStoreError::NotFound(_) => StorageError::NotFound(*handle),
            BlobStoreError::IntegrityMismatch(_) => StorageError::IntegrityMismatch(*handle),
            other => StorageError::Backend(other),
        })
    }
}
