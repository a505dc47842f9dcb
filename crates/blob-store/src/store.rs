//! Content-addressed blob store.

use std::path::Path;

use bytes::Bytes;
use cid::Cid;
use tracing::{debug, info};

use crate::content_id::{content_id, verify_content};
use crate::error::{BlobStoreError, Result};
use crate::storage::{ObjectStoreConfig, Storage};

/// A content-addressed blob store over an object storage backend.
///
/// Blobs are keyed by the text form of their CID. Writes are idempotent:
/// putting content that is already present skips the upload and returns the
/// same CID. Reads verify that the returned bytes still hash to the CID.
#[derive(Debug, Clone)]
pub struct BlobStore {
    storage: Storage,
}

impl BlobStore {
    /// Create a blob store over the configured backend.
    pub async fn new(config: ObjectStoreConfig) -> Result<Self> {
        let storage = config.open().await?;
        Ok(Self { storage })
    }

    /// Create a blob store rooted at a local directory.
    pub async fn new_local(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::new(ObjectStoreConfig::Local {
            path: data_dir.as_ref().to_path_buf(),
        })
        .await
    }

    /// Create a fully in-memory blob store. All data is lost on drop.
    pub async fn new_ephemeral() -> Result<Self> {
        Self::new(ObjectStoreConfig::Memory).await
    }

    /// Store data and return its content id.
    pub async fn put(&self, data: Bytes) -> Result<Cid> {
        let cid = content_id(&data);
        let key = cid.to_string();

        if self.storage.contains(&key).await? {
            debug!(cid = %key, "blob already present, skipping upload");
            return Ok(cid);
        }

        let size = data.len();
        debug!(cid = %key, size, "storing blob");
        self.storage.write(&key, data).await?;
        info!(cid = %key, size, "blob stored");

        Ok(cid)
    }

    /// Fetch the bytes addressed by `cid`.
    pub async fn get(&self, cid: &Cid) -> Result<Bytes> {
        let key = cid.to_string();
        let data = self
            .storage
            .read(&key)
            .await?
            .ok_or_else(|| BlobStoreError::NotFound(key.clone()))?;
        verify_content(cid, &data)?;
        Ok(data)
    }

    /// Check whether content is present without fetching it.
    pub async fn has(&self, cid: &Cid) -> Result<bool> {
        self.storage.contains(&cid.to_string()).await
    }

    /// List the content ids of every stored blob.
    pub async fn list(&self) -> Result<Vec<Cid>> {
        self.storage
            .keys()
            .await?
            .into_iter()
            .map(|key| {
                Cid::try_from(key.as_str()).map_err(|e| BlobStoreError::InvalidCid(e.to_string()))
            })
            .collect()
    }
}
