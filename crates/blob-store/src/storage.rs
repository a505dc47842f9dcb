//! Backend selection for the blob store.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};

use crate::error::{BlobStoreError, Result};

/// Every blob lives under this prefix, keyed by its CID text.
const BLOB_PREFIX: &str = "blobs";

const DEFAULT_S3_REGION: &str = "us-east-1";

/// Where sealed blobs are kept.
///
/// ```toml
/// [blob_store]
/// type = "s3"
/// endpoint = "http://localhost:9000"
/// access_key = "minio"
/// secret_key = "minio123"
/// bucket = "sealpoint"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreConfig {
    /// Process-local, lost on drop
    #[default]
    Memory,

    /// A directory on the local filesystem, created if missing
    Local { path: PathBuf },

    /// Any S3-compatible service. The bucket must already exist.
    S3 {
        endpoint: String,
        access_key: String,
        secret_key: String,
        bucket: String,
        /// Falls back to `us-east-1`
        region: Option<String>,
    },
}

impl ObjectStoreConfig {
    pub(crate) async fn open(&self) -> Result<Storage> {
        let backend = match self {
            ObjectStoreConfig::Memory => Arc::new(InMemory::new()) as Arc<dyn ObjectStore>,
            ObjectStoreConfig::Local { path } => open_local(path).await?,
            ObjectStoreConfig::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let store = AmazonS3Builder::new()
                    .with_endpoint(endpoint)
                    .with_access_key_id(access_key)
                    .with_secret_access_key(secret_key)
                    .with_bucket_name(bucket)
                    .with_region(region.as_deref().unwrap_or(DEFAULT_S3_REGION))
                    .with_allow_http(endpoint.starts_with("http://"))
                    .build()
                    .map_err(invalid_config)?;
                let store: Arc<dyn ObjectStore> = Arc::new(store);
                ensure_bucket(store.as_ref(), bucket).await?;
                store
            }
        };
        Ok(Storage { backend })
    }
}

async fn open_local(path: &Path) -> Result<Arc<dyn ObjectStore>> {
    tokio::fs::create_dir_all(path).await?;
    let fs = LocalFileSystem::new_with_prefix(path).map_err(invalid_config)?;
    Ok(Arc::new(fs))
}

/// Listing a missing bucket fails, so a single page is enough to tell.
async fn ensure_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<()> {
    let missing = || BlobStoreError::BucketNotFound(bucket.to_string());
    match store.list(None).try_next().await {
        Ok(_) => Ok(()),
        Err(object_store::Error::NotFound { .. }) => Err(missing()),
        Err(err) if err.to_string().contains("NoSuchBucket") => Err(missing()),
        Err(err) => Err(err.into()),
    }
}

fn invalid_config(err: object_store::Error) -> BlobStoreError {
    BlobStoreError::InvalidConfig(err.to_string())
}

/// Raw key/value access to the chosen backend.
#[derive(Debug, Clone)]
pub(crate) struct Storage {
    backend: Arc<dyn ObjectStore>,
}

impl Storage {
    fn location(key: &str) -> ObjectPath {
        ObjectPath::from_iter([BLOB_PREFIX, key])
    }

    pub async fn write(&self, key: &str, data: Bytes) -> Result<()> {
        self.backend.put(&Self::location(key), data.into()).await?;
        Ok(())
    }

    /// `None` when nothing is stored under `key`.
    pub async fn read(&self, key: &str) -> Result<Option<Bytes>> {
        let found = match self.backend.get(&Self::location(key)).await {
            Ok(found) => found,
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(found.bytes().await?))
    }

    pub async fn contains(&self, key: &str) -> Result<bool> {
        match self.backend.head(&Self::location(key)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        let prefix = ObjectPath::from(BLOB_PREFIX);
        let listed: Vec<_> = self.backend.list(Some(&prefix)).try_collect().await?;
        Ok(listed
            .into_iter()
            .filter_map(|meta| meta.location.filename().map(str::to_string))
            .collect())
    }
}
