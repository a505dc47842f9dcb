//! Content-addressed blob storage
//!
//! Blobs are addressed by a CIDv1 (`raw` codec, `sha2-256` multihash) computed
//! from their bytes, and persisted through a pluggable object storage backend
//! (S3/MinIO/local filesystem/memory).
//!
//! Identical content always yields the same [`Cid`], so publishing the same
//! bytes twice is a no-op and a published blob is immutable.
//!
//! # Example
//!
//! ```rust,no_run
//! use blob_store::{BlobStore, ObjectStoreConfig};
//!
//! # async fn example() -> Result<(), blob_store::BlobStoreError> {
//! let store = BlobStore::new(ObjectStoreConfig::Local {
//!     path: "/tmp/blobs".into(),
//! })
//! .await?;
//!
//! let cid = store.put(bytes::Bytes::from_static(b"ciphertext")).await?;
//! let data = store.get(&cid).await?;
//! assert_eq!(&data[..], b"ciphertext");
//! # Ok(())
//! # }
//! ```

mod content_id;
mod error;
mod storage;
mod store;

pub use cid::Cid;
pub use content_id::{content_id, verify_content, RAW_CODEC, SHA2_256_CODE};
pub use error::{BlobStoreError, Result};
pub use storage::ObjectStoreConfig;
pub use store::BlobStore;
