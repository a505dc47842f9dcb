use cid::Cid;
use multihash::Multihash;
use sha2::{Digest, Sha256};

use crate::error::{BlobStoreError, Result};

/// Multicodec code for raw binary content
pub const RAW_CODEC: u64 = 0x55;
/// Multihash code for sha2-256
pub const SHA2_256_CODE: u64 = 0x12;

/// Compute the CIDv1 (raw, sha2-256) of a byte slice.
pub fn content_id(data: &[u8]) -> Cid {
    let digest = Sha256::digest(data);
    // a 32 byte digest always fits the 64 byte multihash allocation
    let hash = Multihash::<64>::wrap(SHA2_256_CODE, &digest)
        .expect("sha2-256 digest fits in a 64 byte multihash");
    Cid::new_v1(RAW_CODEC, hash)
}

/// Check that `data` is the content addressed by `cid`.
///
/// Only raw sha2-256 CIDs are understood; anything else is rejected rather
/// than silently accepted.
pub fn verify_content(cid: &Cid, data: &[u8]) -> Result<()> {
    if cid.codec() != RAW_CODEC || cid.hash().code() != SHA2_256_CODE {
        return Err(BlobStoreError::InvalidCid(format!(
            "unsupported codec {:#x} / hash {:#x}",
            cid.codec(),
            cid.hash().code()
        )));
    }
    if content_id(data) != *cid {
        return Err(BlobStoreError::IntegrityMismatch(cid.to_string()));
    }
    Ok(())
}
