use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Size of a SHA-256 digest in bytes
pub const DIGEST_SIZE: usize = 32;

/// SHA-256 of a sealed blob, binding a registry record to exact off-chain bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntegrityDigest([u8; DIGEST_SIZE]);

impl From<[u8; DIGEST_SIZE]> for IntegrityDigest {
    fn from(bytes: [u8; DIGEST_SIZE]) -> Self {
        IntegrityDigest(bytes)
    }
}

impl std::fmt::Display for IntegrityDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl IntegrityDigest {
    /// Digest `data`.
    pub fn of(data: &[u8]) -> Self {
        IntegrityDigest(Sha256::digest(data).into())
    }

    /// Whether `data` hashes to this digest.
    pub fn verify(&self, data: &[u8]) -> bool {
        Self::of(data) == *self
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}
