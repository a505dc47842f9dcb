use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::{IntegrityDigest, PublicKey, DIGEST_SIZE, PUBLIC_KEY_SIZE};

/// Longest uri a record may hold, in bytes
pub const MAX_URI_LEN: usize = 256;

const DISCRIMINATOR_SIZE: usize = 8;
const HEADER_SIZE: usize = DISCRIMINATOR_SIZE + PUBLIC_KEY_SIZE + DIGEST_SIZE + 4;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("record data truncated at {0} bytes")]
    Truncated(usize),
    #[error("account discriminator does not match a user record")]
    BadDiscriminator,
    #[error("record owner is not a valid public key")]
    BadOwner,
    #[error("record uri is not valid utf-8")]
    Utf8,
    #[error("{0} trailing bytes after record")]
    TrailingBytes(usize),
}

/// First eight bytes of every serialized record
pub fn discriminator() -> [u8; DISCRIMINATOR_SIZE] {
    let hash = Sha256::digest(b"account:UserRecord");
    let mut out = [0u8; DISCRIMINATOR_SIZE];
    out.copy_from_slice(&hash[..DISCRIMINATOR_SIZE]);
    out
}

/// Owner-scoped pointer to a sealed blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub owner: PublicKey,
    pub data_hash: IntegrityDigest,
    pub uri: String,
    pub bump: u8,
}

impl Record {
    /// Whether this record already points at `data_hash` and `uri`.
    pub fn matches(&self, data_hash: &IntegrityDigest, uri: &str) -> bool {
        self.data_hash == *data_hash && self.uri == uri
    }

    /// Serialize to the on-ledger layout.
    pub fn encode(&self) -> Vec<u8> {
        let uri = self.uri.as_bytes();
        let mut out = Vec::with_capacity(HEADER_SIZE + uri.len() + 1);
        out.extend_from_slice(&discriminator());
        out.extend_from_slice(self.owner.as_bytes());
        out.extend_from_slice(self.data_hash.as_bytes());
        out.extend_from_slice(&(uri.len() as u32).to_le_bytes());
        out.extend_from_slice(uri);
        out.push(self.bump);
        out
    }

    pub fn decode(data: &[u8]) -> Result<Self, RecordError> {
        if data.len() < HEADER_SIZE {
            return Err(RecordError::Truncated(data.len()));
        }
        let (disc, rest) = data.split_at(DISCRIMINATOR_SIZE);
        if disc != discriminator() {
            return Err(RecordError::BadDiscriminator);
        }
        let (owner, rest) = rest.split_at(PUBLIC_KEY_SIZE);
        let (hash, rest) = rest.split_at(DIGEST_SIZE);
        let (len, rest) = rest.split_at(4);

        let owner = PublicKey::try_from(owner).map_err(|_| RecordError::BadOwner)?;
        let mut hash_bytes = [0u8; DIGEST_SIZE];
        hash_bytes.copy_from_slice(hash);
        let mut len_bytes = [0u8; 4];
        len_bytes.copy_from_slice(len);
        let uri_len = u32::from_le_bytes(len_bytes) as usize;

        if rest.len() < uri_len + 1 {
            return Err(RecordError::Truncated(data.len()));
        }
        let (uri, rest) = rest.split_at(uri_len);
        let uri = std::str::from_utf8(uri).map_err(|_| RecordError::Utf8)?;
        let bump = rest[0];
        if rest.len() > 1 {
            return Err(RecordError::TrailingBytes(rest.len() - 1));
        }

        Ok(Record {
            owner,
            data_hash: IntegrityDigest::from(hash_bytes),
            uri: uri.to_string(),
            bump,
        })
    }
}

/// A record as the ledger stores it, with its write counter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub record: Record,
    /// Starts at 1 and increases on every effective write
    pub revision: u64,
}

/// What a ledger keeps at an address once it has been written
///
/// Closing a record leaves a tombstone carrying the next revision, so the
/// revision at an address never repeats and a signed instruction can only
/// ever apply once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Slot {
    Live(Account),
    Closed { revision: u64 },
}

impl Slot {
    pub fn revision(&self) -> u64 {
        match self {
            Slot::Live(account) => account.revision,
            Slot::Closed { revision } => *revision,
        }
    }

    pub fn account(&self) -> Option<&Account> {
        match self {
            Slot::Live(account) => Some(account),
            Slot::Closed { .. } => None,
        }
    }

    pub fn into_account(self) -> Option<Account> {
        match self {
            Slot::Live(account) => Some(account),
            Slot::Closed { .. } => None,
        }
    }
}
