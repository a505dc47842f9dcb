use crate::crypto::{CipherError, IntegrityDigest, KeyError};
use crate::ledger::LedgerError;
use crate::linked_data::LocationError;
use crate::registry::{AddressError, RegistryAddress, RejectReason};
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum RegistrarError {
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(#[from] KeyError),
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("publish failed after {attempts} attempt(s): {source}")]
    PublishFailed {
        attempts: u32,
        #[source]
        source: StorageError,
    },
    #[error("no bump seed produced a valid registry address")]
    AddressDerivationExhausted,
    #[error("address derivation error: {0}")]
    Address(AddressError),
    #[error("record address does not belong to the signer")]
    AddressMismatch,
    #[error("signer does not own the record")]
    Unauthorized,
    #[error("ledger timed out after {attempts} attempt(s)")]
    LedgerTimeout { attempts: u32 },
    #[error("ledger conflict persisted after {attempts} attempt(s)")]
    LedgerConflict { attempts: u32 },
    #[error("ledger error: {0}")]
    Ledger(LedgerError),
    #[error("failed to fetch blob: {0}")]
    Fetch(StorageError),
    #[error("blob digest {actual} does not match recorded {expected}")]
    IntegrityMismatch {
        expected: IntegrityDigest,
        actual: IntegrityDigest,
    },
    #[error("no record registered at {0}")]
    NotRegistered(RegistryAddress),
    #[error("record holds an unreadable location: {0}")]
    InvalidLocation(#[from] LocationError),
}

impl From<AddressError> for RegistrarError {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::DerivationExhausted => RegistrarError::AddressDerivationExhausted,
            other => RegistrarError::Address(other),
        }
    }
}

impl From<LedgerError> for RegistrarError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Rejected(RejectReason::AddressMismatch) => RegistrarError::AddressMismatch,
            LedgerError::Rejected(RejectReason::Unauthorized) => RegistrarError::Unauthorized,
            LedgerError::Rejected(RejectReason::Derivation(e)) => e.into(),
            other => RegistrarError::Ledger(other),
        }
    }
}
