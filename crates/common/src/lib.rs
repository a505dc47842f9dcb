/**
 * Cryptographic types and operations.
 *  - Owner identities (Ed25519)
 *  - Self-only storage key agreement
 *  - Sealing and integrity digests
 */
pub mod crypto;
/**
 * Ledger abstraction over where registry
 *  accounts live, plus in-memory and
 *  on-disk implementations.
 */
pub mod ledger;
/**
 * Content-derived handles for published
 *  blobs, wrapping the storage layer's CIDs.
 */
pub mod linked_data;
/**
 * The encrypted registration pipeline.
 * Ties sealing, publishing and the registry
 *  upsert together.
 */
pub mod registrar;
/**
 * Owner-scoped registry records: address
 *  derivation, instructions and the program
 *  that validates them.
 */
pub mod registry;
pub mod retry;
/**
 * Content-addressed blob storage interface.
 */
pub mod storage;

pub mod prelude {
    pub use crate::crypto::{CipherSuite, IntegrityDigest, PublicKey, SecretKey};
    pub use crate::ledger::{Commit, Ledger, LedgerError, LocalLedger, MemoryLedger};
    pub use crate::linked_data::LocationHandle;
    pub use crate::registrar::{Registrar, RegistrarConfig, RegistrarError, Registration};
    pub use crate::registry::{Account, ProgramId, Record, RegistryAddress, RegistryProgram};
    pub use crate::retry::RetryPolicy;
    pub use crate::storage::{BlobStorage, StorageError};
}
