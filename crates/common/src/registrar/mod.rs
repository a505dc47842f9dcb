//! The encrypted registration pipeline
//!
//! `plaintext -> seal -> publish -> digest -> derive address -> upsert`
//!
//! Publishing always happens before the ledger is touched. A failed publish
//! leaves the ledger exactly as it was; a failed commit after a successful
//! publish leaves only an unreferenced blob behind.

use std::sync::Arc;

use bytes::Bytes;

use crate::crypto::{derive_storage_key, IntegrityDigest, PublicKey, SealedBlob, SecretKey};
use crate::ledger::{Commit, Ledger, LedgerError};
use crate::linked_data::LocationHandle;
use crate::registry::{
    derive, Account, DerivedAddress, Instruction, RegistryAddress, RegistryProgram,
    SignedInstruction, Slot,
};
use crate::storage::{BlobStorage, StorageError};

mod config;
mod error;

pub use config::RegistrarConfig;
pub use error::RegistrarError;

/// Outcome of a successful registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub address: RegistryAddress,
    pub bump: u8,
    pub handle: LocationHandle,
    pub digest: IntegrityDigest,
    pub revision: u64,
    /// False if the record already pointed at this blob
    pub changed: bool,
}

impl Registration {
    /// The uri written to the record
    pub fn uri(&self) -> String {
        self.handle.to_string()
    }
}

/// Runs the registration pipeline against explicit collaborators
#[derive(Debug)]
pub struct Registrar<S, L> {
    storage: Arc<S>,
    ledger: Arc<L>,
    config: RegistrarConfig,
    program: RegistryProgram,
}

impl<S: BlobStorage, L: Ledger> Registrar<S, L> {
    pub fn new(storage: Arc<S>, ledger: Arc<L>, config: RegistrarConfig) -> Self {
        let program = config.program();
        Self {
            storage,
            ledger,
            config,
            program,
        }
    }

    pub fn config(&self) -> &RegistrarConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// The record address (and bump) for `owner`
    pub fn address_of(&self, owner: &PublicKey) -> Result<DerivedAddress, RegistrarError> {
        Ok(derive(
            self.program.domain_tag(),
            owner,
            self.program.program_id(),
        )?)
    }

    /// Seal `plaintext` under the owner's storage key with a fresh iv
    pub fn seal(&self, identity: &SecretKey, plaintext: &[u8]) -> Result<SealedBlob, RegistrarError> {
        let suite = self.config.cipher_suite;
        let key = derive_storage_key(identity, suite)?;
        let owner = identity.public();
        Ok(suite.seal(&key, owner.as_bytes(), plaintext)?)
    }

    /// Encrypt `plaintext`, publish it and point the owner's record at it.
    pub async fn register_encrypted(
        &self,
        identity: &SecretKey,
        plaintext: &[u8],
    ) -> Result<Registration, RegistrarError> {
        let sealed = self.seal(identity, plaintext)?;
        tracing::debug!(
            suite = %sealed.suite(),
            plaintext_len = plaintext.len(),
            sealed_len = sealed.len(),
            "sealed payload"
        );
        self.register_sealed(identity, sealed).await
    }

    /// Publish an already sealed blob and point the owner's record at it.
    pub async fn register_sealed(
        &self,
        identity: &SecretKey,
        sealed: SealedBlob,
    ) -> Result<Registration, RegistrarError> {
        let owner = identity.public();
        let derived = self.address_of(&owner)?;
        let digest = IntegrityDigest::of(sealed.as_bytes());

        let handle = self.publish(sealed.to_bytes()).await?;
        tracing::info!(%handle, %digest, "published sealed blob");

        let uri = handle.to_string();
        let commit = self
            .upsert(identity, derived.address, digest, uri)
            .await?;
        tracing::info!(
            address = %derived.address,
            revision = ?commit.revision,
            changed = commit.changed,
            "registered record"
        );

        Ok(Registration {
            address: derived.address,
            bump: derived.bump,
            handle,
            digest,
            revision: commit.revision.unwrap_or_default(),
            changed: commit.changed,
        })
    }

    /// Current account for `owner`, if any
    pub async fn locate(&self, owner: &PublicKey) -> Result<Option<Account>, RegistrarError> {
        let derived = self.address_of(owner)?;
        Ok(self.read(&derived.address).await?)
    }

    /// Fetch, verify and decrypt the blob the owner's record points at.
    pub async fn retrieve(&self, identity: &SecretKey) -> Result<Vec<u8>, RegistrarError> {
        let owner = identity.public();
        let derived = self.address_of(&owner)?;
        let account = self
            .read(&derived.address)
            .await?
            .ok_or(RegistrarError::NotRegistered(derived.address))?;

        let handle: LocationHandle = account.record.uri.parse()?;
        let blob = self
            .storage
            .fetch(&handle)
            .await
            .map_err(RegistrarError::Fetch)?;

        let actual = IntegrityDigest::of(&blob);
        if actual != account.record.data_hash {
            return Err(RegistrarError::IntegrityMismatch {
                expected: account.record.data_hash,
                actual,
            });
        }

        let suite = self.config.cipher_suite;
        let sealed = SealedBlob::from_bytes(suite, blob)?;
        let key = derive_storage_key(identity, suite)?;
        let plaintext = sealed.open(&key, owner.as_bytes())?;
        tracing::debug!(%handle, len = plaintext.len(), "retrieved payload");
        Ok(plaintext)
    }

    /// Remove the owner's record. The blob it pointed at is left in storage.
    pub async fn close(&self, identity: &SecretKey) -> Result<Commit, RegistrarError> {
        let owner = identity.public();
        let derived = self.address_of(&owner)?;
        let current = self
            .read(&derived.address)
            .await?
            .ok_or(RegistrarError::NotRegistered(derived.address))?;

        let ix = SignedInstruction::sign(
            identity,
            *self.program.program_id(),
            derived.address,
            Some(current.revision),
            Instruction::Close,
        );
        let commit = self.submit(ix).await?;
        tracing::info!(address = %derived.address, "closed record");
        Ok(commit)
    }

    async fn publish(&self, blob: Bytes) -> Result<LocationHandle, RegistrarError> {
        let policy = self.config.publish_retry;
        let timeout = self.config.publish_timeout();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let result = match tokio::time::timeout(timeout, self.storage.publish(blob.clone())).await
            {
                Ok(result) => result,
                Err(_) => Err(StorageError::Unavailable(format!(
                    "publish timed out after {:?}",
                    timeout
                ))),
            };

            match result {
                Ok(handle) => return Ok(handle),
                Err(err) if err.is_transient() && policy.should_retry(attempt) => {
                    let delay = policy.backoff(attempt);
                    tracing::warn!(attempt, ?delay, error = %err, "publish failed, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(source) => {
                    return Err(RegistrarError::PublishFailed {
                        attempts: attempt,
                        source,
                    })
                }
            }
        }
    }

    async fn upsert(
        &self,
        identity: &SecretKey,
        address: RegistryAddress,
        data_hash: IntegrityDigest,
        uri: String,
    ) -> Result<Commit, RegistrarError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let current = match self.slot_once(&address).await {
                Ok(current) => current,
                Err(err) => {
                    self.backoff_or_fail(attempt, err).await?;
                    continue;
                }
            };

            // a retried submit may have landed before it timed out
            if attempt > 1 {
                if let Some(account) = current.as_ref().and_then(Slot::account) {
                    if account.record.matches(&data_hash, &uri) {
                        tracing::debug!(%address, "record already current, not resubmitting");
                        return Ok(Commit {
                            address,
                            revision: Some(account.revision),
                            changed: false,
                        });
                    }
                }
            }

            let ix = SignedInstruction::sign(
                identity,
                *self.program.program_id(),
                address,
                current.as_ref().map(Slot::revision),
                Instruction::Upsert {
                    data_hash,
                    uri: uri.clone(),
                },
            );

            match self.submit_once(ix).await {
                Ok(commit) => return Ok(commit),
                Err(err) => self.backoff_or_fail(attempt, err).await?,
            }
        }
    }

    async fn submit(&self, ix: SignedInstruction) -> Result<Commit, RegistrarError> {
        Ok(self.submit_once(ix).await?)
    }

    async fn read(&self, address: &RegistryAddress) -> Result<Option<Account>, RegistrarError> {
        Ok(self.slot_once(address).await?.and_then(Slot::into_account))
    }

    async fn submit_once(&self, ix: SignedInstruction) -> Result<Commit, LedgerError> {
        tokio::time::timeout(self.config.submit_timeout(), self.ledger.submit(ix))
            .await
            .map_err(|_| LedgerError::Timeout)?
    }

    async fn slot_once(&self, address: &RegistryAddress) -> Result<Option<Slot>, LedgerError> {
        tokio::time::timeout(self.config.submit_timeout(), self.ledger.slot(address))
            .await
            .map_err(|_| LedgerError::Timeout)?
    }

    /// Sleep before the next ledger attempt, or turn `err` into the final error.
    async fn backoff_or_fail(&self, attempt: u32, err: LedgerError) -> Result<(), RegistrarError> {
        let policy = self.config.ledger_retry;
        if !err.is_retryable() {
            return Err(err.into());
        }
        if !policy.should_retry(attempt) {
            return Err(match err {
                LedgerError::Conflict { .. } => RegistrarError::LedgerConflict { attempts: attempt },
                LedgerError::Timeout => RegistrarError::LedgerTimeout { attempts: attempt },
                other => other.into(),
            });
        }

        let delay = policy.backoff(attempt);
        tracing::warn!(attempt, ?delay, error = %err, "ledger attempt failed, retrying");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}
