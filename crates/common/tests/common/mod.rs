//! Shared test utilities for registration integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use blob_store::BlobStore;
use bytes::Bytes;
use common::crypto::{CipherSuite, SecretKey};
use common::ledger::{Commit, Ledger, LedgerError, LocalLedger, MemoryLedger};
use common::linked_data::LocationHandle;
use common::registrar::{Registrar, RegistrarConfig};
use common::registry::{RegistryAddress, SignedInstruction, Slot};
use common::retry::RetryPolicy;
use common::storage::{BlobStorage, StorageError};
use tempfile::TempDir;

/// Retry quickly so failure paths don't slow the suite down
pub fn fast_config(suite: CipherSuite) -> RegistrarConfig {
    let retry = RetryPolicy {
        max_attempts: 4,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
    };
    RegistrarConfig {
        cipher_suite: suite,
        publish_retry: retry,
        ledger_retry: retry,
        publish_timeout_ms: 1_000,
        submit_timeout_ms: 1_000,
        ..RegistrarConfig::default()
    }
}

/// Registrar over an on-disk blob store and ledger in a fresh temp dir
pub async fn setup_test_env(
    suite: CipherSuite,
) -> (Registrar<BlobStore, LocalLedger>, SecretKey, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let registrar = open_registrar(temp_dir.path(), fast_config(suite)).await;
    (registrar, SecretKey::generate(), temp_dir)
}

/// Registrar over the on-disk state under `root`, for reopening tests
pub async fn open_registrar(
    root: &std::path::Path,
    config: RegistrarConfig,
) -> Registrar<BlobStore, LocalLedger> {
    let blobs = BlobStore::new_local(&root.join("blobs")).await.unwrap();
    let ledger = LocalLedger::open(root.join("ledger"), config.program())
        .await
        .unwrap();
    Registrar::new(Arc::new(blobs), Arc::new(ledger), config)
}

/// Registrar over the given storage and an in-memory ledger
pub async fn memory_registrar<S: BlobStorage>(
    storage: S,
    config: RegistrarConfig,
) -> Registrar<S, MemoryLedger> {
    let ledger = MemoryLedger::new(config.program());
    Registrar::new(Arc::new(storage), Arc::new(ledger), config)
}

/// Storage that fails a set number of publishes before delegating
#[derive(Debug)]
pub struct FlakyStorage {
    inner: BlobStore,
    failures_left: AtomicU32,
    transient: bool,
    attempts: AtomicU32,
}

impl FlakyStorage {
    /// Fail the first `failures` publishes with a transient error
    pub async fn failing(failures: u32) -> Self {
        Self {
            inner: BlobStore::new_ephemeral().await.unwrap(),
            failures_left: AtomicU32::new(failures),
            transient: true,
            attempts: AtomicU32::new(0),
        }
    }

    /// Never succeed
    pub async fn down() -> Self {
        Self::failing(u32::MAX).await
    }

    /// Fail every publish with an error retrying cannot fix
    pub async fn broken() -> Self {
        Self {
            transient: false,
            ..Self::down().await
        }
    }

    /// Fail the next `failures` publishes with a transient error
    pub fn fail_next(&self, failures: u32) {
        self.failures_left.store(failures, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, blob: &[u8]) -> bool {
        self.inner
            .has(LocationHandle::for_content(blob).cid())
            .await
            .unwrap()
    }
}

#[async_trait]
impl BlobStorage for FlakyStorage {
    async fn publish(&self, blob: Bytes) -> Result<LocationHandle, StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let left = self.failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.failures_left.store(left - 1, Ordering::SeqCst);
            return Err(if self.transient {
                StorageError::Unavailable("connection reset".into())
            } else {
                StorageError::NotFound(LocationHandle::for_content(&blob))
            });
        }
        self.inner.publish(blob).await
    }

    async fn fetch(&self, handle: &LocationHandle) -> Result<Bytes, StorageError> {
        self.inner.fetch(handle).await
    }
}

/// Ledger that applies the first submit but reports it too late
///
/// Models a transaction that lands while the client has already given up
/// waiting for its confirmation.
#[derive(Debug)]
pub struct LaggyLedger {
    pub inner: MemoryLedger,
    lag: Duration,
    lagged: AtomicBool,
    pub submits: AtomicU32,
}

impl LaggyLedger {
    pub fn new(inner: MemoryLedger, lag: Duration) -> Self {
        Self {
            inner,
            lag,
            lagged: AtomicBool::new(false),
            submits: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl Ledger for LaggyLedger {
    async fn slot(&self, address: &RegistryAddress) -> Result<Option<Slot>, LedgerError> {
        self.inner.slot(address).await
    }

    async fn submit(&self, ix: SignedInstruction) -> Result<Commit, LedgerError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let commit = self.inner.submit(ix).await?;
        if !self.lagged.swap(true, Ordering::SeqCst) {
            tokio::time::sleep(self.lag).await;
        }
        Ok(commit)
    }
}

/// Ledger that accepts reads but never confirms a submit
#[derive(Debug, Default)]
pub struct StalledLedger {
    pub submits: AtomicU32,
}

#[async_trait]
impl Ledger for StalledLedger {
    async fn slot(&self, _address: &RegistryAddress) -> Result<Option<Slot>, LedgerError> {
        Ok(None)
    }

    async fn submit(&self, _ix: SignedInstruction) -> Result<Commit, LedgerError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}
