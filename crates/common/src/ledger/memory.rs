use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{plan, Commit, Effect, Ledger, LedgerError};
use crate::registry::{RegistryAddress, RegistryProgram, SignedInstruction, Slot};

/// In-memory ledger backed by a HashMap
#[derive(Debug, Clone)]
pub struct MemoryLedger {
    program: RegistryProgram,
    inner: Arc<RwLock<HashMap<RegistryAddress, Slot>>>,
}

impl MemoryLedger {
    pub fn new(program: RegistryProgram) -> Self {
        Self {
            program,
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn program(&self) -> &RegistryProgram {
        &self.program
    }

    /// Number of live accounts; tombstones are not counted
    pub fn len(&self) -> usize {
        self.inner
            .read()
            .map(|inner| inner.values().filter(|slot| slot.account().is_some()).count())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn lock_error(e: impl std::fmt::Display) -> LedgerError {
    LedgerError::Provider(anyhow::anyhow!("failed to acquire ledger lock: {}", e))
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn slot(&self, address: &RegistryAddress) -> Result<Option<Slot>, LedgerError> {
        let inner = self.inner.read().map_err(lock_error)?;
        Ok(inner.get(address).cloned())
    }

    async fn submit(&self, ix: SignedInstruction) -> Result<Commit, LedgerError> {
        let mut inner = self.inner.write().map_err(lock_error)?;

        let address = ix.address;
        let transition = self.program.execute(inner.get(&address), &ix)?;
        let (effect, commit) = plan(address, transition);
        match effect {
            Effect::Keep => {}
            Effect::Put(slot) => {
                inner.insert(address, slot);
            }
        }

        tracing::debug!(%address, revision = ?commit.revision, changed = commit.changed, "memory ledger commit");
        Ok(commit)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{IntegrityDigest, SecretKey};
    use crate::registry::{derive, Instruction, ProgramId, RejectReason};

    fn ledger() -> MemoryLedger {
        MemoryLedger::new(RegistryProgram::new(ProgramId::default(), "user"))
    }

    fn upsert(
        ledger: &MemoryLedger,
        secret: &SecretKey,
        expected: Option<u64>,
        uri: &str,
    ) -> SignedInstruction {
        let program = ledger.program();
        let address = derive(program.domain_tag(), &secret.public(), program.program_id())
            .unwrap()
            .address;
        SignedInstruction::sign(
            secret,
            *program.program_id(),
            address,
            expected,
            Instruction::Upsert {
                data_hash: IntegrityDigest::of(uri.as_bytes()),
                uri: uri.to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_submit_then_read() {
        let ledger = ledger();
        let secret = SecretKey::generate();
        let ix = upsert(&ledger, &secret, None, "uri-1");
        let address = ix.address;

        assert!(ledger.read(&address).await.unwrap().is_none());

        let commit = ledger.submit(ix).await.unwrap();
        assert_eq!(commit.revision, Some(1));
        assert!(commit.changed);

        let account = ledger.read(&address).await.unwrap().unwrap();
        assert_eq!(account.record.uri, "uri-1");
        assert_eq!(account.record.owner, secret.public());
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_same_revision_twice_conflicts() {
        let ledger = ledger();
        let secret = SecretKey::generate();

        let first = upsert(&ledger, &secret, None, "uri-1");
        let second = upsert(&ledger, &secret, None, "uri-2");

        ledger.submit(first).await.unwrap();
        let err = ledger.submit(second).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Conflict {
                expected: None,
                actual: Some(1)
            }
        ));

        let address = upsert(&ledger, &secret, None, "x").address;
        let account = ledger.read(&address).await.unwrap().unwrap();
        assert_eq!(account.record.uri, "uri-1");
    }

    #[tokio::test]
    async fn test_rejection_leaves_state_untouched() {
        let ledger = ledger();
        let secret = SecretKey::generate();
        let ix = upsert(&ledger, &secret, None, "");
        let address = ix.address;

        let err = ledger.submit(ix).await.unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(RejectReason::EmptyUri)));
        assert!(ledger.read(&address).await.unwrap().is_none());
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_close_leaves_tombstone() {
        let ledger = ledger();
        let secret = SecretKey::generate();
        let address = upsert(&ledger, &secret, None, "x").address;
        ledger.submit(upsert(&ledger, &secret, None, "uri-1")).await.unwrap();

        let program = ledger.program();
        let close = SignedInstruction::sign(
            &secret,
            *program.program_id(),
            address,
            Some(1),
            Instruction::Close,
        );
        ledger.submit(close.clone()).await.unwrap();

        assert!(ledger.read(&address).await.unwrap().is_none());
        assert_eq!(
            ledger.slot(&address).await.unwrap(),
            Some(Slot::Closed { revision: 2 })
        );
        assert!(ledger.is_empty());

        let err = ledger.submit(close).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Conflict {
                expected: Some(1),
                actual: Some(2)
            }
        ));
    }
}
