use std::fmt::Debug;

use async_trait::async_trait;

use crate::registry::{
    Account, RegistryAddress, RejectReason, SignedInstruction, Slot, Transition,
};

mod local;
mod memory;

pub use local::LocalLedger;
pub use memory::MemoryLedger;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    /// The registry program refused the instruction
    #[error("instruction rejected: {0}")]
    Rejected(RejectReason),
    /// Another write landed at the address since the signer last read it
    #[error("revision conflict: expected {expected:?}, found {actual:?}")]
    Conflict {
        expected: Option<u64>,
        actual: Option<u64>,
    },
    #[error("ledger did not confirm in time")]
    Timeout,
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
    #[error("unhandled ledger provider error: {0}")]
    Provider(#[from] anyhow::Error),
}

impl LedgerError {
    /// Whether re-reading state and resubmitting may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::Conflict { .. } | LedgerError::Timeout | LedgerError::Unavailable(_)
        )
    }
}

impl From<RejectReason> for LedgerError {
    fn from(reason: RejectReason) -> Self {
        match reason {
            RejectReason::StaleRevision { expected, actual } => {
                LedgerError::Conflict { expected, actual }
            }
            other => LedgerError::Rejected(other),
        }
    }
}

/// Result of an accepted instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commit {
    pub address: RegistryAddress,
    /// Revision of the live record, `None` once the record is closed
    pub revision: Option<u64>,
    /// False when the instruction left the account exactly as it was
    pub changed: bool,
}

/// Where registry accounts live
///
/// A ledger serializes instructions per address: it reads the current
/// account, runs the registry program and applies the resulting transition
/// as one atomic step. Readers never observe a partially written record.
/// A closed record stays behind as a tombstone so revisions never repeat.
#[async_trait]
pub trait Ledger: Send + Sync + Debug + 'static {
    /// Whatever is stored at `address`, tombstones included
    async fn slot(&self, address: &RegistryAddress) -> Result<Option<Slot>, LedgerError>;

    /// Live account at `address`, if any
    async fn read(&self, address: &RegistryAddress) -> Result<Option<Account>, LedgerError> {
        Ok(self.slot(address).await?.and_then(Slot::into_account))
    }

    /// Execute a signed instruction and commit its effect
    async fn submit(&self, ix: SignedInstruction) -> Result<Commit, LedgerError>;
}

/// What a ledger must do to its store after an accepted transition.
enum Effect {
    Keep,
    Put(Slot),
}

fn plan(address: RegistryAddress, transition: Transition) -> (Effect, Commit) {
    match transition {
        Transition::Write { account, changed } => {
            let commit = Commit {
                address,
                revision: Some(account.revision),
                changed,
            };
            let effect = if changed {
                Effect::Put(Slot::Live(account))
            } else {
                Effect::Keep
            };
            (effect, commit)
        }
        Transition::Close { revision } => (
            Effect::Put(Slot::Closed { revision }),
            Commit {
                address,
                revision: None,
                changed: true,
            },
        ),
    }
}
