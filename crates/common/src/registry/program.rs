use super::address::{derive, AddressError, ProgramId};
use super::instruction::{Instruction, SignedInstruction};
use super::record::{Account, Record, Slot, MAX_URI_LEN};

/// Why the registry program refused an instruction
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum RejectReason {
    #[error("instruction targets another program")]
    WrongProgram,
    #[error("instruction signature is invalid")]
    BadSignature,
    #[error("address is not derived from the signing owner")]
    AddressMismatch,
    #[error("stale revision: expected {expected:?}, found {actual:?}")]
    StaleRevision {
        expected: Option<u64>,
        actual: Option<u64>,
    },
    #[error("signer does not own the record")]
    Unauthorized,
    #[error("uri is {0} bytes, longer than {MAX_URI_LEN}")]
    UriTooLong(usize),
    #[error("uri is empty")]
    EmptyUri,
    #[error("no record at address")]
    RecordNotFound,
    #[error("address derivation failed: {0}")]
    Derivation(#[from] AddressError),
}

/// State change produced by an accepted instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Store `account` at the address; `changed` is false for a no-op upsert
    Write { account: Account, changed: bool },
    /// Replace the live account with a tombstone at `revision`
    Close { revision: u64 },
}

/// The registry's state machine, independent of where accounts are kept
///
/// Ledgers hand it the current slot at an instruction's address and apply
/// whatever transition it returns, atomically. Every effective transition
/// moves the slot to a strictly higher revision, including a close, so an
/// instruction signed against one revision can never be replayed later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryProgram {
    program_id: ProgramId,
    domain_tag: Vec<u8>,
}

impl RegistryProgram {
    pub fn new(program_id: ProgramId, domain_tag: impl Into<Vec<u8>>) -> Self {
        Self {
            program_id,
            domain_tag: domain_tag.into(),
        }
    }

    pub fn program_id(&self) -> &ProgramId {
        &self.program_id
    }

    pub fn domain_tag(&self) -> &[u8] {
        &self.domain_tag
    }

    pub fn execute(
        &self,
        current: Option<&Slot>,
        ix: &SignedInstruction,
    ) -> Result<Transition, RejectReason> {
        if ix.program_id != self.program_id {
            return Err(RejectReason::WrongProgram);
        }
        if !ix.verify() {
            return Err(RejectReason::BadSignature);
        }

        let derived = derive(&self.domain_tag, &ix.owner, &self.program_id)?;
        if derived.address != ix.address {
            return Err(RejectReason::AddressMismatch);
        }

        let actual = current.map(Slot::revision);
        if ix.expected_revision != actual {
            return Err(RejectReason::StaleRevision {
                expected: ix.expected_revision,
                actual,
            });
        }

        let live = current.and_then(Slot::account);
        if let Some(account) = live {
            if account.record.owner != ix.owner {
                return Err(RejectReason::Unauthorized);
            }
        }

        match &ix.instruction {
            Instruction::Upsert { data_hash, uri } => {
                if uri.is_empty() {
                    return Err(RejectReason::EmptyUri);
                }
                if uri.len() > MAX_URI_LEN {
                    return Err(RejectReason::UriTooLong(uri.len()));
                }

                match live {
                    Some(account) if account.record.matches(data_hash, uri) => {
                        Ok(Transition::Write {
                            account: account.clone(),
                            changed: false,
                        })
                    }
                    Some(account) => Ok(Transition::Write {
                        account: Account {
                            record: Record {
                                owner: account.record.owner,
                                data_hash: *data_hash,
                                uri: uri.clone(),
                                bump: account.record.bump,
                            },
                            revision: account.revision + 1,
                        },
                        changed: true,
                    }),
                    // first write, or a re-create over a tombstone
                    None => Ok(Transition::Write {
                        account: Account {
                            record: Record {
                                owner: ix.owner,
                                data_hash: *data_hash,
                                uri: uri.clone(),
                                bump: derived.bump,
                            },
                            revision: actual.unwrap_or(0) + 1,
                        },
                        changed: true,
                    }),
                }
            }
            Instruction::Close => match live {
                Some(account) => Ok(Transition::Close {
                    revision: account.revision + 1,
                }),
                None => Err(RejectReason::RecordNotFound),
            },
        }
    }
}
