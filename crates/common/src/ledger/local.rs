use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{plan, Commit, Effect, Ledger, LedgerError};
use crate::registry::{Account, Record, RegistryAddress, RegistryProgram, SignedInstruction, Slot};

const ACCOUNT_EXTENSION: &str = "account";

/// Ledger that keeps one file per account in a local directory
///
/// Each file holds the little-endian revision followed by the record in its
/// wire layout. A closed record keeps its file with the revision alone. Writes go to a temporary file that is renamed into place, so
/// a crash never leaves a torn record behind. Submissions are serialized by
/// an async mutex; reads go straight to disk.
#[derive(Debug)]
pub struct LocalLedger {
    program: RegistryProgram,
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalLedger {
    /// Open (creating if needed) a ledger rooted at `root`
    pub async fn open(root: impl AsRef<Path>, program: RegistryProgram) -> Result<Self, LedgerError> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("failed to create ledger directory {}", root.display()))?;
        Ok(Self {
            program,
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn program(&self) -> &RegistryProgram {
        &self.program
    }

    fn account_path(&self, address: &RegistryAddress) -> PathBuf {
        self.root
            .join(format!("{}.{}", address.to_hex(), ACCOUNT_EXTENSION))
    }

    async fn load(&self, address: &RegistryAddress) -> Result<Option<Slot>, LedgerError> {
        let path = self.account_path(address);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("failed to read {}", path.display()))
                    .into())
            }
        };
        decode_slot(&data)
            .with_context(|| format!("corrupt account file {}", path.display()))
            .map(Some)
            .map_err(LedgerError::from)
    }

    async fn store(&self, address: &RegistryAddress, slot: &Slot) -> Result<(), LedgerError> {
        let root = self.root.clone();
        let path = self.account_path(address);
        let data = encode_slot(slot);

        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let mut file = tempfile::NamedTempFile::new_in(&root)?;
            file.write_all(&data)?;
            file.as_file().sync_all()?;
            file.persist(&path)?;
            Ok(())
        })
        .await
        .context("account writer task failed")??;
        Ok(())
    }
}

fn encode_slot(slot: &Slot) -> Vec<u8> {
    let mut out = slot.revision().to_le_bytes().to_vec();
    if let Slot::Live(account) = slot {
        out.extend_from_slice(&account.record.encode());
    }
    out
}

fn decode_slot(data: &[u8]) -> anyhow::Result<Slot> {
    if data.len() < 8 {
        anyhow::bail!("account file is {} bytes", data.len());
    }
    let (revision, record) = data.split_at(8);
    let mut revision_bytes = [0u8; 8];
    revision_bytes.copy_from_slice(revision);
    let revision = u64::from_le_bytes(revision_bytes);

    if record.is_empty() {
        return Ok(Slot::Closed { revision });
    }
    Ok(Slot::Live(Account {
        revision,
        record: Record::decode(record)?,
    }))
}

#[async_trait]
impl Ledger for LocalLedger {
    async fn slot(&self, address: &RegistryAddress) -> Result<Option<Slot>, LedgerError> {
        self.load(address).await
    }

    async fn submit(&self, ix: SignedInstruction) -> Result<Commit, LedgerError> {
        let _guard = self.write_lock.lock().await;

        let address = ix.address;
        let current = self.load(&address).await?;
        let transition = self.program.execute(current.as_ref(), &ix)?;
        let (effect, commit) = plan(address, transition);
        match effect {
            Effect::Keep => {}
            Effect::Put(slot) => self.store(&address, &slot).await?,
        }

        tracing::debug!(%address, revision = ?commit.revision, changed = commit.changed, "local ledger commit");
        Ok(commit)
    }
}
