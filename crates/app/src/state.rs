use std::sync::Arc;
use std::{fs, path::PathBuf};

use blob_store::{BlobStore, BlobStoreError, ObjectStoreConfig};
use common::ledger::{LedgerError, LocalLedger};
use common::prelude::SecretKey;
use common::registrar::{Registrar, RegistrarConfig};
use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "sealpoint";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = "key.pem";
pub const BLOBS_DIR_NAME: &str = "blobs";
pub const LEDGER_DIR_NAME: &str = "ledger";

/// The registrar the CLI runs: on-disk blobs and ledger
pub type LocalRegistrar = Registrar<BlobStore, LocalLedger>;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    /// Where sealed blobs are published. Defaults to the `blobs/` directory
    #[serde(default)]
    pub blob_store: Option<ObjectStoreConfig>,
    #[serde(default)]
    pub registrar: RegistrarConfig,
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the sealpoint directory (~/.sealpoint)
    pub sealpoint_dir: PathBuf,
    /// Path to the owner key PEM file
    pub key_path: PathBuf,
    /// Path to the local blobs directory
    pub blobs_path: PathBuf,
    /// Path to the local ledger directory
    pub ledger_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the sealpoint directory path (custom or default ~/.sealpoint)
    pub fn sealpoint_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new sealpoint state directory with a fresh owner key
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let sealpoint_dir = Self::sealpoint_dir(custom_path)?;

        if sealpoint_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&sealpoint_dir)?;

        let blobs_path = sealpoint_dir.join(BLOBS_DIR_NAME);
        fs::create_dir_all(&blobs_path)?;
        let ledger_path = sealpoint_dir.join(LEDGER_DIR_NAME);
        fs::create_dir_all(&ledger_path)?;

        let key = SecretKey::try_generate().map_err(|e| StateError::InvalidKey(e.to_string()))?;
        let key_path = sealpoint_dir.join(KEY_FILE_NAME);
        fs::write(&key_path, key.to_pem())?;

        let mut config = config.unwrap_or_default();
        if config.blob_store.is_none() {
            config.blob_store = Some(ObjectStoreConfig::Local {
                path: blobs_path.clone(),
            });
        }
        let config_path = sealpoint_dir.join(CONFIG_FILE_NAME);
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;

        tracing::info!(dir = %sealpoint_dir.display(), owner = %key.public(), "initialized state");

        Ok(Self {
            sealpoint_dir,
            key_path,
            blobs_path,
            ledger_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the sealpoint directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let sealpoint_dir = Self::sealpoint_dir(custom_path)?;

        if !sealpoint_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let key_path = sealpoint_dir.join(KEY_FILE_NAME);
        let blobs_path = sealpoint_dir.join(BLOBS_DIR_NAME);
        let ledger_path = sealpoint_dir.join(LEDGER_DIR_NAME);
        let config_path = sealpoint_dir.join(CONFIG_FILE_NAME);

        if !key_path.exists() {
            return Err(StateError::MissingFile(KEY_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config: AppConfig = toml::from_str(&fs::read_to_string(&config_path)?)?;

        Ok(Self {
            sealpoint_dir,
            key_path,
            blobs_path,
            ledger_path,
            config_path,
            config,
        })
    }

    /// Load the owner key from the key file
    pub fn load_key(&self) -> Result<SecretKey, StateError> {
        let pem = fs::read_to_string(&self.key_path)?;
        let key = SecretKey::from_pem(&pem).map_err(|e| StateError::InvalidKey(e.to_string()))?;
        Ok(key)
    }

    /// Build the registrar over the configured blob store and local ledger
    pub async fn registrar(&self) -> Result<LocalRegistrar, StateError> {
        let blob_config = self
            .config
            .blob_store
            .clone()
            .unwrap_or_else(|| ObjectStoreConfig::Local {
                path: self.blobs_path.clone(),
            });
        let blobs = BlobStore::new(blob_config).await?;

        let registrar_config = self.config.registrar.clone();
        let ledger = LocalLedger::open(&self.ledger_path, registrar_config.program()).await?;

        Ok(Registrar::new(
            Arc::new(blobs),
            Arc::new(ledger),
            registrar_config,
        ))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("sealpoint directory not initialized. Run 'sealpoint init' first")]
    NotInitialized,

    #[error("sealpoint directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("blob store error: {0}")]
    BlobStore(#[from] BlobStoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
