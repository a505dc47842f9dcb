use clap::Args;
use common::crypto::CipherSuite;
use common::registrar::RegistrarConfig;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Cipher suite for new registrations (chacha20-poly1305 or aes-256-ctr)
    #[arg(long, value_parser = parse_suite)]
    pub suite: Option<CipherSuite>,

    /// Domain tag record addresses are derived under
    #[arg(long)]
    pub domain_tag: Option<String>,
}

fn parse_suite(s: &str) -> Result<CipherSuite, String> {
    [CipherSuite::ChaCha20Poly1305, CipherSuite::Aes256Ctr]
        .into_iter()
        .find(|suite| suite.label() == s)
        .ok_or_else(|| format!("unknown cipher suite '{}'", s))
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
    #[error("init failed: {0}")]
    Registrar(#[from] common::registrar::RegistrarError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut registrar = RegistrarConfig::default();
        if let Some(suite) = self.suite {
            registrar.cipher_suite = suite;
        }
        if let Some(tag) = &self.domain_tag {
            registrar.domain_tag = tag.clone();
        }
        let config = AppConfig {
            blob_store: None,
            registrar,
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;
        let owner = state.load_key()?.public();
        let address = state.registrar().await?.address_of(&owner)?;

        let output = format!(
            "Initialized sealpoint directory at: {}\n\
             - Key: {}\n\
             - Blobs: {}\n\
             - Ledger: {}\n\
             - Config: {}\n\
             - Owner: {}\n\
             - Record address: {}\n\
             - Cipher suite: {}",
            state.sealpoint_dir.display(),
            state.key_path.display(),
            state.blobs_path.display(),
            state.ledger_path.display(),
            state.config_path.display(),
            owner,
            address.address,
            state.config.registrar.cipher_suite,
        );

        Ok(output)
    }
}
