use std::path::PathBuf;

use clap::Args;
use common::registrar::RegistrarError;

use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Register {
    /// File to encrypt and register
    pub file: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("failed to read {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("registration failed: {0}")]
    Registrar(#[from] RegistrarError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Register {
    type Error = RegisterError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let key = state.load_key()?;
        let plaintext = tokio::fs::read(&self.file)
            .await
            .map_err(|e| RegisterError::Read(self.file.clone(), e))?;

        let registrar = state.registrar().await?;
        let registration = registrar.register_encrypted(&key, &plaintext).await?;

        let status = if registration.changed {
            "registered"
        } else {
            "unchanged"
        };
        Ok(format!(
            "{} {} ({} bytes)\n\
             - Address: {}\n\
             - Bump: {}\n\
             - Uri: {}\n\
             - Digest: {}\n\
             - Revision: {}",
            status,
            self.file.display(),
            plaintext.len(),
            registration.address,
            registration.bump,
            registration.uri(),
            registration.digest,
            registration.revision,
        ))
    }
}
