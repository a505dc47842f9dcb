use std::path::PathBuf;

use clap::Args;
use common::registrar::RegistrarError;

use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Fetch {
    /// Write the decrypted payload here instead of printing it
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("retrieve failed: {0}")]
    Registrar(#[from] RegistrarError),
    #[error("failed to write {0}: {1}")]
    Write(PathBuf, std::io::Error),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Fetch {
    type Error = FetchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let key = state.load_key()?;
        let registrar = state.registrar().await?;
        let plaintext = registrar.retrieve(&key).await?;

        if let Some(out) = &self.out {
            tokio::fs::write(out, &plaintext)
                .await
                .map_err(|e| FetchError::Write(out.clone(), e))?;
            return Ok(format!("Wrote {} bytes to {}", plaintext.len(), out.display()));
        }

        // Print text directly, or hex if binary
        match String::from_utf8(plaintext) {
            Ok(text) => Ok(text),
            Err(e) => Ok(format!(
                "Binary content (hex): {}",
                hex::encode(e.into_bytes())
            )),
        }
    }
}
