use clap::Args;
use common::registrar::RegistrarError;

use crate::state::StateError;

/// Remove the local key's record. The published blob is not deleted.
#[derive(Args, Debug, Clone)]
pub struct Close;

#[derive(Debug, thiserror::Error)]
pub enum CloseError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error("close failed: {0}")]
    Registrar(#[from] RegistrarError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Close {
    type Error = CloseError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let key = state.load_key()?;
        let registrar = state.registrar().await?;
        let commit = registrar.close(&key).await?;
        Ok(format!("Closed record at {}", commit.address))
    }
}
