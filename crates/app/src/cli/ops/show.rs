use clap::Args;
use common::registrar::RegistrarError;

use super::{owner_or_self, OwnerError};
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Show {
    /// Owner public key as hex (defaults to the local key)
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Owner(#[from] OwnerError),
    #[error("lookup failed: {0}")]
    Registrar(#[from] RegistrarError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Show {
    type Error = ShowError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let owner = owner_or_self(self.owner.as_deref(), &state)?;
        let registrar = state.registrar().await?;
        let derived = registrar.address_of(&owner)?;

        match registrar.locate(&owner).await? {
            Some(account) => Ok(format!(
                "Record at {}\n\
                 - Owner: {}\n\
                 - Uri: {}\n\
                 - Digest: {}\n\
                 - Bump: {}\n\
                 - Revision: {}",
                derived.address,
                account.record.owner,
                account.record.uri,
                account.record.data_hash,
                account.record.bump,
                account.revision,
            )),
            None => Ok(format!("No record at {}", derived.address)),
        }
    }
}
