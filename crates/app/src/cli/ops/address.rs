use clap::Args;
use common::registrar::RegistrarError;

use super::{owner_or_self, OwnerError};
use crate::state::StateError;

#[derive(Args, Debug, Clone)]
pub struct Address {
    /// Owner public key as hex (defaults to the local key)
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum AddressError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Owner(#[from] OwnerError),
    #[error(transparent)]
    Registrar(#[from] RegistrarError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Address {
    type Error = AddressError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let state = ctx.state()?;
        let owner = owner_or_self(self.owner.as_deref(), &state)?;
        let config = &state.config.registrar;
        let registrar = state.registrar().await?;
        let derived = registrar.address_of(&owner)?;

        Ok(format!(
            "{}\n\
             - Owner: {}\n\
             - Domain tag: {}\n\
             - Program: {}\n\
             - Bump: {}",
            derived.address, owner, config.domain_tag, config.program_id, derived.bump,
        ))
    }
}
