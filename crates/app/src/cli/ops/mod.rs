pub mod address;
pub mod close;
pub mod fetch;
pub mod init;
pub mod register;
pub mod show;
pub mod version;

pub use address::Address;
pub use close::Close;
pub use fetch::Fetch;
pub use init::Init;
pub use register::Register;
pub use show::Show;
pub use version::Version;

use common::crypto::{KeyError, PublicKey};

/// Resolve `--owner`, falling back to the local key's public half.
pub(crate) fn owner_or_self(
    owner: Option<&str>,
    state: &crate::state::AppState,
) -> Result<PublicKey, OwnerError> {
    match owner {
        Some(hex) => Ok(PublicKey::from_hex(hex)?),
        None => Ok(state.load_key()?.public()),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OwnerError {
    #[error("invalid owner: {0}")]
    Key(#[from] KeyError),
    #[error(transparent)]
    State(#[from] crate::state::StateError),
}
