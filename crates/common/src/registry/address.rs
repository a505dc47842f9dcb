//! Deterministic, owner-unique record addresses
//!
//! Addresses follow program-derived-address discipline: SHA-256 over the
//! seeds, a one byte bump, the program id and a fixed marker. The bump is
//! searched from 255 downwards and the first digest that is *not* a valid
//! Ed25519 point wins, so no private key can ever sign for the address.

use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};

use crate::crypto::PublicKey;

/// Size of a registry address in bytes
pub const ADDRESS_SIZE: usize = 32;
/// Longest accepted seed
pub const MAX_SEED_LEN: usize = 32;
/// Most seeds accepted, bump included
pub const MAX_SEEDS: usize = 16;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("seed {index} is {len} bytes, longer than {MAX_SEED_LEN}")]
    MaxSeedLengthExceeded { index: usize, len: usize },
    #[error("{0} seeds given, at most {MAX_SEEDS} allowed")]
    TooManySeeds(usize),
    /// The seeds hash onto the curve and cannot be used as an address
    #[error("seeds produce an on-curve address")]
    OnCurve,
    #[error("no bump seed produced a valid address")]
    DerivationExhausted,
    #[error("invalid address: {0}")]
    Invalid(String),
}

macro_rules! hex_bytes32 {
    ($name:ident) => {
        impl $name {
            pub fn from_hex(hex: &str) -> Result<Self, AddressError> {
                let hex = hex.strip_prefix("0x").unwrap_or(hex);
                let mut buff = [0u8; ADDRESS_SIZE];
                hex::decode_to_slice(hex, &mut buff)
                    .map_err(|e| AddressError::Invalid(e.to_string()))?;
                Ok(Self(buff))
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }

            pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
                &self.0
            }
        }

        impl From<[u8; ADDRESS_SIZE]> for $name {
            fn from(bytes: [u8; ADDRESS_SIZE]) -> Self {
                Self(bytes)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.to_hex())
            }
        }

        impl std::str::FromStr for $name {
            type Err = AddressError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Identifier of the registry program that owns every record address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId([u8; ADDRESS_SIZE]);
hex_bytes32!(ProgramId);

impl Default for ProgramId {
    fn default() -> Self {
        ProgramId(Sha256::digest(b"sealpoint:registry-program:v1").into())
    }
}

/// Location of one owner's record in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistryAddress([u8; ADDRESS_SIZE]);
hex_bytes32!(RegistryAddress);

/// An address together with the bump that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedAddress {
    pub address: RegistryAddress,
    pub bump: u8,
}

/// Whether 32 bytes decompress to a point on the Ed25519 curve.
pub fn is_on_curve(bytes: &[u8; ADDRESS_SIZE]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Hash `seeds` into an address, rejecting on-curve results.
///
/// The last seed is usually the bump.
pub fn create_program_address(
    seeds: &[&[u8]],
    program_id: &ProgramId,
) -> Result<RegistryAddress, AddressError> {
    if seeds.len() > MAX_SEEDS {
        return Err(AddressError::TooManySeeds(seeds.len()));
    }
    for (index, seed) in seeds.iter().enumerate() {
        if seed.len() > MAX_SEED_LEN {
            return Err(AddressError::MaxSeedLengthExceeded {
                index,
                len: seed.len(),
            });
        }
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_bytes());
    hasher.update(PDA_MARKER);
    let hash: [u8; ADDRESS_SIZE] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return Err(AddressError::OnCurve);
    }
    Ok(RegistryAddress(hash))
}

/// Search bumps 255..=0 for the first off-curve address over `seeds`.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &ProgramId,
) -> Result<DerivedAddress, AddressError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(AddressError::TooManySeeds(seeds.len() + 1));
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);

        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok(DerivedAddress { address, bump }),
            Err(AddressError::OnCurve) => continue,
            Err(err) => return Err(err),
        }
    }

    Err(AddressError::DerivationExhausted)
}

/// Derive the record address for `owner` under `domain_tag`.
///
/// Seeds are the tag and the owner's full 32 public key bytes; nothing is
/// truncated, so distinct owners collide only if SHA-256 does.
pub fn derive(
    domain_tag: &[u8],
    owner: &PublicKey,
    program_id: &ProgramId,
) -> Result<DerivedAddress, AddressError> {
    find_program_address(&[domain_tag, owner.as_bytes()], program_id)
}
