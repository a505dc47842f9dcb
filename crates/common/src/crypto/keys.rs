//! Owner identity keys.
//!
//! An owner is an Ed25519 keypair. The public half names the owner on the
//! registry and seeds its record address; the secret half signs registry
//! instructions and, mapped onto Curve25519, feeds the self-agreement that
//! yields the storage key.

use std::str::FromStr;

use curve25519_dalek::edwards::CompressedEdwardsY;
use ed25519_dalek::{Signature, SignatureError, Signer, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as MontgomeryPublic, StaticSecret};

pub const PRIVATE_KEY_SIZE: usize = 32;
pub const PUBLIC_KEY_SIZE: usize = 32;

const PEM_TAG: &str = "PRIVATE KEY";

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),
    #[error("pem error: {0}")]
    Pem(String),
    #[error("failed to draw key material: {0}")]
    Random(String),
}

/// Copy exactly `N` bytes out of `raw`, naming `what` on mismatch.
fn fixed<const N: usize>(raw: &[u8], what: &str) -> Result<[u8; N], KeyError> {
    <[u8; N]>::try_from(raw).map_err(|_| {
        KeyError::InvalidKeyMaterial(format!(
            "{what} must be {N} bytes, got {}",
            raw.len()
        ))
    })
}

/// Decode hex (optionally `0x`-prefixed) into exactly `N` bytes.
fn fixed_from_hex<const N: usize>(text: &str, what: &str) -> Result<[u8; N], KeyError> {
    let text = text.strip_prefix("0x").unwrap_or(text);
    let raw = hex::decode(text)
        .map_err(|e| KeyError::InvalidKeyMaterial(format!("{what} is not hex: {e}")))?;
    fixed(&raw, what)
}

/// Public identity of a record owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey(VerifyingKey);

impl TryFrom<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    type Error = KeyError;

    fn try_from(raw: [u8; PUBLIC_KEY_SIZE]) -> Result<Self, Self::Error> {
        let key = VerifyingKey::from_bytes(&raw).map_err(|_| {
            KeyError::InvalidKeyMaterial("public key is not a curve point".into())
        })?;
        Ok(PublicKey(key))
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from(fixed::<PUBLIC_KEY_SIZE>(raw, "public key")?)
    }
}

impl FromStr for PublicKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl PublicKey {
    /// Parse plain or `0x`-prefixed hex.
    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        Self::try_from(fixed_from_hex::<PUBLIC_KEY_SIZE>(text, "public key")?)
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.0.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }

    /// Map the Edwards point onto its Montgomery form for X25519.
    #[allow(clippy::wrong_self_convention)]
    pub(crate) fn to_x25519(&self) -> Result<MontgomeryPublic, KeyError> {
        let point = CompressedEdwardsY(self.to_bytes())
            .decompress()
            .ok_or_else(|| KeyError::InvalidKeyMaterial("public key does not decompress".into()))?;
        Ok(MontgomeryPublic::from(point.to_montgomery().to_bytes()))
    }

    /// Strict Ed25519 verification; rejects small-order and malleable forms.
    pub fn verify(&self, msg: &[u8], signature: &Signature) -> Result<(), SignatureError> {
        self.0.verify_strict(msg, signature)
    }
}

/// Secret half of an owner identity. Never leaves the process.
///
/// Persisted as a PEM block tagged `PRIVATE KEY` holding the raw 32-byte seed.
#[derive(Clone)]
pub struct SecretKey(SigningKey);

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey({})", self.public())
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(seed: [u8; PRIVATE_KEY_SIZE]) -> Self {
        SecretKey(SigningKey::from_bytes(&seed))
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = KeyError;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        Ok(Self::from(fixed::<PRIVATE_KEY_SIZE>(raw, "secret key")?))
    }
}

impl SecretKey {
    /// Draw a fresh key from the OS CSPRNG.
    pub fn try_generate() -> Result<Self, KeyError> {
        let mut seed = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut seed).map_err(|e| KeyError::Random(e.to_string()))?;
        Ok(Self::from(seed))
    }

    /// Like [`SecretKey::try_generate`], for tests and callers with no way
    /// to recover from a missing OS RNG.
    ///
    /// # Panics
    ///
    /// If the OS RNG is unavailable.
    pub fn generate() -> Self {
        Self::try_generate().expect("failed to generate random bytes")
    }

    /// Parse plain or `0x`-prefixed hex.
    pub fn from_hex(text: &str) -> Result<Self, KeyError> {
        Ok(Self::from(fixed_from_hex::<PRIVATE_KEY_SIZE>(
            text,
            "secret key",
        )?))
    }

    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0.to_bytes()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new(PEM_TAG, self.to_bytes()))
    }

    pub fn from_pem(text: &str) -> Result<Self, KeyError> {
        let block = pem::parse(text).map_err(|e| KeyError::Pem(e.to_string()))?;
        if block.tag() != PEM_TAG {
            return Err(KeyError::Pem(format!(
                "expected a {PEM_TAG} block, found {}",
                block.tag()
            )));
        }
        Self::try_from(block.contents())
    }

    /// The clamped Ed25519 scalar doubles as the X25519 secret, pairing with
    /// [`PublicKey::to_x25519`].
    pub(crate) fn to_x25519(&self) -> StaticSecret {
        StaticSecret::from(self.0.to_scalar_bytes())
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.0.sign(msg)
    }
}
