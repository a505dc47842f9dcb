//! Key agreement and storage key derivation
//!
//! [`agree`] is plain X25519 Diffie-Hellman over the owner's Ed25519 keys
//! converted to Montgomery form. Agreeing with one's own public key yields a
//! value that is a deterministic function of the private scalar: it gives no
//! forward secrecy and cannot be used to share data with anyone else.
//!
//! The pipeline therefore never uses the raw agreement output as a key.
//! [`derive_storage_key`] runs it through HKDF-SHA256 with a salt and an info
//! string naming the purpose, the cipher suite and the owner. The result is a
//! self-only storage key.

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::cipher::{CipherSuite, KEY_SIZE};
use super::keys::{KeyError, PublicKey, SecretKey};

/// Size of the raw X25519 agreement output
pub const AGREEMENT_SIZE: usize = 32;

const STORAGE_KEY_SALT: &[u8] = b"sealpoint:hkdf-salt:v1";
const STORAGE_KEY_INFO: &[u8] = b"sealpoint:self-storage:v1:";

/// A 256-bit symmetric key used by a [`CipherSuite`]
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct StorageKey([u8; KEY_SIZE]);

impl std::fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StorageKey(..)")
    }
}

impl From<[u8; KEY_SIZE]> for StorageKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        StorageKey(bytes)
    }
}

impl StorageKey {
    /// Get a reference to the key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// Perform X25519 agreement between `secret` and `public`.
///
/// # Errors
///
/// Returns `InvalidKeyMaterial` if `public` does not decompress to an Edwards
/// point, or if the agreement is non-contributory (a low-order point).
pub fn agree(secret: &SecretKey, public: &PublicKey) -> Result<[u8; AGREEMENT_SIZE], KeyError> {
    let their_public = public.to_x25519()?;
    let shared = secret.to_x25519().diffie_hellman(&their_public);
    if !shared.was_contributory() {
        return Err(KeyError::InvalidKeyMaterial(
            "non-contributory key agreement".into(),
        ));
    }
    Ok(shared.to_bytes())
}

/// Derive the self-only storage key for `secret` under `suite`.
///
/// Deterministic: the same owner and suite always derive the same key, which is
/// what lets the owner decrypt later without storing the key anywhere.
pub fn derive_storage_key(secret: &SecretKey, suite: CipherSuite) -> Result<StorageKey, KeyError> {
    let owner = secret.public();
    let mut shared = agree(secret, &owner)?;

    let mut info = Vec::with_capacity(STORAGE_KEY_INFO.len() + 32 + owner.as_bytes().len());
    info.extend_from_slice(STORAGE_KEY_INFO);
    info.extend_from_slice(suite.label().as_bytes());
    info.push(b':');
    info.extend_from_slice(owner.as_bytes());

    let hk = Hkdf::<Sha256>::new(Some(STORAGE_KEY_SALT), &shared);
    let mut okm = [0u8; KEY_SIZE];
    hk.expand(&info, &mut okm)
        .map_err(|_| KeyError::InvalidKeyMaterial("hkdf expand failed".into()))?;
    shared.zeroize();

    Ok(StorageKey(okm))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_agreement_is_symmetric() {
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();

        let ab = agree(&alice, &bob.public()).unwrap();
        let ba = agree(&bob, &alice.public()).unwrap();
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_self_agreement_is_deterministic() {
        let owner = SecretKey::generate();
        let first = agree(&owner, &owner.public()).unwrap();
        let second = agree(&owner, &owner.public()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_storage_key_is_stable_per_owner() {
        let owner = SecretKey::generate();
        let a = derive_storage_key(&owner, CipherSuite::ChaCha20Poly1305).unwrap();
        let b = derive_storage_key(&owner, CipherSuite::ChaCha20Poly1305).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_storage_key_is_not_raw_agreement() {
        let owner = SecretKey::generate();
        let raw = agree(&owner, &owner.public()).unwrap();
        let key = derive_storage_key(&owner, CipherSuite::Aes256Ctr).unwrap();
        assert_ne!(key.bytes(), raw.as_slice());
    }

    #[test]
    fn test_storage_key_separates_owners_and_suites() {
        let alice = SecretKey::generate();
        let bob = SecretKey::generate();

        let alice_aead = derive_storage_key(&alice, CipherSuite::ChaCha20Poly1305).unwrap();
        let alice_ctr = derive_storage_key(&alice, CipherSuite::Aes256Ctr).unwrap();
        let bob_aead = derive_storage_key(&bob, CipherSuite::ChaCha20Poly1305).unwrap();

        assert_ne!(alice_aead, alice_ctr);
        assert_ne!(alice_aead, bob_aead);
    }

    #[test]
    fn test_low_order_point_rejected() {
        // The Edwards identity point (0, 1) has order one
        let mut identity = [0u8; 32];
        identity[0] = 1;
        let public = PublicKey::try_from(identity).unwrap();

        let owner = SecretKey::generate();
        assert!(matches!(
            agree(&owner, &public),
            Err(KeyError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn test_debug_hides_key() {
        let key = StorageKey::from([0xAB; KEY_SIZE]);
        assert_eq!(format!("{:?}", key), "StorageKey(..)");
    }
}
