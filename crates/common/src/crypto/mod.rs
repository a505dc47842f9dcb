//! Cryptographic primitives for sealpoint
//!
//! - **Identity**: Ed25519 keypairs (`SecretKey`/`PublicKey`) identify record owners
//!   and sign registry instructions
//! - **Key agreement**: X25519 agreement after Edwards-to-Montgomery conversion,
//!   fed through HKDF to derive a self-only storage key
//! - **Sealing**: ChaCha20-Poly1305 (default) or AES-256-CTR over the payload,
//!   producing `iv || ciphertext`
//! - **Integrity**: SHA-256 over the exact sealed bytes that get published
//!
//! # Security Model
//!
//! The storage key is a deterministic function of the owner's private key. It
//! protects data the owner stores for themselves; it is not a sharing
//! primitive and offers no forward secrecy. Sharing with a third party would
//! need a per-recipient agreement instead.

mod agreement;
mod cipher;
mod digest;
mod keys;

pub use agreement::{agree, derive_storage_key, StorageKey, AGREEMENT_SIZE};
pub use cipher::{
    ctr_apply, CipherError, CipherSuite, SealedBlob, AEAD_NONCE_SIZE, AEAD_TAG_SIZE, CTR_IV_SIZE,
    KEY_SIZE,
};
pub use digest::{IntegrityDigest, DIGEST_SIZE};
pub use ed25519_dalek::Signature;
pub use keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};
