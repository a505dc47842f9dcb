//! Symmetric sealing of payloads
//!
//! A sealed blob is `iv || encrypted payload`. Two suites are supported:
//!
//! - **ChaCha20-Poly1305** (default): authenticated; the payload carries a
//!   16 byte tag and the owner's public key is bound in as associated data.
//! - **AES-256-CTR**: unauthenticated counter mode with a 16 byte iv and a
//!   128-bit big-endian counter. Ciphertext length equals plaintext length.
//!   Integrity rests entirely on the registry's digest of the sealed blob.
//!
//! Every call to [`CipherSuite::seal`] draws a fresh iv from the OS CSPRNG.

use aes::Aes256;
use bytes::Bytes;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use ctr::cipher::{KeyIvInit, StreamCipher};
use serde::{Deserialize, Serialize};

use super::agreement::StorageKey;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// Size of a symmetric key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;
/// Size of the AES-256-CTR initialization vector in bytes
pub const CTR_IV_SIZE: usize = 16;
/// Size of the ChaCha20-Poly1305 nonce in bytes
pub const AEAD_NONCE_SIZE: usize = 12;
/// Size of the Poly1305 authentication tag in bytes
pub const AEAD_TAG_SIZE: usize = 16;

/// Errors that can occur while sealing or opening a blob
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key length, expected {expected}, got {got}")]
    InvalidKeyLength { expected: usize, got: usize },
    #[error("invalid iv length, expected {expected}, got {got}")]
    InvalidIvLength { expected: usize, got: usize },
    #[error("sealed blob too short: {0} bytes")]
    Truncated(usize),
    #[error("decrypt error")]
    Decrypt,
    #[error("encrypt error")]
    Encrypt,
    #[error("failed to generate iv: {0}")]
    Random(String),
}

/// The symmetric construction used to seal payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CipherSuite {
    #[default]
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
    #[serde(rename = "aes-256-ctr")]
    Aes256Ctr,
}

impl std::fmt::Display for CipherSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl CipherSuite {
    /// Stable label, also mixed into key derivation
    pub fn label(&self) -> &'static str {
        match self {
            CipherSuite::ChaCha20Poly1305 => "chacha20-poly1305",
            CipherSuite::Aes256Ctr => "aes-256-ctr",
        }
    }

    /// Length of the iv prefix of a sealed blob
    pub fn iv_size(&self) -> usize {
        match self {
            CipherSuite::ChaCha20Poly1305 => AEAD_NONCE_SIZE,
            CipherSuite::Aes256Ctr => CTR_IV_SIZE,
        }
    }

    /// Bytes the suite adds on top of the plaintext, iv excluded
    pub fn overhead(&self) -> usize {
        match self {
            CipherSuite::ChaCha20Poly1305 => AEAD_TAG_SIZE,
            CipherSuite::Aes256Ctr => 0,
        }
    }

    /// Seal `plaintext` under a freshly generated iv.
    ///
    /// `aad` is authenticated by the AEAD suite and ignored by counter mode.
    pub fn seal(
        &self,
        key: &StorageKey,
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<SealedBlob, CipherError> {
        let mut iv = vec![0u8; self.iv_size()];
        getrandom::getrandom(&mut iv).map_err(|e| CipherError::Random(e.to_string()))?;
        self.seal_with_iv(key.bytes(), &iv, aad, plaintext)
    }

    /// Seal `plaintext` under a caller-supplied iv.
    ///
    /// Reusing an iv with the same key breaks confidentiality; outside of
    /// fixed test vectors use [`CipherSuite::seal`].
    pub fn seal_with_iv(
        &self,
        key: &[u8],
        iv: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<SealedBlob, CipherError> {
        check_len(key, KEY_SIZE).map_err(|got| CipherError::InvalidKeyLength {
            expected: KEY_SIZE,
            got,
        })?;
        check_len(iv, self.iv_size()).map_err(|got| CipherError::InvalidIvLength {
            expected: self.iv_size(),
            got,
        })?;

        let body = match self {
            CipherSuite::ChaCha20Poly1305 => {
                let cipher =
                    ChaCha20Poly1305::new_from_slice(key).map_err(|_| CipherError::Encrypt)?;
                cipher
                    .encrypt(Nonce::from_slice(iv), Payload { msg: plaintext, aad })
                    .map_err(|_| CipherError::Encrypt)?
            }
            CipherSuite::Aes256Ctr => ctr_apply(key, iv, plaintext)?,
        };

        let mut out = Vec::with_capacity(iv.len() + body.len());
        out.extend_from_slice(iv);
        out.extend_from_slice(&body);

        Ok(SealedBlob {
            suite: *self,
            bytes: Bytes::from(out),
        })
    }

    /// Open a sealed blob produced by this suite.
    pub fn open(&self, key: &[u8], aad: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CipherError> {
        check_len(key, KEY_SIZE).map_err(|got| CipherError::InvalidKeyLength {
            expected: KEY_SIZE,
            got,
        })?;
        if sealed.len() < self.iv_size() + self.overhead() {
            return Err(CipherError::Truncated(sealed.len()));
        }
        let (iv, body) = sealed.split_at(self.iv_size());

        match self {
            CipherSuite::ChaCha20Poly1305 => {
                let cipher =
                    ChaCha20Poly1305::new_from_slice(key).map_err(|_| CipherError::Decrypt)?;
                cipher
                    .decrypt(Nonce::from_slice(iv), Payload { msg: body, aad })
                    .map_err(|_| CipherError::Decrypt)
            }
            CipherSuite::Aes256Ctr => ctr_apply(key, iv, body),
        }
    }
}

/// Apply the AES-256-CTR keystream to `data`.
///
/// Encryption and decryption are the same operation.
pub fn ctr_apply(key: &[u8], iv: &[u8], data: &[u8]) -> Result<Vec<u8>, CipherError> {
    check_len(key, KEY_SIZE).map_err(|got| CipherError::InvalidKeyLength {
        expected: KEY_SIZE,
        got,
    })?;
    check_len(iv, CTR_IV_SIZE).map_err(|got| CipherError::InvalidIvLength {
        expected: CTR_IV_SIZE,
        got,
    })?;

    let mut cipher = Aes256Ctr::new_from_slices(key, iv).map_err(|_| CipherError::Encrypt)?;
    let mut buf = data.to_vec();
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}

fn check_len(bytes: &[u8], expected: usize) -> Result<(), usize> {
    if bytes.len() == expected {
        Ok(())
    } else {
        Err(bytes.len())
    }
}

/// Immutable `iv || encrypted payload` bytes, exactly as published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBlob {
    suite: CipherSuite,
    bytes: Bytes,
}

impl SealedBlob {
    /// Wrap bytes fetched from storage, checking they are long enough for `suite`.
    pub fn from_bytes(suite: CipherSuite, bytes: Bytes) -> Result<Self, CipherError> {
        if bytes.len() < suite.iv_size() + suite.overhead() {
            return Err(CipherError::Truncated(bytes.len()));
        }
        Ok(Self { suite, bytes })
    }

    pub fn suite(&self) -> CipherSuite {
        self.suite
    }

    /// The iv prefix
    pub fn iv(&self) -> &[u8] {
        &self.bytes[..self.suite.iv_size()]
    }

    /// The encrypted payload (plus tag, for the AEAD suite)
    pub fn body(&self) -> &[u8] {
        &self.bytes[self.suite.iv_size()..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Cheap clone of the underlying buffer for publishing
    pub fn to_bytes(&self) -> Bytes {
        self.bytes.clone()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decrypt with the key and associated data it was sealed under.
    pub fn open(&self, key: &StorageKey, aad: &[u8]) -> Result<Vec<u8>, CipherError> {
        self.suite.open(key.bytes(), aad, &self.bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn key() -> StorageKey {
        StorageKey::from([0x42; KEY_SIZE])
    }

    #[test]
    fn test_seal_open_round_trip() {
        let data = b"hello world, this is a test message for encryption";
        for suite in [CipherSuite::ChaCha20Poly1305, CipherSuite::Aes256Ctr] {
            let sealed = suite.seal(&key(), b"owner", data).unwrap();
            assert_eq!(sealed.len(), suite.iv_size() + data.len() + suite.overhead());
            assert_eq!(sealed.open(&key(), b"owner").unwrap(), data.to_vec());
        }
    }

    #[test]
    fn test_fresh_iv_per_seal() {
        let data = b"same plaintext";
        for suite in [CipherSuite::ChaCha20Poly1305, CipherSuite::Aes256Ctr] {
            let a = suite.seal(&key(), b"", data).unwrap();
            let b = suite.seal(&key(), b"", data).unwrap();
            assert_ne!(a.iv(), b.iv());
            assert_ne!(a.as_bytes(), b.as_bytes());
        }
    }

    #[test]
    fn test_ctr_preserves_length() {
        let plaintext = b"secret-file01";
        let iv = [7u8; CTR_IV_SIZE];
        let ciphertext = ctr_apply(key().bytes(), &iv, plaintext).unwrap();
        assert_eq!(ciphertext.len(), plaintext.len());
        assert_ne!(&ciphertext[..], plaintext);
        assert_eq!(ctr_apply(key().bytes(), &iv, &ciphertext).unwrap(), plaintext);
    }

    #[test]
    fn test_ctr_known_answer() {
        // NIST SP 800-38A F.5.5 CTR-AES256.Encrypt, first block
        let key = hex::decode("603deb1015ca71be2b73aef0857d77811f352c073b6108d72d9810a30914dff4")
            .unwrap();
        let iv = hex::decode("f0f1f2f3f4f5f6f7f8f9fafbfcfdfeff").unwrap();
        let plaintext = hex::decode("6bc1bee22e409f96e93d7e117393172a").unwrap();
        let expected = hex::decode("601ec313775789a5b7a7f504bbf3d228").unwrap();

        assert_eq!(ctr_apply(&key, &iv, &plaintext).unwrap(), expected);
    }

    #[test]
    fn test_invalid_lengths() {
        assert_eq!(
            ctr_apply(&[0u8; 16], &[0u8; CTR_IV_SIZE], b"x"),
            Err(CipherError::InvalidKeyLength {
                expected: KEY_SIZE,
                got: 16
            })
        );
        assert_eq!(
            ctr_apply(key().bytes(), &[0u8; 12], b"x"),
            Err(CipherError::InvalidIvLength {
                expected: CTR_IV_SIZE,
                got: 12
            })
        );
        assert!(matches!(
            CipherSuite::ChaCha20Poly1305.seal_with_iv(key().bytes(), &[0u8; 16], b"", b"x"),
            Err(CipherError::InvalidIvLength { expected: 12, got: 16 })
        ));
    }

    #[test]
    fn test_aead_detects_tampering() {
        let suite = CipherSuite::ChaCha20Poly1305;
        let sealed = suite.seal(&key(), b"owner", b"payload").unwrap();

        let mut tampered = sealed.as_bytes().to_vec();
        let last = tampered.len() - 1;
        tampered[last] ^= 0xFF;
        assert_eq!(
            suite.open(key().bytes(), b"owner", &tampered),
            Err(CipherError::Decrypt)
        );

        // Associated data is bound too
        assert_eq!(sealed.open(&key(), b"someone else"), Err(CipherError::Decrypt));
    }

    #[test]
    fn test_truncated_blob() {
        let short = Bytes::from_static(&[0u8; 4]);
        assert_eq!(
            SealedBlob::from_bytes(CipherSuite::Aes256Ctr, short.clone()),
            Err(CipherError::Truncated(4))
        );
        assert_eq!(
            CipherSuite::ChaCha20Poly1305.open(key().bytes(), b"", &short),
            Err(CipherError::Truncated(4))
        );
    }

    #[test]
    fn test_empty_plaintext() {
        let suite = CipherSuite::ChaCha20Poly1305;
        let sealed = suite.seal(&key(), b"", b"").unwrap();
        assert_eq!(sealed.body().len(), AEAD_TAG_SIZE);
        assert!(sealed.open(&key(), b"").unwrap().is_empty());
    }
}
