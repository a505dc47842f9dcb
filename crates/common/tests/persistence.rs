//! Integration tests for registrations surviving a restart

mod common;

use ::common::crypto::{CipherSuite, SecretKey};
use tempfile::TempDir;

#[tokio::test]
async fn test_registration_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = common::fast_config(CipherSuite::default());
    let identity = SecretKey::generate();

    let registration = {
        let registrar = common::open_registrar(temp_dir.path(), config.clone()).await;
        registrar
            .register_encrypted(&identity, b"persisted payload")
            .await
            .unwrap()
    };

    let registrar = common::open_registrar(temp_dir.path(), config).await;
    let account = registrar.locate(&identity.public()).await.unwrap().unwrap();
    assert_eq!(account.revision, registration.revision);
    assert_eq!(account.record.uri, registration.uri());

    assert_eq!(
        registrar.retrieve(&identity).await.unwrap(),
        b"persisted payload"
    );

    let next = registrar
        .register_encrypted(&identity, b"after restart")
        .await
        .unwrap();
    assert_eq!(next.revision, 2);
}

#[tokio::test]
async fn test_suite_mismatch_cannot_open() {
    let temp_dir = TempDir::new().unwrap();
    let identity = SecretKey::generate();

    let registrar = common::open_registrar(
        temp_dir.path(),
        common::fast_config(CipherSuite::ChaCha20Poly1305),
    )
    .await;
    registrar
        .register_encrypted(&identity, b"sealed with aead")
        .await
        .unwrap();
    drop(registrar);

    // counter mode derives a different key, so the plaintext never comes back
    let registrar =
        common::open_registrar(temp_dir.path(), common::fast_config(CipherSuite::Aes256Ctr)).await;
    let recovered = registrar.retrieve(&identity).await.unwrap();
    assert_ne!(recovered, b"sealed with aead");
}
