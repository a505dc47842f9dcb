//! Integration tests for the register / retrieve pipeline

mod common;

use ::common::crypto::{
    derive_storage_key, CipherSuite, IntegrityDigest, SecretKey, CTR_IV_SIZE,
};
use ::common::ledger::{Ledger, LedgerError};
use ::common::linked_data::LocationHandle;
use ::common::registrar::RegistrarError;
use ::common::registry::{derive, Instruction, Record, SignedInstruction};
use ::common::storage::BlobStorage;
use bytes::Bytes;
use sha2::{Digest, Sha256};

#[tokio::test]
async fn test_secret_file_end_to_end() {
    let (registrar, _, _temp) = common::setup_test_env(CipherSuite::Aes256Ctr).await;
    let identity = SecretKey::from([7u8; 32]);
    let owner = identity.public();
    let plaintext = b"secret-file01";
    assert_eq!(plaintext.len(), 13);

    let key = derive_storage_key(&identity, CipherSuite::Aes256Ctr).unwrap();
    let iv = [0x24u8; CTR_IV_SIZE];
    let sealed = CipherSuite::Aes256Ctr
        .seal_with_iv(key.bytes(), &iv, owner.as_bytes(), plaintext)
        .unwrap();
    assert_eq!(sealed.iv(), &iv);
    assert_eq!(sealed.body().len(), 13);

    let registration = registrar
        .register_sealed(&identity, sealed.clone())
        .await
        .unwrap();

    // the published blob is exactly iv || payload
    let published = registrar
        .storage()
        .fetch(&registration.handle)
        .await
        .unwrap();
    assert_eq!(published.len(), CTR_IV_SIZE + 13);
    assert_eq!(&published[..], sealed.as_bytes());

    let expected_digest: [u8; 32] = Sha256::digest(&published).into();
    assert_eq!(registration.digest, IntegrityDigest::from(expected_digest));
    // the digest binds the iv too, not just the 13-byte counter-mode body
    assert_ne!(registration.digest, IntegrityDigest::of(sealed.body()));

    let config = registrar.config();
    let derived = derive(b"user", &owner, &config.program_id).unwrap();
    assert_eq!(registration.address, derived.address);
    assert_eq!(registration.bump, derived.bump);

    let account = registrar
        .ledger()
        .read(&derived.address)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.revision, 1);
    assert_eq!(
        account.record,
        Record {
            owner,
            data_hash: registration.digest,
            uri: registration.uri(),
            bump: derived.bump,
        }
    );

    assert_eq!(registrar.retrieve(&identity).await.unwrap(), plaintext);
}

#[tokio::test]
async fn test_sequential_registrations_replace() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;

    let first = registrar
        .register_encrypted(&identity, b"version one")
        .await
        .unwrap();
    let second = registrar
        .register_encrypted(&identity, b"version two")
        .await
        .unwrap();

    assert_eq!(first.address, second.address);
    assert_ne!(first.handle, second.handle);
    assert_eq!(second.revision, 2);

    let account = registrar.locate(&identity.public()).await.unwrap().unwrap();
    assert_eq!(account.record.uri, second.uri());
    assert_eq!(account.record.data_hash, second.digest);
    assert_eq!(account.record.owner, identity.public());

    assert_eq!(registrar.retrieve(&identity).await.unwrap(), b"version two");
}

#[tokio::test]
async fn test_reregistering_same_blob_is_noop() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;
    let sealed = registrar.seal(&identity, b"payload").unwrap();

    let first = registrar
        .register_sealed(&identity, sealed.clone())
        .await
        .unwrap();
    let again = registrar.register_sealed(&identity, sealed).await.unwrap();

    assert!(first.changed);
    assert!(!again.changed);
    assert_eq!(again.revision, 1);
    assert_eq!(again.handle, first.handle);
}

#[tokio::test]
async fn test_foreign_identity_cannot_write_owner_record() {
    let (registrar, owner, _temp) = common::setup_test_env(CipherSuite::default()).await;
    let intruder = SecretKey::generate();

    let registration = registrar
        .register_encrypted(&owner, b"mine")
        .await
        .unwrap();

    let ix = SignedInstruction::sign(
        &intruder,
        registrar.config().program_id,
        registration.address,
        Some(registration.revision),
        Instruction::Upsert {
            data_hash: IntegrityDigest::of(b"theirs"),
            uri: LocationHandle::for_content(b"theirs").to_string(),
        },
    );
    let err = registrar.ledger().submit(ix).await.unwrap_err();
    assert!(matches!(
        RegistrarError::from(err),
        RegistrarError::AddressMismatch
    ));

    // the intruder registering for themselves lands elsewhere
    let theirs = registrar
        .register_encrypted(&intruder, b"theirs")
        .await
        .unwrap();
    assert_ne!(theirs.address, registration.address);

    let account = registrar.locate(&owner.public()).await.unwrap().unwrap();
    assert_eq!(account.record.owner, owner.public());
    assert_eq!(account.record.uri, registration.uri());
    assert_eq!(registrar.retrieve(&owner).await.unwrap(), b"mine");
}

#[tokio::test]
async fn test_retrieve_detects_digest_mismatch() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;
    let registration = registrar
        .register_encrypted(&identity, b"genuine")
        .await
        .unwrap();

    // point the record at the right blob with the wrong digest
    let ix = SignedInstruction::sign(
        &identity,
        registrar.config().program_id,
        registration.address,
        Some(1),
        Instruction::Upsert {
            data_hash: IntegrityDigest::of(b"something else"),
            uri: registration.uri(),
        },
    );
    registrar.ledger().submit(ix).await.unwrap();

    let err = registrar.retrieve(&identity).await.unwrap_err();
    assert!(matches!(
        err,
        RegistrarError::IntegrityMismatch { actual, .. } if actual == registration.digest
    ));
}

#[tokio::test]
async fn test_retrieve_with_wrong_identity_fails() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;
    registrar
        .register_encrypted(&identity, b"payload")
        .await
        .unwrap();

    let stranger = SecretKey::generate();
    let err = registrar.retrieve(&stranger).await.unwrap_err();
    assert!(matches!(err, RegistrarError::NotRegistered(_)));
}

#[tokio::test]
async fn test_retrieve_missing_blob() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;
    let registration = registrar
        .register_encrypted(&identity, b"payload")
        .await
        .unwrap();

    let orphan = Bytes::from_static(b"never published");
    let ix = SignedInstruction::sign(
        &identity,
        registrar.config().program_id,
        registration.address,
        Some(1),
        Instruction::Upsert {
            data_hash: IntegrityDigest::of(&orphan),
            uri: LocationHandle::for_content(&orphan).to_string(),
        },
    );
    registrar.ledger().submit(ix).await.unwrap();

    let err = registrar.retrieve(&identity).await.unwrap_err();
    assert!(matches!(err, RegistrarError::Fetch(_)));
}

#[tokio::test]
async fn test_close_then_register_again() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;
    registrar
        .register_encrypted(&identity, b"first life")
        .await
        .unwrap();

    let commit = registrar.close(&identity).await.unwrap();
    assert_eq!(commit.revision, None);
    assert!(registrar.locate(&identity.public()).await.unwrap().is_none());

    let again = registrar
        .register_encrypted(&identity, b"second life")
        .await
        .unwrap();
    // revisions continue past the close: 1 live, 2 closed, 3 live again
    assert_eq!(again.revision, 3);
    assert_eq!(registrar.retrieve(&identity).await.unwrap(), b"second life");
}

#[tokio::test]
async fn test_replayed_close_cannot_remove_recreated_record() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;
    let first = registrar
        .register_encrypted(&identity, b"first life")
        .await
        .unwrap();

    let close = SignedInstruction::sign(
        &identity,
        registrar.config().program_id,
        first.address,
        Some(first.revision),
        Instruction::Close,
    );
    registrar.ledger().submit(close.clone()).await.unwrap();

    let again = registrar
        .register_encrypted(&identity, b"second life")
        .await
        .unwrap();

    // resubmitted by anyone holding the old instruction, no key needed
    let err = registrar.ledger().submit(close).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Conflict {
            expected: Some(1),
            actual: Some(3)
        }
    ));

    let account = registrar
        .locate(&identity.public())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.revision, again.revision);
    assert_eq!(registrar.retrieve(&identity).await.unwrap(), b"second life");
}

#[tokio::test]
async fn test_replayed_create_cannot_restore_stale_record() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;
    let owner = identity.public();
    let derived = registrar.address_of(&owner).unwrap();

    let create = SignedInstruction::sign(
        &identity,
        registrar.config().program_id,
        derived.address,
        None,
        Instruction::Upsert {
            data_hash: IntegrityDigest::of(b"stale"),
            uri: LocationHandle::for_content(b"stale").to_string(),
        },
    );
    registrar.ledger().submit(create.clone()).await.unwrap();
    registrar.close(&identity).await.unwrap();
    registrar
        .register_encrypted(&identity, b"fresh")
        .await
        .unwrap();
    registrar.close(&identity).await.unwrap();

    let err = registrar.ledger().submit(create).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Conflict {
            expected: None,
            actual: Some(4)
        }
    ));
    assert!(registrar.locate(&owner).await.unwrap().is_none());
}

#[tokio::test]
async fn test_stale_instruction_is_conflict() {
    let (registrar, identity, _temp) = common::setup_test_env(CipherSuite::default()).await;
    let registration = registrar
        .register_encrypted(&identity, b"payload")
        .await
        .unwrap();

    let ix = SignedInstruction::sign(
        &identity,
        registrar.config().program_id,
        registration.address,
        None,
        Instruction::Close,
    );
    let err = registrar.ledger().submit(ix).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Conflict {
            expected: None,
            actual: Some(1)
        }
    ));
}
