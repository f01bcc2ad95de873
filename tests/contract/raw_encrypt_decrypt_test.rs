//! RawEncrypt and RawDecrypt contract tests
//!
//! Mirrors the behavior clients see from the hosted service for
//! RAW_ENCRYPT_DECRYPT keys.

mod common;

use common::*;
use fakekms::messages::{CreateCryptoKeyRequest, RawDecryptRequest, RawEncryptRequest};
use fakekms::{
    Code, CryptoKeyPurpose, CryptoKeyVersionAlgorithm, CryptoKeyVersionState,
    CryptoKeyVersionTemplate, KeyManagementService, ProtectionLevel,
};

const MISSING_VERSION: &str =
    "projects/fakekms-test/locations/global/keyRings/contract/cryptoKeys/missing/cryptoKeyVersions/1";

async fn raw_key(client: &fakekms::KmsClient, algorithm: CryptoKeyVersionAlgorithm) -> String {
    let key = crypto_key(client, "raw", CryptoKeyPurpose::RawEncryptDecrypt, Some(algorithm)).await;
    version_name(&key, 1)
}

#[tokio::test]
async fn test_raw_round_trip() {
    let client = client();

    for (id, algorithm) in [
        ("raw-128", CryptoKeyVersionAlgorithm::Aes128Gcm),
        ("raw-256", CryptoKeyVersionAlgorithm::Aes256Gcm),
    ] {
        let key = crypto_key(&client, id, CryptoKeyPurpose::RawEncryptDecrypt, Some(algorithm)).await;
        let name = version_name(&key, 1);

        let encrypted = client
            .raw_encrypt(RawEncryptRequest {
                name: name.clone(),
                plaintext: b"raw plaintext".to_vec(),
                additional_authenticated_data: b"aad".to_vec(),
                ..Default::default()
            })
            .await
            .expect("Failed to raw encrypt");

        assert_eq!(encrypted.name, name);
        assert_eq!(encrypted.tag_length, 16);
        assert_eq!(encrypted.initialization_vector.len(), 12);
        assert_eq!(encrypted.ciphertext.len(), b"raw plaintext".len() + 16);
        assert_eq!(encrypted.ciphertext_crc32c, crc32c::crc32c(&encrypted.ciphertext));

        let decrypted = client
            .raw_decrypt(RawDecryptRequest {
                name: name.clone(),
                ciphertext: encrypted.ciphertext.clone(),
                additional_authenticated_data: b"aad".to_vec(),
                initialization_vector: encrypted.initialization_vector.clone(),
                tag_length: encrypted.tag_length,
                ciphertext_crc32c: Some(encrypted.ciphertext_crc32c),
                initialization_vector_crc32c: Some(encrypted.initialization_vector_crc32c),
                ..Default::default()
            })
            .await
            .expect("Failed to raw decrypt");

        assert_eq!(decrypted.plaintext, b"raw plaintext");
        assert!(decrypted.verified_ciphertext_crc32c);
        assert!(decrypted.verified_initialization_vector_crc32c);
        assert!(!decrypted.verified_additional_authenticated_data_crc32c);
        println!("✅ Raw round trip with {}", algorithm);
    }
}

#[tokio::test]
async fn test_hsm_round_trip() {
    let client = client();
    let parent = key_ring(&client).await;

    let key = client
        .create_crypto_key_and_wait_for_first_version(CreateCryptoKeyRequest {
            parent,
            crypto_key_id: "raw-hsm".to_string(),
            purpose: Some(CryptoKeyPurpose::RawEncryptDecrypt),
            version_template: Some(CryptoKeyVersionTemplate {
                algorithm: Some(CryptoKeyVersionAlgorithm::Aes256Gcm),
                protection_level: ProtectionLevel::Hsm,
            }),
            ..Default::default()
        })
        .await
        .expect("Failed to create crypto key");
    let name = version_name(&key, 1);

    let encrypted = client
        .raw_encrypt(RawEncryptRequest {
            name: name.clone(),
            plaintext: b"hsm plaintext".to_vec(),
            additional_authenticated_data: b"hsm aad".to_vec(),
            ..Default::default()
        })
        .await
        .expect("Failed to raw encrypt");
    assert_eq!(encrypted.tag_length, 16);
    assert_eq!(encrypted.protection_level, ProtectionLevel::Hsm);

    let decrypted = client
        .raw_decrypt(RawDecryptRequest {
            name,
            ciphertext: encrypted.ciphertext,
            additional_authenticated_data: b"hsm aad".to_vec(),
            initialization_vector: encrypted.initialization_vector,
            ..Default::default()
        })
        .await
        .expect("Failed to raw decrypt");
    assert_eq!(decrypted.plaintext, b"hsm plaintext");
    assert_eq!(decrypted.plaintext_crc32c, crc32c::crc32c(b"hsm plaintext"));
    assert_eq!(decrypted.protection_level, ProtectionLevel::Hsm);
}

#[tokio::test]
async fn test_raw_encrypt_not_found() {
    let client = client();
    key_ring(&client).await;

    let err = client
        .raw_encrypt(RawEncryptRequest {
            name: MISSING_VERSION.to_string(),
            plaintext: b"plaintext".to_vec(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn test_raw_decrypt_not_found() {
    let client = client();
    key_ring(&client).await;

    let err = client
        .raw_decrypt(RawDecryptRequest {
            name: MISSING_VERSION.to_string(),
            ciphertext: b"ciphertext".to_vec(),
            initialization_vector: b"iv".to_vec(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn test_raw_ops_reject_other_purposes() {
    let client = client();
    let key = crypto_key(&client, "symmetric", CryptoKeyPurpose::EncryptDecrypt, None).await;
    let name = version_name(&key, 1);

    let err = client
        .raw_encrypt(RawEncryptRequest {
            name: name.clone(),
            plaintext: b"plaintext".to_vec(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);

    let err = client
        .raw_decrypt(RawDecryptRequest {
            name,
            ciphertext: b"ciphertext".to_vec(),
            initialization_vector: b"iv".to_vec(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);
}

#[tokio::test]
async fn test_raw_ops_require_enabled_version() {
    let client = client();
    let name = raw_key(&client, CryptoKeyVersionAlgorithm::Aes256Gcm).await;
    set_state(&client, &name, CryptoKeyVersionState::Disabled).await;

    let err = client
        .raw_encrypt(RawEncryptRequest {
            name: name.clone(),
            plaintext: b"plaintext".to_vec(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);

    let err = client
        .raw_decrypt(RawDecryptRequest {
            name,
            ciphertext: b"ciphertext".to_vec(),
            initialization_vector: b"iv".to_vec(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);
}

#[tokio::test]
async fn test_caller_iv_rejected_before_lookup() {
    let client = client();

    let err = client
        .raw_encrypt(RawEncryptRequest {
            name: MISSING_VERSION.to_string(),
            plaintext: b"plaintext".to_vec(),
            initialization_vector: vec![0; 12],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert!(err.message().contains("initialization_vector"));
}

#[tokio::test]
async fn test_raw_decrypt_argument_checks() {
    let client = client();
    let name = raw_key(&client, CryptoKeyVersionAlgorithm::Aes128Gcm).await;

    let encrypted = client
        .raw_encrypt(RawEncryptRequest {
            name: name.clone(),
            plaintext: b"plaintext".to_vec(),
            ..Default::default()
        })
        .await
        .expect("Failed to raw encrypt");

    let valid = RawDecryptRequest {
        name,
        ciphertext: encrypted.ciphertext.clone(),
        initialization_vector: encrypted.initialization_vector.clone(),
        ..Default::default()
    };

    let cases = [
        RawDecryptRequest {
            tag_length: 12,
            ..valid.clone()
        },
        RawDecryptRequest {
            initialization_vector: b"iv".to_vec(),
            ..valid.clone()
        },
        RawDecryptRequest {
            ciphertext: vec![1; 8],
            ..valid.clone()
        },
        RawDecryptRequest {
            additional_authenticated_data: b"wrong aad".to_vec(),
            ..valid.clone()
        },
        RawDecryptRequest {
            ciphertext_crc32c: Some(crc32c::crc32c(&encrypted.ciphertext) ^ 1),
            ..valid.clone()
        },
    ];

    for request in cases {
        let err = client.raw_decrypt(request).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument, "{}", err);
    }

    let decrypted = client.raw_decrypt(valid).await.expect("Failed to raw decrypt");
    assert_eq!(decrypted.plaintext, b"plaintext");
}
