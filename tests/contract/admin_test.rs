//! Key ring, crypto key and version administration

mod common;

use common::*;
use fakekms::messages::{
    CreateCryptoKeyRequest, CreateKeyRingRequest, GetCryptoKeyRequest, GetKeyRingRequest,
    ListCryptoKeyVersionsRequest, ListCryptoKeysRequest, ListKeyRingsRequest,
    UpdateCryptoKeyPrimaryVersionRequest, UpdateCryptoKeyRequest,
};
use fakekms::{
    Code, CryptoKeyPurpose, CryptoKeyVersionAlgorithm, CryptoKeyVersionState,
    CryptoKeyVersionTemplate, KeyManagementService, ProtectionLevel,
};
use std::collections::BTreeMap;

#[tokio::test]
async fn test_key_rings() {
    let client = client();

    for id in ["b-ring", "a-ring"] {
        client
            .create_key_ring(CreateKeyRingRequest {
                parent: LOCATION.to_string(),
                key_ring_id: id.to_string(),
            })
            .await
            .expect("Failed to create key ring");
    }

    let err = client
        .create_key_ring(CreateKeyRingRequest {
            parent: LOCATION.to_string(),
            key_ring_id: "a-ring".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::AlreadyExists);

    let listed = client
        .list_key_rings(ListKeyRingsRequest {
            parent: LOCATION.to_string(),
        })
        .await
        .expect("Failed to list key rings");
    let names: Vec<_> = listed.key_rings.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        [
            format!("{}/keyRings/a-ring", LOCATION),
            format!("{}/keyRings/b-ring", LOCATION),
        ]
    );

    let other = client
        .list_key_rings(ListKeyRingsRequest {
            parent: "projects/other/locations/global".to_string(),
        })
        .await
        .expect("Failed to list key rings");
    assert!(other.key_rings.is_empty());

    let err = client
        .get_key_ring(GetKeyRingRequest {
            name: format!("{}/keyRings/missing", LOCATION),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn test_create_crypto_key_errors() {
    let client = client();
    let parent = key_ring(&client).await;
    crypto_key(&client, "taken", CryptoKeyPurpose::EncryptDecrypt, None).await;

    let request = |id: &str, purpose, algorithm| CreateCryptoKeyRequest {
        parent: parent.clone(),
        crypto_key_id: id.to_string(),
        purpose,
        version_template: Some(CryptoKeyVersionTemplate {
            algorithm,
            ..Default::default()
        }),
        ..Default::default()
    };

    let cases = [
        (request("taken", Some(CryptoKeyPurpose::EncryptDecrypt), None), Code::AlreadyExists),
        (request("no-purpose", None, None), Code::InvalidArgument),
        (request("no-algorithm", Some(CryptoKeyPurpose::AsymmetricSign), None), Code::InvalidArgument),
        (
            request(
                "mismatched",
                Some(CryptoKeyPurpose::Mac),
                Some(CryptoKeyVersionAlgorithm::Aes256Gcm),
            ),
            Code::InvalidArgument,
        ),
        (request("bad id!", Some(CryptoKeyPurpose::EncryptDecrypt), None), Code::InvalidArgument),
        (
            CreateCryptoKeyRequest {
                parent: format!("{}/keyRings/missing", LOCATION),
                ..request("orphan", Some(CryptoKeyPurpose::EncryptDecrypt), None)
            },
            Code::NotFound,
        ),
    ];

    for (request, code) in cases {
        let id = request.crypto_key_id.clone();
        let err = client.create_crypto_key(request).await.unwrap_err();
        assert_eq!(err.code(), code, "{}: {}", id, err);
    }
}

#[tokio::test]
async fn test_crypto_key_defaults_and_listing() {
    let client = client();
    let parent = key_ring(&client).await;
    let key = crypto_key(&client, "defaults", CryptoKeyPurpose::EncryptDecrypt, None).await;

    assert_eq!(key.purpose, CryptoKeyPurpose::EncryptDecrypt);
    assert_eq!(
        key.version_template.algorithm,
        Some(CryptoKeyVersionAlgorithm::GoogleSymmetricEncryption)
    );
    assert_eq!(key.version_template.protection_level, ProtectionLevel::Software);
    let primary = key.primary.clone().expect("primary should be set");
    assert_eq!(primary.name, version_name(&key, 1));
    assert_eq!(primary.state, CryptoKeyVersionState::Enabled);

    crypto_key(
        &client,
        "signer",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::EcSignP256Sha256),
    )
    .await;

    let listed = client
        .list_crypto_keys(ListCryptoKeysRequest { parent: parent.clone() })
        .await
        .expect("Failed to list crypto keys");
    assert_eq!(listed.crypto_keys.len(), 2);
    let signer = listed
        .crypto_keys
        .iter()
        .find(|k| k.purpose == CryptoKeyPurpose::AsymmetricSign)
        .expect("signer should be listed");
    assert!(signer.primary.is_none());

    let err = client
        .list_crypto_keys(ListCryptoKeysRequest {
            parent: format!("{}/keyRings/missing", LOCATION),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
}

#[tokio::test]
async fn test_update_crypto_key() {
    let client = client();
    let key = crypto_key(
        &client,
        "updatable",
        CryptoKeyPurpose::RawEncryptDecrypt,
        Some(CryptoKeyVersionAlgorithm::Aes256Gcm),
    )
    .await;
    assert!(key.primary.is_none());

    let mut labels = BTreeMap::new();
    labels.insert("team".to_string(), "payments".to_string());

    let updated = client
        .update_crypto_key(UpdateCryptoKeyRequest {
            name: key.name.clone(),
            labels: labels.clone(),
            version_template: CryptoKeyVersionTemplate {
                algorithm: Some(CryptoKeyVersionAlgorithm::Aes128Gcm),
                ..Default::default()
            },
            update_mask: vec!["labels".to_string(), "version_template.algorithm".to_string()],
        })
        .await
        .expect("Failed to update crypto key");
    assert_eq!(updated.labels, labels);
    assert_eq!(
        updated.version_template.algorithm,
        Some(CryptoKeyVersionAlgorithm::Aes128Gcm)
    );

    let second = new_version(&client, &key).await;
    assert_eq!(second.algorithm, CryptoKeyVersionAlgorithm::Aes128Gcm);

    let rejected = [
        UpdateCryptoKeyRequest {
            name: key.name.clone(),
            update_mask: vec!["purpose".to_string()],
            ..Default::default()
        },
        UpdateCryptoKeyRequest {
            name: key.name.clone(),
            version_template: CryptoKeyVersionTemplate {
                algorithm: Some(CryptoKeyVersionAlgorithm::HmacSha256),
                ..Default::default()
            },
            update_mask: vec!["version_template.algorithm".to_string()],
            ..Default::default()
        },
        UpdateCryptoKeyRequest {
            name: key.name.clone(),
            ..Default::default()
        },
    ];
    for request in rejected {
        let err = client.update_crypto_key(request).await.unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument, "{}", err);
    }

    // Rejected updates leave the key untouched
    let current = client
        .get_crypto_key(GetCryptoKeyRequest { name: key.name.clone() })
        .await
        .expect("Failed to get crypto key");
    assert_eq!(current.labels, labels);
    assert_eq!(
        current.version_template.algorithm,
        Some(CryptoKeyVersionAlgorithm::Aes128Gcm)
    );
}

#[tokio::test]
async fn test_primary_version_updates() {
    let client = client();
    let key = crypto_key(&client, "rotating", CryptoKeyPurpose::EncryptDecrypt, None).await;
    let second = new_version(&client, &key).await;
    set_state(&client, &second.name, CryptoKeyVersionState::Disabled).await;

    let update = |id: &str| UpdateCryptoKeyPrimaryVersionRequest {
        name: key.name.clone(),
        crypto_key_version_id: id.to_string(),
    };

    let err = client.update_crypto_key_primary_version(update("2")).await.unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);

    let err = client.update_crypto_key_primary_version(update("9")).await.unwrap_err();
    assert_eq!(err.code(), Code::NotFound);

    let err = client.update_crypto_key_primary_version(update("two")).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    set_state(&client, &second.name, CryptoKeyVersionState::Enabled).await;
    let rotated = client
        .update_crypto_key_primary_version(update("2"))
        .await
        .expect("Failed to rotate primary");
    assert_eq!(rotated.primary.map(|v| v.name), Some(second.name));

    let signer = crypto_key(
        &client,
        "signer",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::EcSignP256Sha256),
    )
    .await;
    let err = client
        .update_crypto_key_primary_version(UpdateCryptoKeyPrimaryVersionRequest {
            name: signer.name.clone(),
            crypto_key_version_id: "1".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);
}

#[tokio::test]
async fn test_versions_are_numbered_in_order() {
    let client = client();
    let key = crypto_key(&client, "numbered", CryptoKeyPurpose::EncryptDecrypt, None).await;
    new_version(&client, &key).await;
    new_version(&client, &key).await;

    let listed = client
        .list_crypto_key_versions(ListCryptoKeyVersionsRequest { parent: key.name.clone() })
        .await
        .expect("Failed to list versions");
    let names: Vec<_> = listed.crypto_key_versions.into_iter().map(|v| v.name).collect();
    assert_eq!(
        names,
        [version_name(&key, 1), version_name(&key, 2), version_name(&key, 3)]
    );
}

#[tokio::test]
async fn test_malformed_names() {
    let client = client();

    let err = client
        .get_key_ring(GetKeyRingRequest {
            name: "projects/p/keyRings/kr".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = client
        .get_crypto_key(GetCryptoKeyRequest {
            name: format!("{}/keyRings/kr", LOCATION),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);

    let err = client
        .list_crypto_key_versions(ListCryptoKeyVersionsRequest {
            parent: String::new(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}
