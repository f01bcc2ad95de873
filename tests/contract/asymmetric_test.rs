//! GetPublicKey, AsymmetricSign and AsymmetricDecrypt contract tests
//!
//! Signatures and ciphertexts are checked against the exported PEM with
//! independent implementations, the way a client would use them.

mod common;

use common::*;
use fakekms::algorithms::{all_defs, AlgorithmDef, CryptoOpts, EcCurve, HashAlgorithm, KeySpec};
use fakekms::messages::{
    AsymmetricDecryptRequest, AsymmetricSignRequest, CreateCryptoKeyRequest, Digest,
    GetPublicKeyRequest,
};
use fakekms::{
    Code, CryptoKeyPurpose, CryptoKeyVersionAlgorithm, CryptoKeyVersionState,
    CryptoKeyVersionTemplate, KeyManagementService, KmsClient,
};
use p256::ecdsa::signature::hazmat::PrehashVerifier;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, Pkcs1v15Sign, Pss, RsaPublicKey};
use sha2::{Digest as _, Sha256, Sha384, Sha512};

const MESSAGE: &[u8] = b"message to sign";

/// Digest of [`MESSAGE`] with `hash`, raw and as a request field
fn message_digest(hash: HashAlgorithm) -> (Vec<u8>, Digest) {
    match hash {
        HashAlgorithm::Sha256 => {
            let d = Sha256::digest(MESSAGE).to_vec();
            (d.clone(), Digest::Sha256(d))
        }
        HashAlgorithm::Sha384 => {
            let d = Sha384::digest(MESSAGE).to_vec();
            (d.clone(), Digest::Sha384(d))
        }
        HashAlgorithm::Sha512 => {
            let d = Sha512::digest(MESSAGE).to_vec();
            (d.clone(), Digest::Sha512(d))
        }
    }
}

fn pss(hash: HashAlgorithm) -> Pss {
    match hash {
        HashAlgorithm::Sha256 => Pss::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pss::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pss::new::<Sha512>(),
    }
}

fn pkcs1(hash: HashAlgorithm) -> Pkcs1v15Sign {
    match hash {
        HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
        HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
        HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
    }
}

fn oaep(hash: HashAlgorithm) -> Oaep {
    match hash {
        HashAlgorithm::Sha256 => Oaep::new::<Sha256>(),
        HashAlgorithm::Sha384 => Oaep::new::<Sha384>(),
        HashAlgorithm::Sha512 => Oaep::new::<Sha512>(),
    }
}

/// Sign or decrypt with an RSA version and check the result with its public key
async fn exercise_rsa(client: &KmsClient, def: &AlgorithmDef, name: &str, public_key: &RsaPublicKey) {
    match def.opts {
        CryptoOpts::RsaPss(hash) => {
            let (digest, field) = message_digest(hash);
            let signature = sign(client, name, field).await;
            public_key
                .verify(pss(hash), &digest, &signature)
                .unwrap_or_else(|e| panic!("{}: PSS signature should verify: {}", def.algorithm, e));
        }
        CryptoOpts::RsaPkcs1(hash) => {
            let (digest, field) = message_digest(hash);
            let signature = sign(client, name, field).await;
            public_key
                .verify(pkcs1(hash), &digest, &signature)
                .unwrap_or_else(|e| panic!("{}: PKCS#1 signature should verify: {}", def.algorithm, e));
        }
        CryptoOpts::RsaOaep(hash) => {
            let ciphertext = public_key
                .encrypt(&mut rand::thread_rng(), oaep(hash), b"wrapped secret")
                .expect("OAEP encryption should succeed");
            let decrypted = client
                .asymmetric_decrypt(AsymmetricDecryptRequest {
                    name: name.to_string(),
                    ciphertext,
                    ..Default::default()
                })
                .await
                .unwrap_or_else(|e| panic!("{}: Failed to decrypt: {}", def.algorithm, e));
            assert_eq!(decrypted.plaintext, b"wrapped secret");
        }
        other => panic!("{}: unexpected RSA options {:?}", def.algorithm, other),
    }
}

async fn public_pem(client: &KmsClient, name: &str) -> String {
    let public_key = client
        .get_public_key(GetPublicKeyRequest { name: name.to_string() })
        .await
        .expect("Failed to get public key");
    assert_eq!(public_key.name, name);
    assert_eq!(public_key.pem_crc32c, crc32c::crc32c(public_key.pem.as_bytes()));
    assert!(public_key.pem.starts_with("-----BEGIN PUBLIC KEY-----"));
    public_key.pem
}

async fn sign(client: &KmsClient, name: &str, digest: Digest) -> Vec<u8> {
    let response = client
        .asymmetric_sign(AsymmetricSignRequest {
            name: name.to_string(),
            digest: Some(digest),
            ..Default::default()
        })
        .await
        .expect("Failed to sign");
    assert_eq!(response.signature_crc32c, crc32c::crc32c(&response.signature));
    response.signature
}

#[tokio::test]
async fn test_rsa_pss_signature_verifies() {
    let client = client();
    let key = crypto_key(
        &client,
        "rsa-pss",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::RsaSignPss2048Sha256),
    )
    .await;
    let name = version_name(&key, 1);

    let public_key = RsaPublicKey::from_public_key_pem(&public_pem(&client, &name).await)
        .expect("PEM should decode");
    let digest = Sha256::digest(MESSAGE).to_vec();
    let signature = sign(&client, &name, Digest::Sha256(digest.clone())).await;

    public_key
        .verify(Pss::new::<Sha256>(), &digest, &signature)
        .expect("PSS signature should verify");
    println!("✅ RSA-PSS signature verified");
}

#[tokio::test]
async fn test_rsa_pkcs1_signature_verifies() {
    let client = client();
    let key = crypto_key(
        &client,
        "rsa-pkcs1",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::RsaSignPkcs1_2048Sha256),
    )
    .await;
    let name = version_name(&key, 1);

    let public_key = RsaPublicKey::from_public_key_pem(&public_pem(&client, &name).await)
        .expect("PEM should decode");
    let digest = Sha256::digest(MESSAGE).to_vec();
    let signature = sign(&client, &name, Digest::Sha256(digest.clone())).await;

    public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
        .expect("PKCS#1 signature should verify");

    let other = Sha256::digest(b"another message").to_vec();
    assert!(public_key
        .verify(Pkcs1v15Sign::new::<Sha256>(), &other, &signature)
        .is_err());
}

#[tokio::test]
async fn test_ecdsa_p256_signature_verifies() {
    let client = client();
    let key = crypto_key(
        &client,
        "ec-p256",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::EcSignP256Sha256),
    )
    .await;
    let name = version_name(&key, 1);

    let verifying_key = p256::ecdsa::VerifyingKey::from_public_key_pem(&public_pem(&client, &name).await)
        .expect("PEM should decode");
    let digest = Sha256::digest(MESSAGE).to_vec();
    let der = sign(&client, &name, Digest::Sha256(digest.clone())).await;

    let signature = p256::ecdsa::Signature::from_der(&der).expect("signature should be DER");
    verifying_key
        .verify_prehash(&digest, &signature)
        .expect("ECDSA signature should verify");
}

#[tokio::test]
async fn test_ecdsa_p384_signature_verifies() {
    let client = client();
    let key = crypto_key(
        &client,
        "ec-p384",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::EcSignP384Sha384),
    )
    .await;
    let name = version_name(&key, 1);

    let verifying_key = p384::ecdsa::VerifyingKey::from_public_key_pem(&public_pem(&client, &name).await)
        .expect("PEM should decode");
    let digest = Sha384::digest(MESSAGE).to_vec();
    let der = sign(&client, &name, Digest::Sha384(digest.clone())).await;

    let signature = p384::ecdsa::Signature::from_der(&der).expect("signature should be DER");
    verifying_key
        .verify_prehash(&digest, &signature)
        .expect("ECDSA signature should verify");
}

#[tokio::test]
async fn test_sign_digest_checks() {
    let client = client();
    let key = crypto_key(
        &client,
        "ec-p256",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::EcSignP256Sha256),
    )
    .await;
    let name = version_name(&key, 1);

    let cases = [
        // Wrong hash for the algorithm
        Some(Digest::Sha384(Sha384::digest(MESSAGE).to_vec())),
        Some(Digest::Sha256(vec![0; 31])),
        None,
    ];
    for digest in cases {
        let err = client
            .asymmetric_sign(AsymmetricSignRequest {
                name: name.clone(),
                digest,
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::InvalidArgument, "{}", err);
    }
}

#[tokio::test]
async fn test_sign_rejects_unsupported_fields_first() {
    let client = client();
    key_ring(&client).await;

    let err = client
        .asymmetric_sign(AsymmetricSignRequest {
            name: format!("{}/keyRings/{}/cryptoKeys/missing/cryptoKeyVersions/1", LOCATION, KEY_RING_ID),
            data: MESSAGE.to_vec(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert!(err.message().contains("data"));
}

#[tokio::test]
async fn test_rsa_oaep_decrypt() {
    let client = client();
    let key = crypto_key(
        &client,
        "rsa-oaep",
        CryptoKeyPurpose::AsymmetricDecrypt,
        Some(CryptoKeyVersionAlgorithm::RsaDecryptOaep2048Sha256),
    )
    .await;
    let name = version_name(&key, 1);

    let public_key = RsaPublicKey::from_public_key_pem(&public_pem(&client, &name).await)
        .expect("PEM should decode");
    let ciphertext = public_key
        .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha256>(), b"wrapped secret")
        .expect("OAEP encryption should succeed");

    let decrypted = client
        .asymmetric_decrypt(AsymmetricDecryptRequest {
            name: name.clone(),
            ciphertext_crc32c: Some(crc32c::crc32c(&ciphertext)),
            ciphertext: ciphertext.clone(),
        })
        .await
        .expect("Failed to decrypt");
    assert_eq!(decrypted.plaintext, b"wrapped secret");
    assert_eq!(decrypted.plaintext_crc32c, crc32c::crc32c(b"wrapped secret"));

    let mut tampered = ciphertext;
    tampered[0] ^= 0xff;
    let err = client
        .asymmetric_decrypt(AsymmetricDecryptRequest {
            name,
            ciphertext: tampered,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
}

#[tokio::test]
async fn test_purpose_mismatches() {
    let client = client();
    let signer = crypto_key(
        &client,
        "ec-p256",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::EcSignP256Sha256),
    )
    .await;
    let symmetric = crypto_key(&client, "symmetric", CryptoKeyPurpose::EncryptDecrypt, None).await;

    let err = client
        .asymmetric_decrypt(AsymmetricDecryptRequest {
            name: version_name(&signer, 1),
            ciphertext: vec![1; 256],
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);

    let err = client
        .asymmetric_sign(AsymmetricSignRequest {
            name: version_name(&symmetric, 1),
            digest: Some(Digest::Sha256(Sha256::digest(MESSAGE).to_vec())),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);

    let err = client
        .get_public_key(GetPublicKeyRequest {
            name: version_name(&symmetric, 1),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);
    assert!(err.message().contains("do not contain a public key"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_registered_algorithm() {
    let client = client();
    let parent = key_ring(&client).await;

    // Start every generation before waiting on any of them
    let mut created = Vec::new();
    for (i, def) in all_defs().iter().enumerate() {
        let key = client
            .create_crypto_key(CreateCryptoKeyRequest {
                parent: parent.clone(),
                crypto_key_id: format!("registered-{}", i),
                purpose: Some(def.purpose),
                version_template: Some(CryptoKeyVersionTemplate {
                    algorithm: Some(def.algorithm),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .await
            .expect("Failed to create crypto key");
        created.push((def, version_name(&key, 1)));
    }

    for (def, name) in created {
        let version = client.wait_for_generation(&name).await.expect("Generation should finish");
        assert_eq!(version.state, CryptoKeyVersionState::Enabled, "{}", def.algorithm);

        let result = client.get_public_key(GetPublicKeyRequest { name: name.clone() }).await;
        match def.key_spec {
            KeySpec::Rsa { bits } => {
                let pem = result.expect("Failed to get public key");
                assert_eq!(pem.algorithm, def.algorithm);
                let public_key = RsaPublicKey::from_public_key_pem(&pem.pem).expect("PEM should decode");
                assert_eq!(public_key.size() * 8, bits, "{}", def.algorithm);
                exercise_rsa(&client, def, &name, &public_key).await;
            }
            KeySpec::Ec(curve) => {
                let pem = result.expect("Failed to get public key");
                assert_eq!(pem.algorithm, def.algorithm);
                let hash = def.opts.signing_hash().expect("ECDSA algorithms sign");
                let (digest, field) = message_digest(hash);
                let der = sign(&client, &name, field).await;
                match curve {
                    EcCurve::P256 => {
                        let key = p256::ecdsa::VerifyingKey::from_public_key_pem(&pem.pem)
                            .expect("PEM should decode as P-256");
                        let signature = p256::ecdsa::Signature::from_der(&der).expect("signature should be DER");
                        key.verify_prehash(&digest, &signature).expect("ECDSA signature should verify");
                    }
                    EcCurve::P384 => {
                        let key = p384::ecdsa::VerifyingKey::from_public_key_pem(&pem.pem)
                            .expect("PEM should decode as P-384");
                        let signature = p384::ecdsa::Signature::from_der(&der).expect("signature should be DER");
                        key.verify_prehash(&digest, &signature).expect("ECDSA signature should verify");
                    }
                }
            }
            KeySpec::Aes { .. } | KeySpec::Hmac { .. } => {
                let err = result.unwrap_err();
                assert_eq!(err.code(), Code::FailedPrecondition, "{}", def.algorithm);
            }
        }
    }
    println!("✅ Exercised {} registered algorithms", all_defs().len());
}

#[tokio::test]
async fn test_disabled_versions_rejected() {
    let client = client();
    let signer = crypto_key(
        &client,
        "ec-p256",
        CryptoKeyPurpose::AsymmetricSign,
        Some(CryptoKeyVersionAlgorithm::EcSignP256Sha256),
    )
    .await;
    let decrypter = crypto_key(
        &client,
        "rsa-oaep",
        CryptoKeyPurpose::AsymmetricDecrypt,
        Some(CryptoKeyVersionAlgorithm::RsaDecryptOaep2048Sha256),
    )
    .await;
    let signer = version_name(&signer, 1);
    let decrypter = version_name(&decrypter, 1);

    let public_key = RsaPublicKey::from_public_key_pem(&public_pem(&client, &decrypter).await)
        .expect("PEM should decode");
    let ciphertext = public_key
        .encrypt(&mut rand::thread_rng(), Oaep::new::<Sha256>(), b"wrapped secret")
        .expect("OAEP encryption should succeed");

    set_state(&client, &signer, CryptoKeyVersionState::Disabled).await;
    set_state(&client, &decrypter, CryptoKeyVersionState::Disabled).await;

    let err = client
        .asymmetric_sign(AsymmetricSignRequest {
            name: signer.clone(),
            digest: Some(Digest::Sha256(Sha256::digest(MESSAGE).to_vec())),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);

    let err = client
        .asymmetric_decrypt(AsymmetricDecryptRequest {
            name: decrypter.clone(),
            ciphertext,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::FailedPrecondition);

    for name in [signer, decrypter] {
        let err = client
            .get_public_key(GetPublicKeyRequest { name })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Code::FailedPrecondition);
    }
}
