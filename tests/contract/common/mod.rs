//! Shared setup for the contract tests
#![allow(dead_code)]

use fakekms::messages::{
    CreateCryptoKeyRequest, CreateCryptoKeyVersionRequest, CreateKeyRingRequest,
    GetKeyRingRequest, UpdateCryptoKeyVersionRequest,
};
use fakekms::names::CryptoKeyName;
use fakekms::{
    init_client, CryptoKey, CryptoKeyPurpose, CryptoKeyVersion, CryptoKeyVersionAlgorithm,
    CryptoKeyVersionState, CryptoKeyVersionTemplate, KeyManagementService, KmsClient,
};
use fakekms_config::FakeKmsConfig;

pub const LOCATION: &str = "projects/fakekms-test/locations/global";
pub const KEY_RING_ID: &str = "contract";

/// Defaults, with room for RSA generation in unoptimized builds
pub fn test_config() -> FakeKmsConfig {
    FakeKmsConfig {
        generation_timeout_secs: 300,
        log_level: "warn".to_string(),
        ..FakeKmsConfig::default()
    }
}

pub fn client() -> KmsClient {
    client_with(test_config())
}

pub fn client_with(config: FakeKmsConfig) -> KmsClient {
    fakekms_logging::init_test_logging(config.log_level());
    init_client(&config)
}

pub async fn key_ring(client: &KmsClient) -> String {
    client
        .create_key_ring(CreateKeyRingRequest {
            parent: LOCATION.to_string(),
            key_ring_id: KEY_RING_ID.to_string(),
        })
        .await
        .expect("Failed to create key ring")
        .name
}

/// Create a key ring and a crypto key whose first version is generated
pub async fn crypto_key(
    client: &KmsClient,
    id: &str,
    purpose: CryptoKeyPurpose,
    algorithm: Option<CryptoKeyVersionAlgorithm>,
) -> CryptoKey {
    let existing = client
        .get_key_ring(GetKeyRingRequest {
            name: format!("{}/keyRings/{}", LOCATION, KEY_RING_ID),
        })
        .await;
    let parent = match existing {
        Ok(ring) => ring.name,
        Err(_) => key_ring(client).await,
    };

    client
        .create_crypto_key_and_wait_for_first_version(CreateCryptoKeyRequest {
            parent,
            crypto_key_id: id.to_string(),
            purpose: Some(purpose),
            version_template: Some(CryptoKeyVersionTemplate {
                algorithm,
                ..Default::default()
            }),
            ..Default::default()
        })
        .await
        .expect("Failed to create crypto key")
}

pub fn version_name(key: &CryptoKey, version: u64) -> String {
    key.name
        .parse::<CryptoKeyName>()
        .expect("crypto key name should parse")
        .version(version)
        .to_string()
}

pub async fn new_version(client: &KmsClient, key: &CryptoKey) -> CryptoKeyVersion {
    client
        .create_crypto_key_version_and_wait(CreateCryptoKeyVersionRequest {
            parent: key.name.clone(),
        })
        .await
        .expect("Failed to create crypto key version")
}

pub async fn set_state(client: &KmsClient, name: &str, state: CryptoKeyVersionState) -> CryptoKeyVersion {
    client
        .update_crypto_key_version(UpdateCryptoKeyVersionRequest {
            name: name.to_string(),
            state: Some(state),
            update_mask: vec!["state".to_string()],
        })
        .await
        .expect("Failed to update crypto key version")
}
