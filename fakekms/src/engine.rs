//! The emulation engine
//!
//! [`FakeKms`] owns the resource store and the lifecycle controller. Admin
//! RPCs live here; crypto RPCs are split by family into the `*_rpcs` modules.
// Copyright 2025 Francisco F. Pinochet
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use crate::algorithms::{algorithm_def, default_algorithm, require_def, AlgorithmDef};
use crate::error::{KmsError, KmsResult};
use crate::kms::KeyManagementService;
use crate::lifecycle::LifecycleController;
use crate::messages::*;
use crate::names::{CryptoKeyName, CryptoKeyVersionName, KeyRingName, LocationName};
use crate::resources::{
    CryptoKey, CryptoKeyPurpose, CryptoKeyVersion, CryptoKeyVersionState,
    CryptoKeyVersionTemplate, KeyRing,
};
use crate::store::{CryptoKeyRecord, ResourceStore, VersionEntry, VersionSnapshot};
use crate::validation::check_update_mask;
use async_trait::async_trait;
use fakekms_config::FakeKmsConfig;
use tracing::{debug, info};

const CRYPTO_KEY_MUTABLE_FIELDS: &[&str] = &[
    "labels",
    "version_template.algorithm",
    "version_template.protection_level",
];

const CRYPTO_KEY_VERSION_MUTABLE_FIELDS: &[&str] = &["state"];

/// An in-memory key management service
pub struct FakeKms {
    store: ResourceStore,
    lifecycle: LifecycleController,
}

impl FakeKms {
    pub fn new(config: &FakeKmsConfig) -> Self {
        info!(
            generation_delay_ms = config.generation_delay_ms,
            destroy_scheduled_duration_secs = config.destroy_scheduled_duration_secs,
            "Creating fake KMS engine"
        );
        Self {
            store: ResourceStore::new(),
            lifecycle: LifecycleController::new(
                config.generation_delay(),
                config.destroy_scheduled_duration(),
            ),
        }
    }

    /// Resolve a version and check it is ENABLED
    ///
    /// The returned snapshot holds its own reference to the key material, so
    /// the primitive runs without any lock held.
    pub(crate) async fn enabled_version(
        &self,
        name: &CryptoKeyVersionName,
    ) -> KmsResult<(VersionSnapshot, &'static AlgorithmDef)> {
        let entry = self.store.version(name).await?;
        let snapshot = entry.read().await.snapshot(name);
        Self::check_enabled(snapshot)
    }

    pub(crate) fn check_enabled(
        snapshot: VersionSnapshot,
    ) -> KmsResult<(VersionSnapshot, &'static AlgorithmDef)> {
        if snapshot.state != CryptoKeyVersionState::Enabled {
            return Err(KmsError::FailedPrecondition(format!(
                "key version {} is not enabled",
                snapshot.name
            )));
        }
        let def = require_def(snapshot.algorithm)?;
        Ok((snapshot, def))
    }

    pub(crate) fn check_purpose(
        def: &AlgorithmDef,
        purpose: CryptoKeyPurpose,
        operation: &str,
    ) -> KmsResult<()> {
        if def.purpose != purpose {
            return Err(KmsError::FailedPrecondition(format!(
                "keys with algorithm {} may not be used for {}",
                def.algorithm, operation
            )));
        }
        Ok(())
    }

    pub(crate) fn store(&self) -> &ResourceStore {
        &self.store
    }

    /// Resolve the algorithm a template produces for a purpose
    fn template_algorithm(
        purpose: CryptoKeyPurpose,
        template: &CryptoKeyVersionTemplate,
    ) -> KmsResult<&'static AlgorithmDef> {
        let algorithm = template
            .algorithm
            .or_else(|| default_algorithm(purpose))
            .ok_or_else(|| {
                KmsError::InvalidArgument(format!(
                    "version_template.algorithm is required for purpose {:?}",
                    purpose
                ))
            })?;

        let def = algorithm_def(algorithm).ok_or_else(|| {
            KmsError::InvalidArgument(format!("unsupported algorithm {}", algorithm))
        })?;
        if def.purpose != purpose {
            return Err(KmsError::InvalidArgument(format!(
                "algorithm {} is not compatible with purpose {:?}",
                algorithm, purpose
            )));
        }
        if !def.supports_protection_level(template.protection_level) {
            return Err(KmsError::InvalidArgument(format!(
                "algorithm {} does not support protection level {:?}",
                algorithm, template.protection_level
            )));
        }
        Ok(def)
    }

    /// Add a version to a locked crypto key and start generating it
    fn add_version(&self, record: &mut CryptoKeyRecord) -> KmsResult<VersionEntry> {
        let def = Self::template_algorithm(record.purpose, &record.version_template)?;
        let protection_level = record.version_template.protection_level;
        let (name, entry) = record.add_version(def.algorithm, protection_level);

        if record.purpose == CryptoKeyPurpose::EncryptDecrypt && record.primary.is_none() {
            record.primary = Some(name.version);
        }

        debug!(name = %name, algorithm = %def.algorithm, "Created key version");
        self.lifecycle.request_generation(entry.clone(), def);
        Ok(entry)
    }

    async fn version_entry(&self, name: &str) -> KmsResult<VersionEntry> {
        let name: CryptoKeyVersionName = name.parse()?;
        self.store.version(&name).await
    }

    pub async fn create_key_ring(&self, request: CreateKeyRingRequest) -> KmsResult<KeyRing> {
        let parent: LocationName = request.parent.parse()?;
        let name = parent.key_ring(&request.key_ring_id)?;
        let key_ring = self.store.insert_key_ring(name)?;
        info!(name = %key_ring.name, "Key ring created");
        Ok(key_ring)
    }

    pub async fn get_key_ring(&self, request: GetKeyRingRequest) -> KmsResult<KeyRing> {
        let name: KeyRingName = request.name.parse()?;
        self.store.key_ring(&name)
    }

    pub async fn list_key_rings(&self, request: ListKeyRingsRequest) -> KmsResult<ListKeyRingsResponse> {
        let parent: LocationName = request.parent.parse()?;
        Ok(ListKeyRingsResponse {
            key_rings: self.store.list_key_rings(&parent),
        })
    }

    pub async fn create_crypto_key(&self, request: CreateCryptoKeyRequest) -> KmsResult<CryptoKey> {
        let parent: KeyRingName = request.parent.parse()?;
        let name = parent.crypto_key(&request.crypto_key_id)?;
        let purpose = request
            .purpose
            .ok_or_else(|| KmsError::InvalidArgument("purpose is required".to_string()))?;

        let mut template = request.version_template.unwrap_or_default();
        let def = Self::template_algorithm(purpose, &template)?;
        template.algorithm = Some(def.algorithm);

        let entry = self
            .store
            .insert_crypto_key(CryptoKeyRecord::new(name, purpose, template, request.labels))?;

        let mut record = entry.write().await;
        if !request.skip_initial_version_creation {
            self.add_version(&mut record)?;
        }
        info!(name = %record.name, purpose = ?purpose, algorithm = %def.algorithm, "Crypto key created");
        Ok(record.to_crypto_key().await)
    }

    pub async fn get_crypto_key(&self, request: GetCryptoKeyRequest) -> KmsResult<CryptoKey> {
        let name: CryptoKeyName = request.name.parse()?;
        let entry = self.store.crypto_key(&name)?;
        let record = entry.read().await;
        Ok(record.to_crypto_key().await)
    }

    pub async fn list_crypto_keys(&self, request: ListCryptoKeysRequest) -> KmsResult<ListCryptoKeysResponse> {
        let parent: KeyRingName = request.parent.parse()?;
        self.store.key_ring(&parent)?;

        let mut crypto_keys = Vec::new();
        for entry in self.store.list_crypto_keys(&parent) {
            crypto_keys.push(entry.read().await.to_crypto_key().await);
        }
        Ok(ListCryptoKeysResponse { crypto_keys })
    }

    pub async fn update_crypto_key(&self, request: UpdateCryptoKeyRequest) -> KmsResult<CryptoKey> {
        let name: CryptoKeyName = request.name.parse()?;
        check_update_mask(&request.update_mask, CRYPTO_KEY_MUTABLE_FIELDS)?;

        let entry = self.store.crypto_key(&name)?;
        let mut record = entry.write().await;

        // Validate the whole update before applying any of it
        let mut template = record.version_template.clone();
        let mut labels = None;
        for path in &request.update_mask {
            match path.as_str() {
                "labels" => labels = Some(request.labels.clone()),
                "version_template.algorithm" => {
                    template.algorithm = Some(request.version_template.algorithm.ok_or_else(|| {
                        KmsError::InvalidArgument("version_template.algorithm must be set".to_string())
                    })?);
                }
                "version_template.protection_level" => {
                    template.protection_level = request.version_template.protection_level;
                }
                _ => {}
            }
        }
        Self::template_algorithm(record.purpose, &template)?;

        record.version_template = template;
        if let Some(labels) = labels {
            record.labels = labels;
        }
        info!(name = %name, update_mask = ?request.update_mask, "Crypto key updated");
        Ok(record.to_crypto_key().await)
    }

    pub async fn update_crypto_key_primary_version(
        &self,
        request: UpdateCryptoKeyPrimaryVersionRequest,
    ) -> KmsResult<CryptoKey> {
        let name: CryptoKeyName = request.name.parse()?;
        let version_id = request
            .crypto_key_version_id
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                KmsError::InvalidArgument(format!(
                    "invalid crypto_key_version_id {:?}",
                    request.crypto_key_version_id
                ))
            })?;

        let entry = self.store.crypto_key(&name)?;
        let mut record = entry.write().await;
        if record.purpose != CryptoKeyPurpose::EncryptDecrypt {
            return Err(KmsError::FailedPrecondition(format!(
                "crypto key {} has purpose {:?}; only ENCRYPT_DECRYPT keys have a primary version",
                name, record.purpose
            )));
        }

        let version = record
            .version(version_id)
            .ok_or_else(|| KmsError::NotFound(name.version(version_id).to_string()))?;
        if !version.read().await.version.is_enabled() {
            return Err(KmsError::FailedPrecondition(format!(
                "key version {} is not enabled",
                name.version(version_id)
            )));
        }

        record.primary = Some(version_id);
        info!(name = %name, primary = version_id, "Primary version updated");
        Ok(record.to_crypto_key().await)
    }

    pub async fn create_crypto_key_version(
        &self,
        request: CreateCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        let parent: CryptoKeyName = request.parent.parse()?;
        let entry = self.store.crypto_key(&parent)?;
        let mut record = entry.write().await;
        let version = self.add_version(&mut record)?;
        let created = version.read().await.version.clone();
        Ok(created)
    }

    pub async fn get_crypto_key_version(
        &self,
        request: GetCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        let entry = self.version_entry(&request.name).await?;
        let version = entry.read().await.version.clone();
        Ok(version)
    }

    pub async fn list_crypto_key_versions(
        &self,
        request: ListCryptoKeyVersionsRequest,
    ) -> KmsResult<ListCryptoKeyVersionsResponse> {
        let parent: CryptoKeyName = request.parent.parse()?;
        let entry = self.store.crypto_key(&parent)?;
        let record = entry.read().await;

        let mut crypto_key_versions = Vec::new();
        for version in record.versions() {
            crypto_key_versions.push(version.read().await.version.clone());
        }
        Ok(ListCryptoKeyVersionsResponse { crypto_key_versions })
    }

    pub async fn update_crypto_key_version(
        &self,
        request: UpdateCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        let name: CryptoKeyVersionName = request.name.parse()?;
        check_update_mask(&request.update_mask, CRYPTO_KEY_VERSION_MUTABLE_FIELDS)?;
        let state = request
            .state
            .ok_or_else(|| KmsError::InvalidArgument("state must be set".to_string()))?;

        let entry = self.store.version(&name).await?;
        self.lifecycle.apply_state_update(&entry, state).await
    }

    pub async fn destroy_crypto_key_version(
        &self,
        request: DestroyCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        let entry = self.version_entry(&request.name).await?;
        self.lifecycle.schedule_destroy(&entry).await
    }

    pub async fn restore_crypto_key_version(
        &self,
        request: RestoreCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        let entry = self.version_entry(&request.name).await?;
        self.lifecycle.restore(&entry).await
    }
}

// `Self::` paths resolve to the inherent RPC methods, not back into the trait
#[async_trait]
impl KeyManagementService for FakeKms {
    async fn create_key_ring(&self, request: CreateKeyRingRequest) -> KmsResult<KeyRing> {
        Self::create_key_ring(self, request).await
    }

    async fn get_key_ring(&self, request: GetKeyRingRequest) -> KmsResult<KeyRing> {
        Self::get_key_ring(self, request).await
    }

    async fn list_key_rings(&self, request: ListKeyRingsRequest) -> KmsResult<ListKeyRingsResponse> {
        Self::list_key_rings(self, request).await
    }

    async fn create_crypto_key(&self, request: CreateCryptoKeyRequest) -> KmsResult<CryptoKey> {
        Self::create_crypto_key(self, request).await
    }

    async fn get_crypto_key(&self, request: GetCryptoKeyRequest) -> KmsResult<CryptoKey> {
        Self::get_crypto_key(self, request).await
    }

    async fn list_crypto_keys(&self, request: ListCryptoKeysRequest) -> KmsResult<ListCryptoKeysResponse> {
        Self::list_crypto_keys(self, request).await
    }

    async fn update_crypto_key(&self, request: UpdateCryptoKeyRequest) -> KmsResult<CryptoKey> {
        Self::update_crypto_key(self, request).await
    }

    async fn update_crypto_key_primary_version(
        &self,
        request: UpdateCryptoKeyPrimaryVersionRequest,
    ) -> KmsResult<CryptoKey> {
        Self::update_crypto_key_primary_version(self, request).await
    }

    async fn create_crypto_key_version(
        &self,
        request: CreateCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        Self::create_crypto_key_version(self, request).await
    }

    async fn get_crypto_key_version(
        &self,
        request: GetCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        Self::get_crypto_key_version(self, request).await
    }

    async fn list_crypto_key_versions(
        &self,
        request: ListCryptoKeyVersionsRequest,
    ) -> KmsResult<ListCryptoKeyVersionsResponse> {
        Self::list_crypto_key_versions(self, request).await
    }

    async fn update_crypto_key_version(
        &self,
        request: UpdateCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        Self::update_crypto_key_version(self, request).await
    }

    async fn destroy_crypto_key_version(
        &self,
        request: DestroyCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        Self::destroy_crypto_key_version(self, request).await
    }

    async fn restore_crypto_key_version(
        &self,
        request: RestoreCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        Self::restore_crypto_key_version(self, request).await
    }

    async fn encrypt(&self, request: EncryptRequest) -> KmsResult<EncryptResponse> {
        Self::encrypt(self, request).await
    }

    async fn decrypt(&self, request: DecryptRequest) -> KmsResult<DecryptResponse> {
        Self::decrypt(self, request).await
    }

    async fn raw_encrypt(&self, request: RawEncryptRequest) -> KmsResult<RawEncryptResponse> {
        Self::raw_encrypt(self, request).await
    }

    async fn raw_decrypt(&self, request: RawDecryptRequest) -> KmsResult<RawDecryptResponse> {
        Self::raw_decrypt(self, request).await
    }

    async fn asymmetric_sign(&self, request: AsymmetricSignRequest) -> KmsResult<AsymmetricSignResponse> {
        Self::asymmetric_sign(self, request).await
    }

    async fn asymmetric_decrypt(
        &self,
        request: AsymmetricDecryptRequest,
    ) -> KmsResult<AsymmetricDecryptResponse> {
        Self::asymmetric_decrypt(self, request).await
    }

    async fn get_public_key(&self, request: GetPublicKeyRequest) -> KmsResult<PublicKey> {
        Self::get_public_key(self, request).await
    }

    async fn mac_sign(&self, request: MacSignRequest) -> KmsResult<MacSignResponse> {
        Self::mac_sign(self, request).await
    }

    async fn mac_verify(&self, request: MacVerifyRequest) -> KmsResult<MacVerifyResponse> {
        Self::mac_verify(self, request).await
    }
}
