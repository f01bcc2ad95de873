//! Key Management Service interface
//!
//! The seam between callers and the emulator. [`crate::engine::FakeKms`]
//! implements it in process; a transport adapter would implement it by
//! forwarding each call over the wire.
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


use crate::error::KmsResult;
use crate::messages::*;
use crate::resources::{CryptoKey, CryptoKeyVersion, KeyRing};
use async_trait::async_trait;

/// Key Management Service RPCs
#[async_trait]
pub trait KeyManagementService: Send + Sync {
    async fn create_key_ring(&self, request: CreateKeyRingRequest) -> KmsResult<KeyRing>;

    async fn get_key_ring(&self, request: GetKeyRingRequest) -> KmsResult<KeyRing>;

    async fn list_key_rings(&self, request: ListKeyRingsRequest) -> KmsResult<ListKeyRingsResponse>;

    /// Create a crypto key and, unless skipped, its first version
    async fn create_crypto_key(&self, request: CreateCryptoKeyRequest) -> KmsResult<CryptoKey>;

    async fn get_crypto_key(&self, request: GetCryptoKeyRequest) -> KmsResult<CryptoKey>;

    async fn list_crypto_keys(&self, request: ListCryptoKeysRequest) -> KmsResult<ListCryptoKeysResponse>;

    async fn update_crypto_key(&self, request: UpdateCryptoKeyRequest) -> KmsResult<CryptoKey>;

    async fn update_crypto_key_primary_version(
        &self,
        request: UpdateCryptoKeyPrimaryVersionRequest,
    ) -> KmsResult<CryptoKey>;

    /// Create a version; it starts PENDING_GENERATION
    async fn create_crypto_key_version(
        &self,
        request: CreateCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion>;

    async fn get_crypto_key_version(
        &self,
        request: GetCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion>;

    async fn list_crypto_key_versions(
        &self,
        request: ListCryptoKeyVersionsRequest,
    ) -> KmsResult<ListCryptoKeyVersionsResponse>;

    async fn update_crypto_key_version(
        &self,
        request: UpdateCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion>;

    async fn destroy_crypto_key_version(
        &self,
        request: DestroyCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion>;

    async fn restore_crypto_key_version(
        &self,
        request: RestoreCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion>;

    async fn encrypt(&self, request: EncryptRequest) -> KmsResult<EncryptResponse>;

    async fn decrypt(&self, request: DecryptRequest) -> KmsResult<DecryptResponse>;

    async fn raw_encrypt(&self, request: RawEncryptRequest) -> KmsResult<RawEncryptResponse>;

    async fn raw_decrypt(&self, request: RawDecryptRequest) -> KmsResult<RawDecryptResponse>;

    async fn asymmetric_sign(&self, request: AsymmetricSignRequest) -> KmsResult<AsymmetricSignResponse>;

    async fn asymmetric_decrypt(
        &self,
        request: AsymmetricDecryptRequest,
    ) -> KmsResult<AsymmetricDecryptResponse>;

    async fn get_public_key(&self, request: GetPublicKeyRequest) -> KmsResult<PublicKey>;

    async fn mac_sign(&self, request: MacSignRequest) -> KmsResult<MacSignResponse>;

    async fn mac_verify(&self, request: MacVerifyRequest) -> KmsResult<MacVerifyResponse>;
}
