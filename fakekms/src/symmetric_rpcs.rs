//! Encrypt and Decrypt for ENCRYPT_DECRYPT keys
//!
//! Ciphertexts are self-describing: an 8-byte big-endian version id, the
//! 12-byte nonce, then the sealed bytes and tag. Decrypt recovers the version
//! from the ciphertext, so callers only name the crypto key.
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


use crate::algorithms::{AES_GCM_IV_LENGTH, AES_GCM_TAG_LENGTH};
use crate::engine::FakeKms;
use crate::error::{KmsError, KmsResult};
use crate::key_material::{generate_iv, AeadKey};
use crate::messages::{DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse};
use crate::names::{CryptoKeyName, CryptoKeyOrVersionName, CryptoKeyVersionName};
use crate::resources::CryptoKeyPurpose;
use crate::store::VersionSnapshot;
use crate::validation::{allowlist, crc32c, verify_crc32c, Allowlist};
use tracing::debug;

const ENCRYPT_FIELDS: Allowlist = allowlist(&[
    "name",
    "plaintext",
    "additional_authenticated_data",
    "plaintext_crc32c",
    "additional_authenticated_data_crc32c",
]);

const DECRYPT_FIELDS: Allowlist = allowlist(&[
    "name",
    "ciphertext",
    "additional_authenticated_data",
    "ciphertext_crc32c",
    "additional_authenticated_data_crc32c",
]);

const VERSION_PREFIX_LENGTH: usize = 8;
const HEADER_LENGTH: usize = VERSION_PREFIX_LENGTH + AES_GCM_IV_LENGTH;

fn aead_key(snapshot: &VersionSnapshot) -> KmsResult<AeadKey<'_>> {
    snapshot.material()?.aead().ok_or_else(|| {
        KmsError::FailedPrecondition(format!(
            "keys with algorithm {} do not support authenticated encryption",
            snapshot.algorithm
        ))
    })
}

/// Version id a ciphertext was produced by
fn ciphertext_version(ciphertext: &[u8]) -> KmsResult<u64> {
    if ciphertext.len() < HEADER_LENGTH + AES_GCM_TAG_LENGTH {
        return Err(KmsError::InvalidArgument("ciphertext is malformed".to_string()));
    }
    let mut prefix = [0u8; VERSION_PREFIX_LENGTH];
    prefix.copy_from_slice(&ciphertext[..VERSION_PREFIX_LENGTH]);
    Ok(u64::from_be_bytes(prefix))
}

fn not_encrypt_decrypt(name: &CryptoKeyName, purpose: CryptoKeyPurpose) -> KmsError {
    KmsError::FailedPrecondition(format!(
        "crypto key {} has purpose {:?} and may not be used for encryption",
        name, purpose
    ))
}

impl FakeKms {
    pub async fn encrypt(&self, request: EncryptRequest) -> KmsResult<EncryptResponse> {
        ENCRYPT_FIELDS.check(&request)?;

        let version_name: CryptoKeyVersionName = match request.name.parse::<CryptoKeyOrVersionName>()? {
            CryptoKeyOrVersionName::Version(name) => name,
            CryptoKeyOrVersionName::Key(key_name) => {
                let entry = self.store().crypto_key(&key_name)?;
                let record = entry.read().await;
                if record.purpose != CryptoKeyPurpose::EncryptDecrypt {
                    return Err(not_encrypt_decrypt(&key_name, record.purpose));
                }
                let primary = record.primary.ok_or_else(|| {
                    KmsError::FailedPrecondition(format!(
                        "crypto key {} has no primary version",
                        key_name
                    ))
                })?;
                key_name.version(primary)
            }
        };

        let (snapshot, def) = self.enabled_version(&version_name).await?;
        Self::check_purpose(def, CryptoKeyPurpose::EncryptDecrypt, "encryption")?;

        let verified_plaintext_crc32c =
            verify_crc32c("plaintext", &request.plaintext, request.plaintext_crc32c)?;
        let verified_additional_authenticated_data_crc32c = verify_crc32c(
            "additional_authenticated_data",
            &request.additional_authenticated_data,
            request.additional_authenticated_data_crc32c,
        )?;

        let iv = generate_iv();
        let sealed = aead_key(&snapshot)?
            .seal(&iv, &request.plaintext, &request.additional_authenticated_data)
            .map_err(|e| {
                KmsError::Internal(format!(
                    "encryption with {} ({}) failed: {}",
                    version_name, def.algorithm, e
                ))
            })?;

        let mut ciphertext = Vec::with_capacity(HEADER_LENGTH + sealed.len());
        ciphertext.extend_from_slice(&version_name.version.to_be_bytes());
        ciphertext.extend_from_slice(&iv);
        ciphertext.extend_from_slice(&sealed);

        debug!(name = %version_name, bytes = request.plaintext.len(), "Encrypted");
        Ok(EncryptResponse {
            name: version_name.to_string(),
            ciphertext_crc32c: crc32c(&ciphertext),
            ciphertext,
            verified_plaintext_crc32c,
            verified_additional_authenticated_data_crc32c,
            protection_level: snapshot.protection_level,
        })
    }

    pub async fn decrypt(&self, request: DecryptRequest) -> KmsResult<DecryptResponse> {
        DECRYPT_FIELDS.check(&request)?;

        let key_name: CryptoKeyName = request.name.parse()?;
        let entry = self.store().crypto_key(&key_name)?;

        let (version_entry, version_name, primary) = {
            let record = entry.read().await;
            if record.purpose != CryptoKeyPurpose::EncryptDecrypt {
                return Err(not_encrypt_decrypt(&key_name, record.purpose));
            }

            let version_id = ciphertext_version(&request.ciphertext)?;
            let version_entry = record.version(version_id).ok_or_else(|| {
                KmsError::InvalidArgument("ciphertext was not produced by this crypto key".to_string())
            })?;
            (version_entry, key_name.version(version_id), record.primary)
        };

        let snapshot = version_entry.read().await.snapshot(&version_name);
        let (snapshot, def) = Self::check_enabled(snapshot)?;
        Self::check_purpose(def, CryptoKeyPurpose::EncryptDecrypt, "decryption")?;

        verify_crc32c("ciphertext", &request.ciphertext, request.ciphertext_crc32c)?;
        verify_crc32c(
            "additional_authenticated_data",
            &request.additional_authenticated_data,
            request.additional_authenticated_data_crc32c,
        )?;

        let (iv, sealed) = request.ciphertext[VERSION_PREFIX_LENGTH..].split_at(AES_GCM_IV_LENGTH);
        let plaintext = aead_key(&snapshot)?
            .open(iv, sealed, &request.additional_authenticated_data)
            .map_err(|e| KmsError::InvalidArgument(format!("decryption failed: {}", e)))?;

        debug!(name = %version_name, bytes = plaintext.len(), "Decrypted");
        Ok(DecryptResponse {
            plaintext_crc32c: crc32c(&plaintext),
            plaintext,
            used_primary: primary == Some(version_name.version),
            protection_level: snapshot.protection_level,
        })
    }
}
