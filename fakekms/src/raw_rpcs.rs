//! RawEncrypt and RawDecrypt for RAW_ENCRYPT_DECRYPT keys
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


use crate::algorithms::{AlgorithmDef, CryptoOpts, AES_GCM_IV_LENGTH};
use crate::engine::FakeKms;
use crate::error::{KmsError, KmsResult};
use crate::key_material::{generate_iv, AeadKey};
use crate::messages::{RawDecryptRequest, RawDecryptResponse, RawEncryptRequest, RawEncryptResponse};
use crate::names::CryptoKeyVersionName;
use crate::resources::CryptoKeyPurpose;
use crate::store::VersionSnapshot;
use crate::validation::{allowlist, crc32c, verify_crc32c, Allowlist};
use tracing::debug;

// Caller-supplied IVs are not supported
const RAW_ENCRYPT_FIELDS: Allowlist = allowlist(&[
    "name",
    "plaintext",
    "additional_authenticated_data",
    "plaintext_crc32c",
    "additional_authenticated_data_crc32c",
]);

const RAW_DECRYPT_FIELDS: Allowlist = allowlist(&[
    "name",
    "ciphertext",
    "additional_authenticated_data",
    "initialization_vector",
    "tag_length",
    "ciphertext_crc32c",
    "additional_authenticated_data_crc32c",
    "initialization_vector_crc32c",
]);

fn raw_aead_key(snapshot: &VersionSnapshot) -> KmsResult<AeadKey<'_>> {
    snapshot.material()?.aead().ok_or_else(|| {
        KmsError::FailedPrecondition(format!(
            "keys with algorithm {} do not support raw encryption",
            snapshot.algorithm
        ))
    })
}

fn tag_length(def: &AlgorithmDef) -> KmsResult<usize> {
    match def.opts {
        CryptoOpts::Aead { tag_length } => Ok(tag_length),
        other => Err(KmsError::Internal(format!(
            "algorithm {} has non-AEAD options {:?}",
            def.algorithm, other
        ))),
    }
}

impl FakeKms {
    pub async fn raw_encrypt(&self, request: RawEncryptRequest) -> KmsResult<RawEncryptResponse> {
        RAW_ENCRYPT_FIELDS.check(&request)?;

        let name: CryptoKeyVersionName = request.name.parse()?;
        let (snapshot, def) = self.enabled_version(&name).await?;
        Self::check_purpose(def, CryptoKeyPurpose::RawEncryptDecrypt, "raw encryption")?;

        let verified_plaintext_crc32c =
            verify_crc32c("plaintext", &request.plaintext, request.plaintext_crc32c)?;
        let verified_additional_authenticated_data_crc32c = verify_crc32c(
            "additional_authenticated_data",
            &request.additional_authenticated_data,
            request.additional_authenticated_data_crc32c,
        )?;
        let tag_length = tag_length(def)?;

        let iv = generate_iv();
        let ciphertext = raw_aead_key(&snapshot)?
            .seal(&iv, &request.plaintext, &request.additional_authenticated_data)
            .map_err(|e| {
                KmsError::Internal(format!(
                    "raw encryption with {} ({}) failed: {}",
                    name, def.algorithm, e
                ))
            })?;

        debug!(name = %name, bytes = request.plaintext.len(), "Raw encrypted");
        Ok(RawEncryptResponse {
            ciphertext_crc32c: crc32c(&ciphertext),
            ciphertext,
            initialization_vector_crc32c: crc32c(&iv),
            initialization_vector: iv.to_vec(),
            tag_length: tag_length as u32,
            verified_plaintext_crc32c,
            verified_additional_authenticated_data_crc32c,
            name: name.to_string(),
            protection_level: snapshot.protection_level,
        })
    }

    pub async fn raw_decrypt(&self, request: RawDecryptRequest) -> KmsResult<RawDecryptResponse> {
        RAW_DECRYPT_FIELDS.check(&request)?;

        let name: CryptoKeyVersionName = request.name.parse()?;
        let (snapshot, def) = self.enabled_version(&name).await?;
        Self::check_purpose(def, CryptoKeyPurpose::RawEncryptDecrypt, "raw decryption")?;

        let verified_ciphertext_crc32c =
            verify_crc32c("ciphertext", &request.ciphertext, request.ciphertext_crc32c)?;
        let verified_additional_authenticated_data_crc32c = verify_crc32c(
            "additional_authenticated_data",
            &request.additional_authenticated_data,
            request.additional_authenticated_data_crc32c,
        )?;
        let verified_initialization_vector_crc32c = verify_crc32c(
            "initialization_vector",
            &request.initialization_vector,
            request.initialization_vector_crc32c,
        )?;

        let expected_tag_length = tag_length(def)?;
        if request.tag_length != 0 && request.tag_length as usize != expected_tag_length {
            return Err(KmsError::InvalidArgument(format!(
                "tag_length={}, want {}",
                request.tag_length, expected_tag_length
            )));
        }
        if request.initialization_vector.len() != AES_GCM_IV_LENGTH {
            return Err(KmsError::InvalidArgument(format!(
                "len(initialization_vector)={}, want {}",
                request.initialization_vector.len(),
                AES_GCM_IV_LENGTH
            )));
        }
        if request.ciphertext.len() < expected_tag_length {
            return Err(KmsError::InvalidArgument(format!(
                "len(ciphertext)={} is shorter than the {}-byte tag",
                request.ciphertext.len(),
                expected_tag_length
            )));
        }

        let plaintext = raw_aead_key(&snapshot)?
            .open(
                &request.initialization_vector,
                &request.ciphertext,
                &request.additional_authenticated_data,
            )
            .map_err(|e| KmsError::InvalidArgument(format!("decryption failed: {}", e)))?;

        debug!(name = %name, bytes = plaintext.len(), "Raw decrypted");
        Ok(RawDecryptResponse {
            plaintext_crc32c: crc32c(&plaintext),
            plaintext,
            verified_ciphertext_crc32c,
            verified_additional_authenticated_data_crc32c,
            verified_initialization_vector_crc32c,
            protection_level: snapshot.protection_level,
        })
    }
}
