//! GetPublicKey, AsymmetricSign and AsymmetricDecrypt
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


use crate::algorithms::HashAlgorithm;
use crate::engine::FakeKms;
use crate::error::{KmsError, KmsResult};
use crate::key_material::AsymmetricKey;
use crate::messages::{
    AsymmetricDecryptRequest, AsymmetricDecryptResponse, AsymmetricSignRequest,
    AsymmetricSignResponse, Digest, GetPublicKeyRequest, PublicKey,
};
use crate::names::CryptoKeyVersionName;
use crate::resources::CryptoKeyPurpose;
use crate::store::VersionSnapshot;
use crate::validation::{allowlist, crc32c, verify_crc32c, Allowlist};
use tracing::debug;

const GET_PUBLIC_KEY_FIELDS: Allowlist = allowlist(&["name"]);

const ASYMMETRIC_DECRYPT_FIELDS: Allowlist = allowlist(&["name", "ciphertext", "ciphertext_crc32c"]);

// Raw-data signing and digest checksums are not emulated
const ASYMMETRIC_SIGN_FIELDS: Allowlist =
    allowlist(&["name", "digest.sha256", "digest.sha384", "digest.sha512"]);

fn asymmetric_key(snapshot: &VersionSnapshot) -> KmsResult<AsymmetricKey<'_>> {
    snapshot.material()?.asymmetric().ok_or_else(|| {
        KmsError::FailedPrecondition(format!(
            "keys with algorithm {} do not contain a public key",
            snapshot.algorithm
        ))
    })
}

/// The digest bytes for `hash`, or empty if the request carries another hash
fn select_digest(digest: Option<&Digest>, hash: HashAlgorithm) -> &[u8] {
    match (digest, hash) {
        (Some(Digest::Sha256(d)), HashAlgorithm::Sha256)
        | (Some(Digest::Sha384(d)), HashAlgorithm::Sha384)
        | (Some(Digest::Sha512(d)), HashAlgorithm::Sha512) => d.as_slice(),
        _ => &[],
    }
}

impl FakeKms {
    pub async fn get_public_key(&self, request: GetPublicKeyRequest) -> KmsResult<PublicKey> {
        GET_PUBLIC_KEY_FIELDS.check(&request)?;

        let name: CryptoKeyVersionName = request.name.parse()?;
        let (snapshot, def) = self.enabled_version(&name).await?;

        let pem = asymmetric_key(&snapshot)?.public_key_pem().map_err(|e| {
            KmsError::Internal(format!(
                "encoding the public key of {} ({}) failed: {}",
                name, def.algorithm, e
            ))
        })?;

        Ok(PublicKey {
            pem_crc32c: crc32c(pem.as_bytes()),
            pem,
            algorithm: def.algorithm,
            name: name.to_string(),
            protection_level: snapshot.protection_level,
        })
    }

    pub async fn asymmetric_decrypt(
        &self,
        request: AsymmetricDecryptRequest,
    ) -> KmsResult<AsymmetricDecryptResponse> {
        ASYMMETRIC_DECRYPT_FIELDS.check(&request)?;

        let name: CryptoKeyVersionName = request.name.parse()?;
        let (snapshot, def) = self.enabled_version(&name).await?;
        Self::check_purpose(def, CryptoKeyPurpose::AsymmetricDecrypt, "asymmetric decryption")?;

        verify_crc32c("ciphertext", &request.ciphertext, request.ciphertext_crc32c)?;

        let plaintext = asymmetric_key(&snapshot)?
            .decrypt(def.opts, &request.ciphertext)
            .map_err(|e| KmsError::InvalidArgument(format!("decryption failed: {}", e)))?;

        debug!(name = %name, bytes = plaintext.len(), "Asymmetric decrypted");
        Ok(AsymmetricDecryptResponse {
            plaintext_crc32c: crc32c(&plaintext),
            plaintext,
            protection_level: snapshot.protection_level,
        })
    }

    pub async fn asymmetric_sign(&self, request: AsymmetricSignRequest) -> KmsResult<AsymmetricSignResponse> {
        ASYMMETRIC_SIGN_FIELDS.check(&request)?;

        let name: CryptoKeyVersionName = request.name.parse()?;
        let (snapshot, def) = self.enabled_version(&name).await?;
        Self::check_purpose(def, CryptoKeyPurpose::AsymmetricSign, "signing")?;

        let hash = def.opts.signing_hash().ok_or_else(|| {
            KmsError::Internal(format!("algorithm {} has no signing hash", def.algorithm))
        })?;

        let digest = select_digest(request.digest.as_ref(), hash);
        if digest.len() != hash.size() {
            return Err(KmsError::InvalidArgument(format!(
                "len({})={}, want {}",
                hash.digest_field(),
                digest.len(),
                hash.size()
            )));
        }

        let signature = asymmetric_key(&snapshot)?
            .sign_digest(def.opts, digest)
            .map_err(|e| {
                KmsError::Internal(format!(
                    "signing with {} ({}) failed: {}",
                    name, def.algorithm, e
                ))
            })?;

        debug!(name = %name, algorithm = %def.algorithm, "Signed digest");
        Ok(AsymmetricSignResponse {
            signature_crc32c: crc32c(&signature),
            signature,
            name: name.to_string(),
            protection_level: snapshot.protection_level,
        })
    }
}
