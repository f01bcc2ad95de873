//! MacSign and MacVerify for MAC keys
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


use crate::engine::FakeKms;
use crate::error::{KmsError, KmsResult};
use crate::key_material::MacKey;
use crate::messages::{MacSignRequest, MacSignResponse, MacVerifyRequest, MacVerifyResponse};
use crate::names::CryptoKeyVersionName;
use crate::resources::CryptoKeyPurpose;
use crate::store::VersionSnapshot;
use crate::validation::{allowlist, crc32c, verify_crc32c, Allowlist};

const MAC_SIGN_FIELDS: Allowlist = allowlist(&["name", "data", "data_crc32c"]);

const MAC_VERIFY_FIELDS: Allowlist = allowlist(&["name", "data", "data_crc32c", "mac", "mac_crc32c"]);

fn mac_key(snapshot: &VersionSnapshot) -> KmsResult<MacKey<'_>> {
    snapshot.material()?.mac().ok_or_else(|| {
        KmsError::FailedPrecondition(format!(
            "keys with algorithm {} do not support MAC operations",
            snapshot.algorithm
        ))
    })
}

impl FakeKms {
    pub async fn mac_sign(&self, request: MacSignRequest) -> KmsResult<MacSignResponse> {
        MAC_SIGN_FIELDS.check(&request)?;

        let name: CryptoKeyVersionName = request.name.parse()?;
        let (snapshot, def) = self.enabled_version(&name).await?;
        Self::check_purpose(def, CryptoKeyPurpose::Mac, "MAC signing")?;

        let verified_data_crc32c = verify_crc32c("data", &request.data, request.data_crc32c)?;

        let mac = mac_key(&snapshot)?.sign(def.opts, &request.data).map_err(|e| {
            KmsError::Internal(format!("MAC signing with {} ({}) failed: {}", name, def.algorithm, e))
        })?;

        Ok(MacSignResponse {
            name: name.to_string(),
            mac_crc32c: crc32c(&mac),
            mac,
            verified_data_crc32c,
            protection_level: snapshot.protection_level,
        })
    }

    pub async fn mac_verify(&self, request: MacVerifyRequest) -> KmsResult<MacVerifyResponse> {
        MAC_VERIFY_FIELDS.check(&request)?;

        let name: CryptoKeyVersionName = request.name.parse()?;
        let (snapshot, def) = self.enabled_version(&name).await?;
        Self::check_purpose(def, CryptoKeyPurpose::Mac, "MAC verification")?;

        let verified_data_crc32c = verify_crc32c("data", &request.data, request.data_crc32c)?;
        let verified_mac_crc32c = verify_crc32c("mac", &request.mac, request.mac_crc32c)?;

        let success = mac_key(&snapshot)?
            .verify(def.opts, &request.data, &request.mac)
            .map_err(|e| {
                KmsError::Internal(format!(
                    "MAC verification with {} ({}) failed: {}",
                    name, def.algorithm, e
                ))
            })?;

        Ok(MacVerifyResponse {
            name: name.to_string(),
            success,
            verified_data_crc32c,
            verified_mac_crc32c,
            protection_level: snapshot.protection_level,
        })
    }
}
