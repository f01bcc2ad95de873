//! Request and response messages, one pair per RPC
//!
//! Field names follow the emulated service's wire messages. Optional checksum
//! fields are `Option<u32>`; an unset checksum is distinct from a zero one.
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


use crate::resources::{
    CryptoKey, CryptoKeyPurpose, CryptoKeyVersion, CryptoKeyVersionAlgorithm,
    CryptoKeyVersionState, CryptoKeyVersionTemplate, KeyRing, ProtectionLevel,
};
use crate::validation::{populated, RequestFields};
use std::collections::BTreeMap;

// Admin

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateKeyRingRequest {
    /// Location name
    pub parent: String,
    pub key_ring_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetKeyRingRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListKeyRingsRequest {
    pub parent: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListKeyRingsResponse {
    pub key_rings: Vec<KeyRing>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateCryptoKeyRequest {
    /// Key ring name
    pub parent: String,
    pub crypto_key_id: String,
    /// Required
    pub purpose: Option<CryptoKeyPurpose>,
    pub version_template: Option<CryptoKeyVersionTemplate>,
    pub labels: BTreeMap<String, String>,
    /// Create the key with no versions
    pub skip_initial_version_creation: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetCryptoKeyRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListCryptoKeysRequest {
    pub parent: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListCryptoKeysResponse {
    pub crypto_keys: Vec<CryptoKey>,
}

/// Only the fields named in `update_mask` are applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCryptoKeyRequest {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub version_template: CryptoKeyVersionTemplate,
    pub update_mask: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCryptoKeyPrimaryVersionRequest {
    /// Crypto key name
    pub name: String,
    pub crypto_key_version_id: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreateCryptoKeyVersionRequest {
    /// Crypto key name
    pub parent: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetCryptoKeyVersionRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListCryptoKeyVersionsRequest {
    pub parent: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListCryptoKeyVersionsResponse {
    pub crypto_key_versions: Vec<CryptoKeyVersion>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCryptoKeyVersionRequest {
    pub name: String,
    pub state: Option<CryptoKeyVersionState>,
    pub update_mask: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DestroyCryptoKeyVersionRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestoreCryptoKeyVersionRequest {
    pub name: String,
}

// Symmetric

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncryptRequest {
    /// Crypto key name (primary version) or crypto key version name
    pub name: String,
    pub plaintext: Vec<u8>,
    pub additional_authenticated_data: Vec<u8>,
    pub plaintext_crc32c: Option<u32>,
    pub additional_authenticated_data_crc32c: Option<u32>,
}

impl RequestFields for EncryptRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        populated! {
            "name" => !self.name.is_empty(),
            "plaintext" => !self.plaintext.is_empty(),
            "additional_authenticated_data" => !self.additional_authenticated_data.is_empty(),
            "plaintext_crc32c" => self.plaintext_crc32c.is_some(),
            "additional_authenticated_data_crc32c" => self.additional_authenticated_data_crc32c.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncryptResponse {
    /// Version that produced the ciphertext
    pub name: String,
    pub ciphertext: Vec<u8>,
    pub ciphertext_crc32c: u32,
    pub verified_plaintext_crc32c: bool,
    pub verified_additional_authenticated_data_crc32c: bool,
    pub protection_level: ProtectionLevel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecryptRequest {
    /// Crypto key name; the version is recovered from the ciphertext
    pub name: String,
    pub ciphertext: Vec<u8>,
    pub additional_authenticated_data: Vec<u8>,
    pub ciphertext_crc32c: Option<u32>,
    pub additional_authenticated_data_crc32c: Option<u32>,
}

impl RequestFields for DecryptRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        populated! {
            "name" => !self.name.is_empty(),
            "ciphertext" => !self.ciphertext.is_empty(),
            "additional_authenticated_data" => !self.additional_authenticated_data.is_empty(),
            "ciphertext_crc32c" => self.ciphertext_crc32c.is_some(),
            "additional_authenticated_data_crc32c" => self.additional_authenticated_data_crc32c.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecryptResponse {
    pub plaintext: Vec<u8>,
    pub plaintext_crc32c: u32,
    /// Whether the version that decrypted is the key's current primary
    pub used_primary: bool,
    pub protection_level: ProtectionLevel,
}

// Raw symmetric

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEncryptRequest {
    /// Crypto key version name
    pub name: String,
    pub plaintext: Vec<u8>,
    pub additional_authenticated_data: Vec<u8>,
    pub plaintext_crc32c: Option<u32>,
    pub additional_authenticated_data_crc32c: Option<u32>,
    /// Caller-chosen IVs are not emulated; setting this is rejected
    pub initialization_vector: Vec<u8>,
    pub initialization_vector_crc32c: Option<u32>,
}

impl RequestFields for RawEncryptRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        populated! {
            "name" => !self.name.is_empty(),
            "plaintext" => !self.plaintext.is_empty(),
            "additional_authenticated_data" => !self.additional_authenticated_data.is_empty(),
            "plaintext_crc32c" => self.plaintext_crc32c.is_some(),
            "additional_authenticated_data_crc32c" => self.additional_authenticated_data_crc32c.is_some(),
            "initialization_vector" => !self.initialization_vector.is_empty(),
            "initialization_vector_crc32c" => self.initialization_vector_crc32c.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEncryptResponse {
    /// Sealed bytes followed by the tag
    pub ciphertext: Vec<u8>,
    pub initialization_vector: Vec<u8>,
    pub tag_length: u32,
    pub ciphertext_crc32c: u32,
    pub initialization_vector_crc32c: u32,
    pub verified_plaintext_crc32c: bool,
    pub verified_additional_authenticated_data_crc32c: bool,
    pub name: String,
    pub protection_level: ProtectionLevel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDecryptRequest {
    pub name: String,
    pub ciphertext: Vec<u8>,
    pub additional_authenticated_data: Vec<u8>,
    pub initialization_vector: Vec<u8>,
    /// 0 means the default of 16
    pub tag_length: u32,
    pub ciphertext_crc32c: Option<u32>,
    pub additional_authenticated_data_crc32c: Option<u32>,
    pub initialization_vector_crc32c: Option<u32>,
}

impl RequestFields for RawDecryptRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        populated! {
            "name" => !self.name.is_empty(),
            "ciphertext" => !self.ciphertext.is_empty(),
            "additional_authenticated_data" => !self.additional_authenticated_data.is_empty(),
            "initialization_vector" => !self.initialization_vector.is_empty(),
            "tag_length" => self.tag_length != 0,
            "ciphertext_crc32c" => self.ciphertext_crc32c.is_some(),
            "additional_authenticated_data_crc32c" => self.additional_authenticated_data_crc32c.is_some(),
            "initialization_vector_crc32c" => self.initialization_vector_crc32c.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawDecryptResponse {
    pub plaintext: Vec<u8>,
    pub plaintext_crc32c: u32,
    pub verified_ciphertext_crc32c: bool,
    pub verified_additional_authenticated_data_crc32c: bool,
    pub verified_initialization_vector_crc32c: bool,
    pub protection_level: ProtectionLevel,
}

// Asymmetric

/// Precomputed message digest; exactly one hash is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Digest {
    Sha256(Vec<u8>),
    Sha384(Vec<u8>),
    Sha512(Vec<u8>),
}

impl Digest {
    fn field(&self) -> &'static str {
        match self {
            Digest::Sha256(_) => "digest.sha256",
            Digest::Sha384(_) => "digest.sha384",
            Digest::Sha512(_) => "digest.sha512",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsymmetricSignRequest {
    pub name: String,
    pub digest: Option<Digest>,
    pub digest_crc32c: Option<u32>,
    /// Raw-data signing is not emulated; setting this is rejected
    pub data: Vec<u8>,
    pub data_crc32c: Option<u32>,
}

impl RequestFields for AsymmetricSignRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        let mut fields = populated! {
            "name" => !self.name.is_empty(),
            "digest_crc32c" => self.digest_crc32c.is_some(),
            "data" => !self.data.is_empty(),
            "data_crc32c" => self.data_crc32c.is_some(),
        };
        if let Some(digest) = &self.digest {
            fields.push(digest.field());
        }
        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsymmetricSignResponse {
    pub signature: Vec<u8>,
    pub signature_crc32c: u32,
    pub name: String,
    pub protection_level: ProtectionLevel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsymmetricDecryptRequest {
    pub name: String,
    pub ciphertext: Vec<u8>,
    pub ciphertext_crc32c: Option<u32>,
}

impl RequestFields for AsymmetricDecryptRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        populated! {
            "name" => !self.name.is_empty(),
            "ciphertext" => !self.ciphertext.is_empty(),
            "ciphertext_crc32c" => self.ciphertext_crc32c.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AsymmetricDecryptResponse {
    pub plaintext: Vec<u8>,
    pub plaintext_crc32c: u32,
    pub protection_level: ProtectionLevel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetPublicKeyRequest {
    pub name: String,
}

impl RequestFields for GetPublicKeyRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        populated! {
            "name" => !self.name.is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublicKey {
    pub pem: String,
    pub pem_crc32c: u32,
    pub algorithm: CryptoKeyVersionAlgorithm,
    pub name: String,
    pub protection_level: ProtectionLevel,
}

// MAC

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacSignRequest {
    pub name: String,
    pub data: Vec<u8>,
    pub data_crc32c: Option<u32>,
}

impl RequestFields for MacSignRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        populated! {
            "name" => !self.name.is_empty(),
            "data" => !self.data.is_empty(),
            "data_crc32c" => self.data_crc32c.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacSignResponse {
    pub name: String,
    pub mac: Vec<u8>,
    pub mac_crc32c: u32,
    pub verified_data_crc32c: bool,
    pub protection_level: ProtectionLevel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacVerifyRequest {
    pub name: String,
    pub data: Vec<u8>,
    pub data_crc32c: Option<u32>,
    pub mac: Vec<u8>,
    pub mac_crc32c: Option<u32>,
}

impl RequestFields for MacVerifyRequest {
    fn populated_fields(&self) -> Vec<&'static str> {
        populated! {
            "name" => !self.name.is_empty(),
            "data" => !self.data.is_empty(),
            "data_crc32c" => self.data_crc32c.is_some(),
            "mac" => !self.mac.is_empty(),
            "mac_crc32c" => self.mac_crc32c.is_some(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacVerifyResponse {
    pub name: String,
    pub success: bool,
    pub verified_data_crc32c: bool,
    pub verified_mac_crc32c: bool,
    pub protection_level: ProtectionLevel,
}
