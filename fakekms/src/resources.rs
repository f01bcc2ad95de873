//! Resource type definitions: key rings, crypto keys, and crypto key versions
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


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a crypto key may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyPurpose {
    EncryptDecrypt,
    RawEncryptDecrypt,
    AsymmetricSign,
    AsymmetricDecrypt,
    Mac,
}

/// Backing storage class for key material
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtectionLevel {
    #[default]
    Software,
    Hsm,
    External,
    ExternalVpc,
}

/// Lifecycle state of a crypto key version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyVersionState {
    PendingGeneration,
    Enabled,
    Disabled,
    Destroyed,
    DestroyScheduled,
    PendingImport,
    ImportFailed,
    GenerationFailed,
}

/// Algorithms the emulator can generate and operate with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CryptoKeyVersionAlgorithm {
    GoogleSymmetricEncryption,
    #[serde(rename = "AES_128_GCM")]
    Aes128Gcm,
    #[serde(rename = "AES_256_GCM")]
    Aes256Gcm,
    #[serde(rename = "RSA_SIGN_PSS_2048_SHA256")]
    RsaSignPss2048Sha256,
    #[serde(rename = "RSA_SIGN_PSS_3072_SHA256")]
    RsaSignPss3072Sha256,
    #[serde(rename = "RSA_SIGN_PSS_4096_SHA256")]
    RsaSignPss4096Sha256,
    #[serde(rename = "RSA_SIGN_PSS_4096_SHA512")]
    RsaSignPss4096Sha512,
    #[serde(rename = "RSA_SIGN_PKCS1_2048_SHA256")]
    RsaSignPkcs1_2048Sha256,
    #[serde(rename = "RSA_SIGN_PKCS1_3072_SHA256")]
    RsaSignPkcs1_3072Sha256,
    #[serde(rename = "RSA_SIGN_PKCS1_4096_SHA256")]
    RsaSignPkcs1_4096Sha256,
    #[serde(rename = "RSA_SIGN_PKCS1_4096_SHA512")]
    RsaSignPkcs1_4096Sha512,
    #[serde(rename = "RSA_DECRYPT_OAEP_2048_SHA256")]
    RsaDecryptOaep2048Sha256,
    #[serde(rename = "RSA_DECRYPT_OAEP_3072_SHA256")]
    RsaDecryptOaep3072Sha256,
    #[serde(rename = "RSA_DECRYPT_OAEP_4096_SHA256")]
    RsaDecryptOaep4096Sha256,
    #[serde(rename = "RSA_DECRYPT_OAEP_4096_SHA512")]
    RsaDecryptOaep4096Sha512,
    #[serde(rename = "EC_SIGN_P256_SHA256")]
    EcSignP256Sha256,
    #[serde(rename = "EC_SIGN_P384_SHA384")]
    EcSignP384Sha384,
    #[serde(rename = "HMAC_SHA256")]
    HmacSha256,
}

impl fmt::Display for CryptoKeyVersionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::GoogleSymmetricEncryption => "GOOGLE_SYMMETRIC_ENCRYPTION",
            Self::Aes128Gcm => "AES_128_GCM",
            Self::Aes256Gcm => "AES_256_GCM",
            Self::RsaSignPss2048Sha256 => "RSA_SIGN_PSS_2048_SHA256",
            Self::RsaSignPss3072Sha256 => "RSA_SIGN_PSS_3072_SHA256",
            Self::RsaSignPss4096Sha256 => "RSA_SIGN_PSS_4096_SHA256",
            Self::RsaSignPss4096Sha512 => "RSA_SIGN_PSS_4096_SHA512",
            Self::RsaSignPkcs1_2048Sha256 => "RSA_SIGN_PKCS1_2048_SHA256",
            Self::RsaSignPkcs1_3072Sha256 => "RSA_SIGN_PKCS1_3072_SHA256",
            Self::RsaSignPkcs1_4096Sha256 => "RSA_SIGN_PKCS1_4096_SHA256",
            Self::RsaSignPkcs1_4096Sha512 => "RSA_SIGN_PKCS1_4096_SHA512",
            Self::RsaDecryptOaep2048Sha256 => "RSA_DECRYPT_OAEP_2048_SHA256",
            Self::RsaDecryptOaep3072Sha256 => "RSA_DECRYPT_OAEP_3072_SHA256",
            Self::RsaDecryptOaep4096Sha256 => "RSA_DECRYPT_OAEP_4096_SHA256",
            Self::RsaDecryptOaep4096Sha512 => "RSA_DECRYPT_OAEP_4096_SHA512",
            Self::EcSignP256Sha256 => "EC_SIGN_P256_SHA256",
            Self::EcSignP384Sha384 => "EC_SIGN_P384_SHA384",
            Self::HmacSha256 => "HMAC_SHA256",
        };
        f.write_str(s)
    }
}

impl fmt::Display for CryptoKeyVersionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PendingGeneration => "PENDING_GENERATION",
            Self::Enabled => "ENABLED",
            Self::Disabled => "DISABLED",
            Self::Destroyed => "DESTROYED",
            Self::DestroyScheduled => "DESTROY_SCHEDULED",
            Self::PendingImport => "PENDING_IMPORT",
            Self::ImportFailed => "IMPORT_FAILED",
            Self::GenerationFailed => "GENERATION_FAILED",
        };
        f.write_str(s)
    }
}

/// Key ring resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyRing {
    pub name: String,
    pub create_time: DateTime<Utc>,
}

/// Template applied to versions created under a crypto key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CryptoKeyVersionTemplate {
    /// Unset means the purpose's default, which only exists for ENCRYPT_DECRYPT
    pub algorithm: Option<CryptoKeyVersionAlgorithm>,
    pub protection_level: ProtectionLevel,
}

/// Crypto key resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoKey {
    pub name: String,
    pub purpose: CryptoKeyPurpose,
    pub version_template: CryptoKeyVersionTemplate,
    /// Snapshot of the primary version; only ENCRYPT_DECRYPT keys have one
    pub primary: Option<CryptoKeyVersion>,
    pub labels: BTreeMap<String, String>,
    pub create_time: DateTime<Utc>,
}

/// Crypto key version resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CryptoKeyVersion {
    pub name: String,
    pub state: CryptoKeyVersionState,
    pub protection_level: ProtectionLevel,
    pub algorithm: CryptoKeyVersionAlgorithm,
    pub create_time: DateTime<Utc>,
    pub generate_time: Option<DateTime<Utc>>,
    /// When a DESTROY_SCHEDULED version will be destroyed
    pub destroy_time: Option<DateTime<Utc>>,
    /// When the version was actually destroyed
    pub destroy_event_time: Option<DateTime<Utc>>,
}

impl CryptoKeyVersion {
    pub fn new(
        name: String,
        algorithm: CryptoKeyVersionAlgorithm,
        protection_level: ProtectionLevel,
    ) -> Self {
        Self {
            name,
            state: CryptoKeyVersionState::PendingGeneration,
            protection_level,
            algorithm,
            create_time: Utc::now(),
            generate_time: None,
            destroy_time: None,
            destroy_event_time: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state == CryptoKeyVersionState::Enabled
    }
}
