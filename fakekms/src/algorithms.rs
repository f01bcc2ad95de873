//! Algorithm registry
//!
//! A closed, immutable table with one entry per supported algorithm. Every
//! other component asks this table which purpose an algorithm serves, which
//! protection levels it may use, how its key material is generated, and which
//! hash/padding/tag parameters its operations use.
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


use crate::error::{KmsError, KmsResult};
use crate::resources::{CryptoKeyPurpose, CryptoKeyVersionAlgorithm, ProtectionLevel};

use CryptoKeyPurpose as Purpose;
use CryptoKeyVersionAlgorithm as Alg;
use HashAlgorithm::{Sha256, Sha384, Sha512};

/// AES-GCM authentication tag length in bytes
pub const AES_GCM_TAG_LENGTH: usize = 16;

/// AES-GCM nonce (initialization vector) length in bytes
pub const AES_GCM_IV_LENGTH: usize = 12;

/// Hash functions referenced by algorithm definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Digest size in bytes
    pub fn size(self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Request field carrying a digest of this hash
    pub fn digest_field(self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "digest.sha256",
            HashAlgorithm::Sha384 => "digest.sha384",
            HashAlgorithm::Sha512 => "digest.sha512",
        }
    }
}

/// Elliptic curves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
}

/// How key material for an algorithm is generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySpec {
    Aes { bits: usize },
    Rsa { bits: usize },
    Ec(EcCurve),
    Hmac { bytes: usize },
}

/// Parameters every operation with the algorithm must use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoOpts {
    Aead { tag_length: usize },
    RsaPss(HashAlgorithm),
    RsaPkcs1(HashAlgorithm),
    RsaOaep(HashAlgorithm),
    Ecdsa(HashAlgorithm),
    Hmac(HashAlgorithm),
}

impl CryptoOpts {
    /// Hash used for signing, or None if the options do not describe a signer
    pub fn signing_hash(&self) -> Option<HashAlgorithm> {
        match self {
            CryptoOpts::RsaPss(h) | CryptoOpts::RsaPkcs1(h) | CryptoOpts::Ecdsa(h) => Some(*h),
            _ => None,
        }
    }
}

/// Registry entry for a single algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmDef {
    pub algorithm: CryptoKeyVersionAlgorithm,
    pub purpose: CryptoKeyPurpose,
    pub protection_levels: &'static [ProtectionLevel],
    pub key_spec: KeySpec,
    pub opts: CryptoOpts,
}

impl AlgorithmDef {
    pub fn supports_protection_level(&self, level: ProtectionLevel) -> bool {
        self.protection_levels.contains(&level)
    }

    /// Whether generating this algorithm's key is expensive enough to move off
    /// the async worker threads
    pub fn is_slow_to_generate(&self) -> bool {
        matches!(self.key_spec, KeySpec::Rsa { .. })
    }
}

const SOFTWARE_OR_HSM: &[ProtectionLevel] = &[ProtectionLevel::Software, ProtectionLevel::Hsm];

const fn def(
    algorithm: CryptoKeyVersionAlgorithm,
    purpose: CryptoKeyPurpose,
    key_spec: KeySpec,
    opts: CryptoOpts,
) -> AlgorithmDef {
    AlgorithmDef {
        algorithm,
        purpose,
        protection_levels: SOFTWARE_OR_HSM,
        key_spec,
        opts,
    }
}

const AEAD: CryptoOpts = CryptoOpts::Aead {
    tag_length: AES_GCM_TAG_LENGTH,
};

static ALGORITHMS: &[AlgorithmDef] = &[
    def(Alg::GoogleSymmetricEncryption, Purpose::EncryptDecrypt, KeySpec::Aes { bits: 256 }, AEAD),
    def(Alg::Aes128Gcm, Purpose::RawEncryptDecrypt, KeySpec::Aes { bits: 128 }, AEAD),
    def(Alg::Aes256Gcm, Purpose::RawEncryptDecrypt, KeySpec::Aes { bits: 256 }, AEAD),
    def(Alg::RsaSignPss2048Sha256, Purpose::AsymmetricSign, KeySpec::Rsa { bits: 2048 }, CryptoOpts::RsaPss(Sha256)),
    def(Alg::RsaSignPss3072Sha256, Purpose::AsymmetricSign, KeySpec::Rsa { bits: 3072 }, CryptoOpts::RsaPss(Sha256)),
    def(Alg::RsaSignPss4096Sha256, Purpose::AsymmetricSign, KeySpec::Rsa { bits: 4096 }, CryptoOpts::RsaPss(Sha256)),
    def(Alg::RsaSignPss4096Sha512, Purpose::AsymmetricSign, KeySpec::Rsa { bits: 4096 }, CryptoOpts::RsaPss(Sha512)),
    def(Alg::RsaSignPkcs1_2048Sha256, Purpose::AsymmetricSign, KeySpec::Rsa { bits: 2048 }, CryptoOpts::RsaPkcs1(Sha256)),
    def(Alg::RsaSignPkcs1_3072Sha256, Purpose::AsymmetricSign, KeySpec::Rsa { bits: 3072 }, CryptoOpts::RsaPkcs1(Sha256)),
    def(Alg::RsaSignPkcs1_4096Sha256, Purpose::AsymmetricSign, KeySpec::Rsa { bits: 4096 }, CryptoOpts::RsaPkcs1(Sha256)),
    def(Alg::RsaSignPkcs1_4096Sha512, Purpose::AsymmetricSign, KeySpec::Rsa { bits: 4096 }, CryptoOpts::RsaPkcs1(Sha512)),
    def(Alg::RsaDecryptOaep2048Sha256, Purpose::AsymmetricDecrypt, KeySpec::Rsa { bits: 2048 }, CryptoOpts::RsaOaep(Sha256)),
    def(Alg::RsaDecryptOaep3072Sha256, Purpose::AsymmetricDecrypt, KeySpec::Rsa { bits: 3072 }, CryptoOpts::RsaOaep(Sha256)),
    def(Alg::RsaDecryptOaep4096Sha256, Purpose::AsymmetricDecrypt, KeySpec::Rsa { bits: 4096 }, CryptoOpts::RsaOaep(Sha256)),
    def(Alg::RsaDecryptOaep4096Sha512, Purpose::AsymmetricDecrypt, KeySpec::Rsa { bits: 4096 }, CryptoOpts::RsaOaep(Sha512)),
    def(Alg::EcSignP256Sha256, Purpose::AsymmetricSign, KeySpec::Ec(EcCurve::P256), CryptoOpts::Ecdsa(Sha256)),
    def(Alg::EcSignP384Sha384, Purpose::AsymmetricSign, KeySpec::Ec(EcCurve::P384), CryptoOpts::Ecdsa(Sha384)),
    def(Alg::HmacSha256, Purpose::Mac, KeySpec::Hmac { bytes: 32 }, CryptoOpts::Hmac(Sha256)),
];

/// Look up the definition for an algorithm
pub fn algorithm_def(algorithm: CryptoKeyVersionAlgorithm) -> Option<&'static AlgorithmDef> {
    all_defs().iter().find(|d| d.algorithm == algorithm)
}

/// Like [`algorithm_def`], but a missing entry is an emulator defect
pub fn require_def(algorithm: CryptoKeyVersionAlgorithm) -> KmsResult<&'static AlgorithmDef> {
    algorithm_def(algorithm).ok_or_else(|| {
        KmsError::Internal(format!("no registry entry for algorithm {}", algorithm))
    })
}

/// All registered definitions, in registry order
pub fn all_defs() -> &'static [AlgorithmDef] {
    ALGORITHMS
}

/// Algorithm used when a crypto key's version template names none
pub fn default_algorithm(purpose: CryptoKeyPurpose) -> Option<CryptoKeyVersionAlgorithm> {
    match purpose {
        CryptoKeyPurpose::EncryptDecrypt => Some(Alg::GoogleSymmetricEncryption),
        _ => None,
    }
}
