//! Key material held by crypto key versions
//!
//! Material is a closed variant. Callers query capabilities (`aead`, `mac`,
//! `asymmetric`) instead of matching on the variant, so an operation the
//! material cannot perform surfaces as `None` rather than a failed cast.
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


use crate::algorithms::{AlgorithmDef, CryptoOpts, EcCurve, HashAlgorithm, KeySpec, AES_GCM_IV_LENGTH};
use aes_gcm::aead::{Aead, KeyInit, Nonce, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use hmac::{Hmac, Mac};
use p256::ecdsa::signature::hazmat::PrehashSigner;
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pkcs8::{EncodePublicKey, LineEnding};
use rsa::{Oaep, Pkcs1v15Sign, Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

/// Low-level failures; the dispatcher classifies these before they leave the engine
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("RSA operation failed: {0}")]
    Rsa(#[from] rsa::Error),

    #[error("ECDSA operation failed: {0}")]
    Ecdsa(#[from] p256::ecdsa::Error),

    #[error("AEAD operation failed")]
    Aead,

    #[error("invalid key length: {0} bytes")]
    InvalidKeyLength(usize),

    #[error("invalid initialization vector length: got {got}, want {want}")]
    InvalidIvLength { got: usize, want: usize },

    #[error("public key encoding failed: {0}")]
    Encoding(String),

    #[error("key material does not support options {0:?}")]
    UnsupportedOptions(CryptoOpts),
}

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Key material owned by exactly one crypto key version
pub enum KeyMaterial {
    Aes(Zeroizing<Vec<u8>>),
    Hmac(Zeroizing<Vec<u8>>),
    Rsa(Box<RsaPrivateKey>),
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key bytes
        let kind = match self {
            KeyMaterial::Aes(k) => format!("Aes({} bits)", k.len() * 8),
            KeyMaterial::Hmac(k) => format!("Hmac({} bytes)", k.len()),
            KeyMaterial::Rsa(_) => "Rsa".to_string(),
            KeyMaterial::P256(_) => "P256".to_string(),
            KeyMaterial::P384(_) => "P384".to_string(),
        };
        f.debug_tuple("KeyMaterial").field(&kind).finish()
    }
}

fn random_bytes(len: usize) -> Zeroizing<Vec<u8>> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

impl KeyMaterial {
    /// Generate fresh material for an algorithm definition
    ///
    /// RSA generation is CPU bound; call it from a blocking context.
    pub fn generate(def: &AlgorithmDef) -> CryptoResult<Self> {
        let material = match def.key_spec {
            KeySpec::Aes { bits } => KeyMaterial::Aes(random_bytes(bits / 8)),
            KeySpec::Hmac { bytes } => KeyMaterial::Hmac(random_bytes(bytes)),
            KeySpec::Rsa { bits } => KeyMaterial::Rsa(Box::new(RsaPrivateKey::new(&mut OsRng, bits)?)),
            KeySpec::Ec(EcCurve::P256) => KeyMaterial::P256(p256::ecdsa::SigningKey::random(&mut OsRng)),
            KeySpec::Ec(EcCurve::P384) => KeyMaterial::P384(p384::ecdsa::SigningKey::random(&mut OsRng)),
        };
        Ok(material)
    }

    pub fn aead(&self) -> Option<AeadKey<'_>> {
        match self {
            KeyMaterial::Aes(key) => Some(AeadKey(key)),
            _ => None,
        }
    }

    pub fn mac(&self) -> Option<MacKey<'_>> {
        match self {
            KeyMaterial::Hmac(key) => Some(MacKey(key)),
            _ => None,
        }
    }

    /// Material with a public half: signers and decrypters
    pub fn asymmetric(&self) -> Option<AsymmetricKey<'_>> {
        match self {
            KeyMaterial::Rsa(key) => Some(AsymmetricKey::Rsa(key)),
            KeyMaterial::P256(key) => Some(AsymmetricKey::P256(key)),
            KeyMaterial::P384(key) => Some(AsymmetricKey::P384(key)),
            _ => None,
        }
    }
}

/// AES-GCM key
pub struct AeadKey<'a>(&'a [u8]);

/// Fresh random 96-bit IV
pub fn generate_iv() -> [u8; AES_GCM_IV_LENGTH] {
    let mut iv = [0u8; AES_GCM_IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}

fn check_iv(iv: &[u8]) -> CryptoResult<()> {
    if iv.len() != AES_GCM_IV_LENGTH {
        return Err(CryptoError::InvalidIvLength {
            got: iv.len(),
            want: AES_GCM_IV_LENGTH,
        });
    }
    Ok(())
}

fn seal_with<C: KeyInit + Aead>(key: &[u8], iv: &[u8], plaintext: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
    check_iv(iv)?;
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(iv), Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::Aead)
}

fn open_with<C: KeyInit + Aead>(key: &[u8], iv: &[u8], ciphertext: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
    check_iv(iv)?;
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength(key.len()))?;
    cipher
        .decrypt(Nonce::<C>::from_slice(iv), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::Aead)
}

impl AeadKey<'_> {
    /// Encrypt; the output is the sealed bytes followed by the 16-byte tag
    pub fn seal(&self, iv: &[u8], plaintext: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
        match self.0.len() {
            16 => seal_with::<Aes128Gcm>(self.0, iv, plaintext, aad),
            32 => seal_with::<Aes256Gcm>(self.0, iv, plaintext, aad),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }

    /// Decrypt and authenticate sealed bytes followed by the tag
    pub fn open(&self, iv: &[u8], ciphertext: &[u8], aad: &[u8]) -> CryptoResult<Vec<u8>> {
        match self.0.len() {
            16 => open_with::<Aes128Gcm>(self.0, iv, ciphertext, aad),
            32 => open_with::<Aes256Gcm>(self.0, iv, ciphertext, aad),
            n => Err(CryptoError::InvalidKeyLength(n)),
        }
    }
}

/// HMAC key
pub struct MacKey<'a>(&'a [u8]);

impl MacKey<'_> {
    fn hmac(&self, opts: CryptoOpts) -> CryptoResult<Hmac<Sha256>> {
        match opts {
            CryptoOpts::Hmac(HashAlgorithm::Sha256) => <Hmac<Sha256> as Mac>::new_from_slice(self.0)
                .map_err(|_| CryptoError::InvalidKeyLength(self.0.len())),
            other => Err(CryptoError::UnsupportedOptions(other)),
        }
    }

    pub fn sign(&self, opts: CryptoOpts, data: &[u8]) -> CryptoResult<Vec<u8>> {
        let mut mac = self.hmac(opts)?;
        mac.update(data);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Constant-time comparison against `tag`
    pub fn verify(&self, opts: CryptoOpts, data: &[u8], tag: &[u8]) -> CryptoResult<bool> {
        let mut mac = self.hmac(opts)?;
        mac.update(data);
        Ok(mac.verify_slice(tag).is_ok())
    }
}

/// Asymmetric private key
pub enum AsymmetricKey<'a> {
    Rsa(&'a RsaPrivateKey),
    P256(&'a p256::ecdsa::SigningKey),
    P384(&'a p384::ecdsa::SigningKey),
}

impl AsymmetricKey<'_> {
    /// PEM-encoded SubjectPublicKeyInfo
    pub fn public_key_pem(&self) -> CryptoResult<String> {
        let pem = match self {
            AsymmetricKey::Rsa(key) => RsaPublicKey::from(*key).to_public_key_pem(LineEnding::LF),
            AsymmetricKey::P256(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
            AsymmetricKey::P384(key) => key.verifying_key().to_public_key_pem(LineEnding::LF),
        };
        pem.map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    /// Sign a precomputed digest
    ///
    /// RSA-PSS uses a salt as long as the digest; PKCS#1 v1.5 prefixes the
    /// DigestInfo; ECDSA signatures are DER encoded.
    pub fn sign_digest(&self, opts: CryptoOpts, digest: &[u8]) -> CryptoResult<Vec<u8>> {
        let signature = match (self, opts) {
            (AsymmetricKey::Rsa(key), CryptoOpts::RsaPss(hash)) => match hash {
                HashAlgorithm::Sha256 => key.sign_with_rng(&mut OsRng, Pss::new::<Sha256>(), digest)?,
                HashAlgorithm::Sha384 => key.sign_with_rng(&mut OsRng, Pss::new::<Sha384>(), digest)?,
                HashAlgorithm::Sha512 => key.sign_with_rng(&mut OsRng, Pss::new::<Sha512>(), digest)?,
            },
            (AsymmetricKey::Rsa(key), CryptoOpts::RsaPkcs1(hash)) => match hash {
                HashAlgorithm::Sha256 => key.sign(Pkcs1v15Sign::new::<Sha256>(), digest)?,
                HashAlgorithm::Sha384 => key.sign(Pkcs1v15Sign::new::<Sha384>(), digest)?,
                HashAlgorithm::Sha512 => key.sign(Pkcs1v15Sign::new::<Sha512>(), digest)?,
            },
            (AsymmetricKey::P256(key), CryptoOpts::Ecdsa(HashAlgorithm::Sha256)) => {
                let signature: p256::ecdsa::Signature = key.sign_prehash(digest)?;
                signature.to_der().as_bytes().to_vec()
            }
            (AsymmetricKey::P384(key), CryptoOpts::Ecdsa(HashAlgorithm::Sha384)) => {
                let signature: p384::ecdsa::Signature = key.sign_prehash(digest)?;
                signature.to_der().as_bytes().to_vec()
            }
            (_, other) => return Err(CryptoError::UnsupportedOptions(other)),
        };
        Ok(signature)
    }

    /// RSA-OAEP decryption, MGF1 with the same hash, empty label
    pub fn decrypt(&self, opts: CryptoOpts, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        match (self, opts) {
            (AsymmetricKey::Rsa(key), CryptoOpts::RsaOaep(hash)) => {
                let plaintext = match hash {
                    HashAlgorithm::Sha256 => key.decrypt(Oaep::new::<Sha256>(), ciphertext)?,
                    HashAlgorithm::Sha384 => key.decrypt(Oaep::new::<Sha384>(), ciphertext)?,
                    HashAlgorithm::Sha512 => key.decrypt(Oaep::new::<Sha512>(), ciphertext)?,
                };
                Ok(plaintext)
            }
            (_, other) => Err(CryptoError::UnsupportedOptions(other)),
        }
    }
}
