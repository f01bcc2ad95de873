//! In-memory resource store
//!
//! Key rings and crypto keys live in concurrent maps keyed by their typed
//! names. Each crypto key carries its own lock over its version map, and each
//! version has its own lock, so there is no process-wide lock.
//!
//! Lock order is crypto key before version. Nothing takes a crypto key lock
//! while holding a version lock.
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
use crate::key_material::KeyMaterial;
use crate::names::{CryptoKeyName, CryptoKeyVersionName, KeyRingName, LocationName};
use crate::resources::{
    CryptoKey, CryptoKeyPurpose, CryptoKeyVersion, CryptoKeyVersionAlgorithm,
    CryptoKeyVersionState, CryptoKeyVersionTemplate, KeyRing, ProtectionLevel,
};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A crypto key version and the material it owns
#[derive(Debug)]
pub struct VersionRecord {
    pub version: CryptoKeyVersion,
    /// Present once generation succeeds; dropped on destruction
    pub material: Option<Arc<KeyMaterial>>,
}

pub type VersionEntry = Arc<RwLock<VersionRecord>>;

/// What a crypto operation needs from a version, copied out under its read lock
#[derive(Debug, Clone)]
pub struct VersionSnapshot {
    pub name: CryptoKeyVersionName,
    pub state: CryptoKeyVersionState,
    pub algorithm: CryptoKeyVersionAlgorithm,
    pub protection_level: ProtectionLevel,
    pub material: Option<Arc<KeyMaterial>>,
}

impl VersionSnapshot {
    /// Key material of an ENABLED version
    pub fn material(&self) -> KmsResult<&KeyMaterial> {
        self.material.as_deref().ok_or_else(|| {
            KmsError::Internal(format!("key version {} has no key material", self.name))
        })
    }
}

impl VersionRecord {
    pub fn snapshot(&self, name: &CryptoKeyVersionName) -> VersionSnapshot {
        VersionSnapshot {
            name: name.clone(),
            state: self.version.state,
            algorithm: self.version.algorithm,
            protection_level: self.version.protection_level,
            material: self.material.clone(),
        }
    }
}

/// A crypto key and its versions
#[derive(Debug)]
pub struct CryptoKeyRecord {
    pub name: CryptoKeyName,
    pub purpose: CryptoKeyPurpose,
    pub version_template: CryptoKeyVersionTemplate,
    pub labels: BTreeMap<String, String>,
    pub create_time: DateTime<Utc>,
    /// Version id of the primary; ENCRYPT_DECRYPT keys only
    pub primary: Option<u64>,
    versions: BTreeMap<u64, VersionEntry>,
    next_version: u64,
}

pub type CryptoKeyEntry = Arc<RwLock<CryptoKeyRecord>>;

impl CryptoKeyRecord {
    pub fn new(
        name: CryptoKeyName,
        purpose: CryptoKeyPurpose,
        version_template: CryptoKeyVersionTemplate,
        labels: BTreeMap<String, String>,
    ) -> Self {
        Self {
            name,
            purpose,
            version_template,
            labels,
            create_time: Utc::now(),
            primary: None,
            versions: BTreeMap::new(),
            next_version: 1,
        }
    }

    /// Add a PENDING_GENERATION version with the next server-assigned id
    pub fn add_version(
        &mut self,
        algorithm: CryptoKeyVersionAlgorithm,
        protection_level: ProtectionLevel,
    ) -> (CryptoKeyVersionName, VersionEntry) {
        let id = self.next_version;
        self.next_version += 1;

        let name = self.name.version(id);
        let record = VersionRecord {
            version: CryptoKeyVersion::new(name.to_string(), algorithm, protection_level),
            material: None,
        };
        let entry = Arc::new(RwLock::new(record));
        self.versions.insert(id, entry.clone());
        (name, entry)
    }

    pub fn version(&self, id: u64) -> Option<VersionEntry> {
        self.versions.get(&id).cloned()
    }

    /// Versions in ascending id order
    pub fn versions(&self) -> impl Iterator<Item = &VersionEntry> {
        self.versions.values()
    }

    /// Public view of the key, with a snapshot of the primary version
    pub async fn to_crypto_key(&self) -> CryptoKey {
        let primary = match self.primary.and_then(|id| self.version(id)) {
            Some(entry) => Some(entry.read().await.version.clone()),
            None => None,
        };

        CryptoKey {
            name: self.name.to_string(),
            purpose: self.purpose,
            version_template: self.version_template.clone(),
            primary,
            labels: self.labels.clone(),
            create_time: self.create_time,
        }
    }
}

/// Thread-safe store of every resource
#[derive(Default)]
pub struct ResourceStore {
    key_rings: DashMap<KeyRingName, KeyRing>,
    crypto_keys: DashMap<CryptoKeyName, CryptoKeyEntry>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key_ring(&self, name: KeyRingName) -> KmsResult<KeyRing> {
        match self.key_rings.entry(name) {
            Entry::Occupied(e) => Err(KmsError::AlreadyExists(e.key().to_string())),
            Entry::Vacant(e) => {
                let key_ring = KeyRing {
                    name: e.key().to_string(),
                    create_time: Utc::now(),
                };
                debug!(name = %key_ring.name, "Stored key ring");
                e.insert(key_ring.clone());
                Ok(key_ring)
            }
        }
    }

    pub fn key_ring(&self, name: &KeyRingName) -> KmsResult<KeyRing> {
        self.key_rings
            .get(name)
            .map(|r| r.value().clone())
            .ok_or_else(|| KmsError::NotFound(name.to_string()))
    }

    /// Key rings under `location`, sorted by name
    pub fn list_key_rings(&self, location: &LocationName) -> Vec<KeyRing> {
        let mut rings: Vec<(KeyRingName, KeyRing)> = self
            .key_rings
            .iter()
            .filter(|r| r.key().location == *location)
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        rings.sort_by(|a, b| a.0.cmp(&b.0));
        rings.into_iter().map(|(_, ring)| ring).collect()
    }

    /// Insert a crypto key; its key ring must already exist
    pub fn insert_crypto_key(&self, record: CryptoKeyRecord) -> KmsResult<CryptoKeyEntry> {
        self.key_ring(&record.name.key_ring)?;

        match self.crypto_keys.entry(record.name.clone()) {
            Entry::Occupied(e) => Err(KmsError::AlreadyExists(e.key().to_string())),
            Entry::Vacant(e) => {
                debug!(name = %record.name, purpose = ?record.purpose, "Stored crypto key");
                let entry = Arc::new(RwLock::new(record));
                e.insert(entry.clone());
                Ok(entry)
            }
        }
    }

    pub fn crypto_key(&self, name: &CryptoKeyName) -> KmsResult<CryptoKeyEntry> {
        self.crypto_keys
            .get(name)
            .map(|r| r.value().clone())
            .ok_or_else(|| KmsError::NotFound(name.to_string()))
    }

    /// Crypto keys under `key_ring`, sorted by name
    pub fn list_crypto_keys(&self, key_ring: &KeyRingName) -> Vec<CryptoKeyEntry> {
        let mut keys: Vec<(CryptoKeyName, CryptoKeyEntry)> = self
            .crypto_keys
            .iter()
            .filter(|r| r.key().key_ring == *key_ring)
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        keys.into_iter().map(|(_, entry)| entry).collect()
    }

    pub async fn version(&self, name: &CryptoKeyVersionName) -> KmsResult<VersionEntry> {
        let crypto_key = self.crypto_key(&name.crypto_key)?;
        let record = crypto_key.read().await;
        record
            .version(name.version)
            .ok_or_else(|| KmsError::NotFound(name.to_string()))
    }
}
