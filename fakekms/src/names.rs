//! Typed resource names
//!
//! Every RPC addresses resources by string name. Names are parsed here, before
//! any store lookup, so malformed names fail with `InvalidArgument` and never
//! reach the store.
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
use crate::validation::check_resource_id;
use std::fmt;
use std::str::FromStr;

/// `projects/{project}/locations/{location}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationName {
    pub project: String,
    pub location: String,
}

/// `projects/{project}/locations/{location}/keyRings/{key_ring}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyRingName {
    pub location: LocationName,
    pub key_ring: String,
}

/// `.../keyRings/{key_ring}/cryptoKeys/{crypto_key}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CryptoKeyName {
    pub key_ring: KeyRingName,
    pub crypto_key: String,
}

/// `.../cryptoKeys/{crypto_key}/cryptoKeyVersions/{version}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CryptoKeyVersionName {
    pub crypto_key: CryptoKeyName,
    pub version: u64,
}

/// A name that may address either a crypto key or one of its versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoKeyOrVersionName {
    Key(CryptoKeyName),
    Version(CryptoKeyVersionName),
}

/// Split `name` into segments and check the literal collection segments
fn segments<'a>(name: &'a str, collections: &[&str]) -> KmsResult<Vec<&'a str>> {
    let parts: Vec<&str> = name.split('/').collect();
    if parts.len() != collections.len() * 2 {
        return Err(malformed(name));
    }

    let mut ids = Vec::with_capacity(collections.len());
    for (pair, collection) in parts.chunks(2).zip(collections) {
        if pair[0] != *collection || pair[1].is_empty() {
            return Err(malformed(name));
        }
        ids.push(pair[1]);
    }
    Ok(ids)
}

fn malformed(name: &str) -> KmsError {
    KmsError::InvalidArgument(format!("malformed resource name: {:?}", name))
}

impl LocationName {
    pub fn new(project: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            location: location.into(),
        }
    }

    pub fn key_ring(&self, key_ring_id: &str) -> KmsResult<KeyRingName> {
        check_resource_id(key_ring_id)?;
        Ok(KeyRingName {
            location: self.clone(),
            key_ring: key_ring_id.to_string(),
        })
    }
}

impl KeyRingName {
    pub fn crypto_key(&self, crypto_key_id: &str) -> KmsResult<CryptoKeyName> {
        check_resource_id(crypto_key_id)?;
        Ok(CryptoKeyName {
            key_ring: self.clone(),
            crypto_key: crypto_key_id.to_string(),
        })
    }
}

impl CryptoKeyName {
    pub fn version(&self, version: u64) -> CryptoKeyVersionName {
        CryptoKeyVersionName {
            crypto_key: self.clone(),
            version,
        }
    }
}

impl FromStr for LocationName {
    type Err = KmsError;

    fn from_str(s: &str) -> KmsResult<Self> {
        let ids = segments(s, &["projects", "locations"])?;
        Ok(Self::new(ids[0], ids[1]))
    }
}

impl FromStr for KeyRingName {
    type Err = KmsError;

    fn from_str(s: &str) -> KmsResult<Self> {
        let ids = segments(s, &["projects", "locations", "keyRings"])?;
        check_resource_id(ids[2]).map_err(|_| malformed(s))?;
        Ok(Self {
            location: LocationName::new(ids[0], ids[1]),
            key_ring: ids[2].to_string(),
        })
    }
}

impl FromStr for CryptoKeyName {
    type Err = KmsError;

    fn from_str(s: &str) -> KmsResult<Self> {
        let ids = segments(s, &["projects", "locations", "keyRings", "cryptoKeys"])?;
        check_resource_id(ids[2]).map_err(|_| malformed(s))?;
        check_resource_id(ids[3]).map_err(|_| malformed(s))?;
        Ok(Self {
            key_ring: KeyRingName {
                location: LocationName::new(ids[0], ids[1]),
                key_ring: ids[2].to_string(),
            },
            crypto_key: ids[3].to_string(),
        })
    }
}

impl FromStr for CryptoKeyVersionName {
    type Err = KmsError;

    fn from_str(s: &str) -> KmsResult<Self> {
        let (parent, version) = s.rsplit_once("/cryptoKeyVersions/").ok_or_else(|| malformed(s))?;
        let crypto_key: CryptoKeyName = parent.parse().map_err(|_| malformed(s))?;

        // Version ids are server-assigned positive integers
        if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed(s));
        }
        let version = version.parse::<u64>().map_err(|_| malformed(s))?;
        if version == 0 {
            return Err(malformed(s));
        }

        Ok(Self {
            crypto_key,
            version,
        })
    }
}

impl FromStr for CryptoKeyOrVersionName {
    type Err = KmsError;

    fn from_str(s: &str) -> KmsResult<Self> {
        if s.contains("/cryptoKeyVersions/") {
            s.parse().map(CryptoKeyOrVersionName::Version)
        } else {
            s.parse().map(CryptoKeyOrVersionName::Key)
        }
    }
}

impl fmt::Display for LocationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "projects/{}/locations/{}", self.project, self.location)
    }
}

impl fmt::Display for KeyRingName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/keyRings/{}", self.location, self.key_ring)
    }
}

impl fmt::Display for CryptoKeyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/cryptoKeys/{}", self.key_ring, self.crypto_key)
    }
}

impl fmt::Display for CryptoKeyVersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/cryptoKeyVersions/{}", self.crypto_key, self.version)
    }
}

impl fmt::Display for CryptoKeyOrVersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoKeyOrVersionName::Key(name) => name.fmt(f),
            CryptoKeyOrVersionName::Version(name) => name.fmt(f),
        }
    }
}
