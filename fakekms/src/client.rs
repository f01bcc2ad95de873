//! High-level client over any key management backend
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
use crate::kms::KeyManagementService;
use crate::messages::{
    CreateCryptoKeyRequest, CreateCryptoKeyVersionRequest, GetCryptoKeyRequest,
    GetCryptoKeyVersionRequest,
};
use crate::names::CryptoKeyName;
use crate::resources::{CryptoKey, CryptoKeyVersion, CryptoKeyVersionState};
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Client that wraps a KMS backend and waits out asynchronous generation
#[derive(Clone)]
pub struct KmsClient {
    backend: Arc<dyn KeyManagementService>,
    poll_interval: Duration,
    timeout: Duration,
}

impl KmsClient {
    /// Create a new client with a KMS backend
    pub fn new(backend: Arc<dyn KeyManagementService>, poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            backend,
            poll_interval,
            timeout,
        }
    }

    /// Poll a version until it leaves PENDING_GENERATION
    pub async fn wait_for_generation(&self, name: &str) -> KmsResult<CryptoKeyVersion> {
        let deadline = Instant::now() + self.timeout;
        loop {
            let version = self
                .backend
                .get_crypto_key_version(GetCryptoKeyVersionRequest {
                    name: name.to_string(),
                })
                .await?;

            if version.state != CryptoKeyVersionState::PendingGeneration {
                debug!(name = %name, state = %version.state, "Generation finished");
                return Ok(version);
            }
            if Instant::now() >= deadline {
                return Err(KmsError::DeadlineExceeded(format!(
                    "key version {} still pending generation after {:?}",
                    name, self.timeout
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Create a version and wait for its generation to finish
    pub async fn create_crypto_key_version_and_wait(
        &self,
        request: CreateCryptoKeyVersionRequest,
    ) -> KmsResult<CryptoKeyVersion> {
        let created = self.backend.create_crypto_key_version(request).await?;
        self.wait_for_generation(&created.name).await
    }

    /// Create a crypto key and wait for its first version, if it has one
    ///
    /// The returned key is fetched after generation, so its primary reflects
    /// the generated state.
    pub async fn create_crypto_key_and_wait_for_first_version(
        &self,
        request: CreateCryptoKeyRequest,
    ) -> KmsResult<CryptoKey> {
        let skip = request.skip_initial_version_creation;
        let created = self.backend.create_crypto_key(request).await?;
        if skip {
            return Ok(created);
        }

        let name: CryptoKeyName = created.name.parse()?;
        let first = self.wait_for_generation(&name.version(1).to_string()).await?;
        info!(name = %created.name, state = %first.state, "Crypto key ready");

        self.backend
            .get_crypto_key(GetCryptoKeyRequest { name: created.name })
            .await
    }
}

impl Deref for KmsClient {
    type Target = dyn KeyManagementService;

    fn deref(&self) -> &Self::Target {
        self.backend.as_ref()
    }
}
