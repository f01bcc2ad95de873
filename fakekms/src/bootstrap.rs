//! Helpers for standing up an emulator instance
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


use crate::client::KmsClient;
use crate::engine::FakeKms;
use fakekms_config::{ConfigError, FakeKmsConfig};
use std::sync::Arc;
use tracing::info;

/// Build an engine from configuration
pub fn init_fake_kms(config: &FakeKmsConfig) -> Arc<FakeKms> {
    info!(
        poll_interval_ms = config.poll_interval_ms,
        generation_timeout_secs = config.generation_timeout_secs,
        "Initializing fake KMS"
    );
    Arc::new(FakeKms::new(config))
}

/// Build an engine and a client bound to it
pub fn init_client(config: &FakeKmsConfig) -> KmsClient {
    let engine = init_fake_kms(config);
    KmsClient::new(engine, config.poll_interval(), config.generation_timeout())
}

/// Build an engine and client from `FAKEKMS_*` environment variables
pub fn init_client_from_env() -> Result<KmsClient, ConfigError> {
    let config = FakeKmsConfig::from_env()?;
    Ok(init_client(&config))
}
