//! In-memory emulator of a cloud key management service
//!
//! Reproduces the resource model, version lifecycle, and cryptographic
//! behavior of the remote service so that client code can be tested without a
//! network or an HSM. [`FakeKms`] is the engine; [`KmsClient`] wraps any
//! [`KeyManagementService`] with helpers that wait out key generation.
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


pub mod algorithms;
pub mod bootstrap;
pub mod client;
pub mod engine;
pub mod error;
pub mod key_material;
pub mod kms;
pub mod lifecycle;
pub mod messages;
pub mod names;
pub mod resources;
pub mod store;
pub mod validation;

mod asymmetric_rpcs;
mod mac_rpcs;
mod raw_rpcs;
mod symmetric_rpcs;

pub use bootstrap::*;
pub use client::KmsClient;
pub use engine::FakeKms;
pub use error::{Code, KmsError, KmsResult};
pub use kms::KeyManagementService;
pub use resources::{
    CryptoKey, CryptoKeyPurpose, CryptoKeyVersion, CryptoKeyVersionAlgorithm,
    CryptoKeyVersionState, CryptoKeyVersionTemplate, KeyRing, ProtectionLevel,
};
