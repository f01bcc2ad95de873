//! Crypto key version lifecycle
//!
//! Every state change goes through [`TRANSITIONS`]. Generation and scheduled
//! destruction run as detached tasks; callers observe completion by polling the
//! version's state.
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


use crate::algorithms::AlgorithmDef;
use crate::error::{KmsError, KmsResult};
use crate::key_material::KeyMaterial;
use crate::resources::{CryptoKeyVersion, CryptoKeyVersionState};
use crate::store::{VersionEntry, VersionRecord};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use CryptoKeyVersionState::*;

/// What caused a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Generation,
    Update,
    Destroy,
    Restore,
    Expiry,
}

/// Every legal `(from, to, trigger)` triple
pub const TRANSITIONS: &[(CryptoKeyVersionState, CryptoKeyVersionState, Trigger)] = &[
    (PendingGeneration, Enabled, Trigger::Generation),
    (PendingGeneration, GenerationFailed, Trigger::Generation),
    (Enabled, Disabled, Trigger::Update),
    (Disabled, Enabled, Trigger::Update),
    (Enabled, DestroyScheduled, Trigger::Destroy),
    (Disabled, DestroyScheduled, Trigger::Destroy),
    (DestroyScheduled, Disabled, Trigger::Restore),
    (DestroyScheduled, Destroyed, Trigger::Expiry),
];

pub fn is_legal(from: CryptoKeyVersionState, to: CryptoKeyVersionState, trigger: Trigger) -> bool {
    TRANSITIONS.contains(&(from, to, trigger))
}

fn transition(record: &mut VersionRecord, to: CryptoKeyVersionState, trigger: Trigger) -> KmsResult<()> {
    let from = record.version.state;
    if !is_legal(from, to, trigger) {
        return Err(KmsError::InvalidArgument(format!(
            "key version {} may not transition from {} to {}",
            record.version.name, from, to
        )));
    }
    record.version.state = to;
    Ok(())
}

/// `now + duration`, or Internal if it does not fit a timestamp
fn deadline_after(now: DateTime<Utc>, duration: Duration) -> KmsResult<DateTime<Utc>> {
    chrono::Duration::from_std(duration)
        .ok()
        .and_then(|d| now.checked_add_signed(d))
        .ok_or_else(|| KmsError::Internal(format!("destroy duration {:?} is out of range", duration)))
}

/// Drives versions through their state machine
#[derive(Debug, Clone)]
pub struct LifecycleController {
    generation_delay: Duration,
    destroy_scheduled_duration: Duration,
}

impl LifecycleController {
    pub fn new(generation_delay: Duration, destroy_scheduled_duration: Duration) -> Self {
        Self {
            generation_delay,
            destroy_scheduled_duration,
        }
    }

    /// Start generating material for a PENDING_GENERATION version
    ///
    /// Returns immediately. The version becomes ENABLED, or GENERATION_FAILED,
    /// once the background task completes.
    pub fn request_generation(&self, entry: VersionEntry, def: &'static AlgorithmDef) {
        let delay = self.generation_delay;

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let generated = if def.is_slow_to_generate() {
                tokio::task::spawn_blocking(move || KeyMaterial::generate(def))
                    .await
                    .map_err(|e| e.to_string())
                    .and_then(|r| r.map_err(|e| e.to_string()))
            } else {
                KeyMaterial::generate(def).map_err(|e| e.to_string())
            };

            let mut record = entry.write().await;
            match generated {
                Ok(material) => {
                    // Material is installed before ENABLED is visible
                    record.material = Some(Arc::new(material));
                    record.version.generate_time = Some(Utc::now());
                    if let Err(e) = transition(&mut record, Enabled, Trigger::Generation) {
                        error!(error = %e, "Generated key material for a version no longer pending");
                        return;
                    }
                    info!(
                        name = %record.version.name,
                        algorithm = %def.algorithm,
                        "Key version generated"
                    );
                }
                Err(e) => {
                    error!(
                        name = %record.version.name,
                        algorithm = %def.algorithm,
                        error = %e,
                        "Key generation failed"
                    );
                    if let Err(e) = transition(&mut record, GenerationFailed, Trigger::Generation) {
                        error!(error = %e, "Could not record generation failure");
                    }
                }
            }
        });
    }

    /// Caller-requested state change through an update RPC
    pub async fn apply_state_update(
        &self,
        entry: &VersionEntry,
        to: CryptoKeyVersionState,
    ) -> KmsResult<CryptoKeyVersion> {
        let mut record = entry.write().await;
        transition(&mut record, to, Trigger::Update)?;
        info!(name = %record.version.name, state = %to, "Key version state updated");
        Ok(record.version.clone())
    }

    /// Move an ENABLED or DISABLED version to DESTROY_SCHEDULED
    ///
    /// With a zero scheduled duration the version is destroyed before this
    /// returns; otherwise a background task destroys it when the duration
    /// elapses, unless it was restored in the meantime.
    pub async fn schedule_destroy(&self, entry: &VersionEntry) -> KmsResult<CryptoKeyVersion> {
        let destroy_time = deadline_after(Utc::now(), self.destroy_scheduled_duration)?;

        let mut record = entry.write().await;
        transition(&mut record, DestroyScheduled, Trigger::Destroy)?;
        record.version.destroy_time = Some(destroy_time);
        info!(
            name = %record.version.name,
            destroy_time = %destroy_time,
            "Key version scheduled for destruction"
        );

        if self.destroy_scheduled_duration.is_zero() {
            destroy(&mut record, destroy_time)?;
            return Ok(record.version.clone());
        }

        let version = record.version.clone();
        drop(record);

        let entry = entry.clone();
        let wait = self.destroy_scheduled_duration;
        tokio::spawn(async move {
            tokio::time::sleep(wait).await;
            let mut record = entry.write().await;
            if let Err(e) = destroy(&mut record, destroy_time) {
                error!(error = %e, "Scheduled destruction failed");
            }
        });

        Ok(version)
    }

    /// Cancel a scheduled destruction, leaving the version DISABLED
    pub async fn restore(&self, entry: &VersionEntry) -> KmsResult<CryptoKeyVersion> {
        let mut record = entry.write().await;
        transition(&mut record, Disabled, Trigger::Restore)?;
        record.version.destroy_time = None;
        info!(name = %record.version.name, "Key version restored");
        Ok(record.version.clone())
    }
}

/// Destroy a version whose destruction was scheduled for `scheduled`
///
/// A version restored and destroyed again carries a newer `destroy_time`, so a
/// stale expiry task leaves it alone.
fn destroy(record: &mut VersionRecord, scheduled: DateTime<Utc>) -> KmsResult<()> {
    if record.version.state != DestroyScheduled || record.version.destroy_time != Some(scheduled) {
        debug!(name = %record.version.name, "Skipping stale scheduled destruction");
        return Ok(());
    }

    transition(record, Destroyed, Trigger::Expiry)?;
    record.material = None;
    record.version.destroy_event_time = Some(Utc::now());
    info!(name = %record.version.name, "Key version destroyed");
    Ok(())
}
