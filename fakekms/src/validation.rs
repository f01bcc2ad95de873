//! Request validation: field allowlists, checksums, and resource ids
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

const MAX_RESOURCE_ID_LEN: usize = 63;

/// Requests report which of their fields carry a non-default value
pub trait RequestFields {
    /// Dotted paths of every populated field
    fn populated_fields(&self) -> Vec<&'static str>;
}

/// Collect the names of fields whose presence condition holds
macro_rules! populated {
    ($($field:literal => $present:expr),* $(,)?) => {{
        let mut fields: Vec<&'static str> = Vec::new();
        $(
            if $present {
                fields.push($field);
            }
        )*
        fields
    }};
}
pub(crate) use populated;

/// Set of request fields an RPC supports
///
/// Unsupported optional parameters are rejected instead of silently ignored.
#[derive(Debug, Clone, Copy)]
pub struct Allowlist(&'static [&'static str]);

/// Build an allowlist
pub const fn allowlist(fields: &'static [&'static str]) -> Allowlist {
    Allowlist(fields)
}

impl Allowlist {
    pub fn check<R: RequestFields>(&self, request: &R) -> KmsResult<()> {
        for field in request.populated_fields() {
            if !self.0.contains(&field) {
                return Err(KmsError::InvalidArgument(format!(
                    "unsupported field: {}",
                    field
                )));
            }
        }
        Ok(())
    }
}

/// CRC32C (Castagnoli) checksum as carried in request and response fields
pub fn crc32c(data: &[u8]) -> u32 {
    ::crc32c::crc32c(data)
}

/// Compare a caller-supplied checksum against the bytes actually received
///
/// Returns whether a checksum was supplied, which responses echo back as
/// `verified_*` flags.
pub fn verify_crc32c(field: &str, data: &[u8], supplied: Option<u32>) -> KmsResult<bool> {
    match supplied {
        None => Ok(false),
        Some(expected) => {
            let actual = crc32c(data);
            if actual != expected {
                return Err(KmsError::InvalidArgument(format!(
                    "checksum mismatch for {}: got {}, computed {}",
                    field, expected, actual
                )));
            }
            Ok(true)
        }
    }
}

/// Key ring and crypto key ids: `[a-zA-Z0-9_-]{1,63}`
pub fn check_resource_id(id: &str) -> KmsResult<()> {
    let valid = !id.is_empty()
        && id.len() <= MAX_RESOURCE_ID_LEN
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');

    if !valid {
        return Err(KmsError::InvalidArgument(format!(
            "invalid resource id {:?}: must match [a-zA-Z0-9_-]{{1,{}}}",
            id, MAX_RESOURCE_ID_LEN
        )));
    }
    Ok(())
}

/// Field-mask check for update RPCs
pub fn check_update_mask(paths: &[String], mutable: &[&str]) -> KmsResult<()> {
    if paths.is_empty() {
        return Err(KmsError::InvalidArgument("update_mask must not be empty".to_string()));
    }
    for path in paths {
        if !mutable.contains(&path.as_str()) {
            return Err(KmsError::InvalidArgument(format!(
                "unsupported update_mask path: {}",
                path
            )));
        }
    }
    Ok(())
}
