//! Error types for the fake KMS engine
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


use std::fmt;
use thiserror::Error;

/// Caller-visible status code carried by every [`KmsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    NotFound,
    AlreadyExists,
    InvalidArgument,
    FailedPrecondition,
    Internal,
    DeadlineExceeded,
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Code::NotFound => "NOT_FOUND",
            Code::AlreadyExists => "ALREADY_EXISTS",
            Code::InvalidArgument => "INVALID_ARGUMENT",
            Code::FailedPrecondition => "FAILED_PRECONDITION",
            Code::Internal => "INTERNAL",
            Code::DeadlineExceeded => "DEADLINE_EXCEEDED",
        };
        f.write_str(s)
    }
}

/// Key management errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KmsError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    /// A defect inside the emulator, never caller misuse
    #[error("internal error: {0}")]
    Internal(String),

    #[error("deadline exceeded: {0}")]
    DeadlineExceeded(String),
}

impl KmsError {
    pub fn code(&self) -> Code {
        match self {
            KmsError::NotFound(_) => Code::NotFound,
            KmsError::AlreadyExists(_) => Code::AlreadyExists,
            KmsError::InvalidArgument(_) => Code::InvalidArgument,
            KmsError::FailedPrecondition(_) => Code::FailedPrecondition,
            KmsError::Internal(_) => Code::Internal,
            KmsError::DeadlineExceeded(_) => Code::DeadlineExceeded,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            KmsError::NotFound(m)
            | KmsError::AlreadyExists(m)
            | KmsError::InvalidArgument(m)
            | KmsError::FailedPrecondition(m)
            | KmsError::Internal(m)
            | KmsError::DeadlineExceeded(m) => m,
        }
    }
}

/// Result type for key management operations
pub type KmsResult<T> = Result<T, KmsError>;
