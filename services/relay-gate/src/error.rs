// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Error types for the relay gate.

use thiserror::Error;

/// Startup configuration errors. Any of these aborts the process.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(key: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            key,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by a [`FileStore`](crate::files::FileStore).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FileStoreError {
    #[error("Public ID already in use: {0}")]
    DuplicateId(String),

    #[error("Malformed public ID: {0}")]
    InvalidId(String),
}
