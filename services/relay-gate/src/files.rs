// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! File metadata lookup, keyed by public ID.
//!
//! The service serves whatever a [`FileStore`] holds; uploads populate it
//! elsewhere. With `DEV_MODE` set, `main` seeds the in-memory store with
//! [`seed_sample`] so the pull endpoint has something to return.

use crate::error::FileStoreError;
use crate::public_id;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Descriptive metadata stored alongside a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub original_name: String,
    pub size: u64,
    pub hash: String,
    pub local_file_name: String,
    pub file_type: String,
}

/// A relayed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub pub_id: String,
    pub meta: FileMeta,
    pub creation_date: DateTime<Utc>,
    pub issuer: String,
    pub views: u64,
    pub downloads: u64,
}

impl FileRecord {
    /// A new record with a freshly generated public ID and zeroed counters.
    pub fn new(meta: FileMeta, issuer: impl Into<String>) -> Self {
        Self {
            pub_id: public_id::generate(),
            meta,
            creation_date: Utc::now(),
            issuer: issuer.into(),
            views: 0,
            downloads: 0,
        }
    }
}

/// Storage backend for file records.
pub trait FileStore: Send + Sync {
    /// Look up a file by its public ID.
    fn get(&self, pub_id: &str) -> Option<FileRecord>;

    /// Store a new file. Public IDs are unique.
    fn insert(&self, record: FileRecord) -> Result<(), FileStoreError>;

    /// Number of stored files.
    fn count(&self) -> usize;
}

/// In-process [`FileStore`].
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, FileRecord>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileStore for MemoryFileStore {
    fn get(&self, pub_id: &str) -> Option<FileRecord> {
        self.files.read().get(pub_id).cloned()
    }

    fn insert(&self, record: FileRecord) -> Result<(), FileStoreError> {
        if !public_id::validate(&record.pub_id) {
            return Err(FileStoreError::InvalidId(record.pub_id));
        }
        let mut files = self.files.write();
        if files.contains_key(&record.pub_id) {
            return Err(FileStoreError::DuplicateId(record.pub_id));
        }
        files.insert(record.pub_id.clone(), record);
        Ok(())
    }

    fn count(&self) -> usize {
        self.files.read().len()
    }
}

/// Insert a sample record under a fresh public ID.
pub fn seed_sample(store: &dyn FileStore) -> Result<FileRecord, FileStoreError> {
    let record = FileRecord::new(
        FileMeta {
            original_name: "sample.bin".to_string(),
            size: 1024,
            hash: "sample".to_string(),
            local_file_name: "SAMPLEFILEDATAONLY".to_string(),
            file_type: "application/octet-stream".to_string(),
        },
        "dev",
    );
    store.insert(record.clone())?;
    Ok(record)
}
