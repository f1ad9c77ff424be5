// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded custody database backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: lowercase address → serialized UserRecord
//! - `owner_ids`: owner id → lowercase address (uniqueness of owner ids)
//! - `records`: file id → serialized SignedRecord
//! - `artifacts`: file id → sealed artifact bytes
//! - `upload_runs`: run id → serialized UploadRun

use std::path::Path;

use redb::{Database, TableDefinition};

// =============================================================================
// Table Definitions
// =============================================================================

pub(crate) const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

pub(crate) const OWNER_IDS: TableDefinition<u32, &str> = TableDefinition::new("owner_ids");

pub(crate) const RECORDS: TableDefinition<&str, &[u8]> = TableDefinition::new("records");

/// Kept apart from `records` so metadata reads never load the artifact.
pub(crate) const ARTIFACTS: TableDefinition<&str, &[u8]> = TableDefinition::new("artifacts");

pub(crate) const UPLOAD_RUNS: TableDefinition<&str, &[u8]> = TableDefinition::new("upload_runs");

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "custody.redb";

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt entry: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// CustodyDatabase
// =============================================================================

/// Embedded ACID database holding users, signed records and the run journal.
pub struct CustodyDatabase {
    db: Database,
}

impl CustodyDatabase {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path)?;

        // Pre-create all tables so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS)?;
            let _ = write_txn.open_table(OWNER_IDS)?;
            let _ = write_txn.open_table(RECORDS)?;
            let _ = write_txn.open_table(ARTIFACTS)?;
            let _ = write_txn.open_table(UPLOAD_RUNS)?;
        }
        write_txn.commit()?;

        tracing::info!(path = %path.display(), "Custody database opened");
        Ok(Self { db })
    }

    /// Open the database file inside `data_dir`.
    pub fn open_in(data_dir: &Path) -> StoreResult<Self> {
        Self::open(&data_dir.join(DATABASE_FILE))
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }
}

#[cfg(test)]
pub(crate) fn temp_db() -> (CustodyDatabase, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = CustodyDatabase::open(&dir.path().join("test.redb")).unwrap();
    (db, dir)
}
