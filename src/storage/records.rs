// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed record persistence.
//!
//! A record is written once per upload and never mutated. Metadata and the
//! sealed artifact live in separate tables but are written in the same
//! redb transaction.

use chrono::{DateTime, Utc};
use redb::ReadableDatabase;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::database::{CustodyDatabase, StoreError, StoreResult, ARTIFACTS, RECORDS};
use crate::auth::OwnerId;
use crate::blockchain::ArtifactSignature;
use crate::tee::SealedArtifact;

/// Persistence capability for sealed artifacts keyed by an opaque file id.
pub trait RecordStore: Send + Sync {
    /// Store an artifact with its content hash and signature; returns the new
    /// file id.
    fn put(
        &self,
        owner: OwnerId,
        artifact: &SealedArtifact,
        signature: &ArtifactSignature,
    ) -> StoreResult<String>;

    /// Load the sealed artifact of `file_id`.
    fn get(&self, file_id: &str) -> StoreResult<SealedArtifact>;

    /// Load the signed metadata of `file_id`.
    fn record(&self, file_id: &str) -> StoreResult<SignedRecord>;
}

/// Metadata persisted alongside each artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedRecord {
    pub file_id: String,
    pub owner_id: OwnerId,
    /// Keccak-256 of the sealed artifact, 0x-prefixed hex
    pub content_hash: String,
    /// 65-byte recoverable signature over `content_hash`, 0x-prefixed hex
    pub signature: String,
    pub created_at: DateTime<Utc>,
}

impl SignedRecord {
    pub fn new(file_id: String, owner_id: OwnerId, signature: &ArtifactSignature) -> Self {
        Self {
            file_id,
            owner_id,
            content_hash: signature.content_hash.to_string(),
            signature: alloy::hex::encode_prefixed(signature.signature_bytes()),
            created_at: Utc::now(),
        }
    }
}

impl RecordStore for CustodyDatabase {
    fn put(
        &self,
        owner: OwnerId,
        artifact: &SealedArtifact,
        signature: &ArtifactSignature,
    ) -> StoreResult<String> {
        let file_id = Uuid::new_v4().to_string();
        let record = SignedRecord::new(file_id.clone(), owner, signature);
        let json = serde_json::to_vec(&record)?;

        let write_txn = self.db().begin_write()?;
        {
            let mut records = write_txn.open_table(RECORDS)?;
            records.insert(file_id.as_str(), json.as_slice())?;

            let mut artifacts = write_txn.open_table(ARTIFACTS)?;
            artifacts.insert(file_id.as_str(), artifact.as_bytes())?;
        }
        write_txn.commit()?;

        tracing::debug!(
            file_id = %file_id,
            owner_id = owner,
            content_hash = %record.content_hash,
            size = artifact.len(),
            "Sealed artifact stored"
        );
        Ok(file_id)
    }

    fn get(&self, file_id: &str) -> StoreResult<SealedArtifact> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(ARTIFACTS)?;
        let bytes = match table.get(file_id)? {
            Some(value) => value.value().to_vec(),
            None => return Err(StoreError::NotFound(format!("file {file_id}"))),
        };
        SealedArtifact::from_bytes(bytes).map_err(|e| StoreError::Corrupt(format!("file {file_id}: {e}")))
    }

    fn record(&self, file_id: &str) -> StoreResult<SignedRecord> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(RECORDS)?;
        match table.get(file_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(format!("file {file_id}"))),
        }
    }
}
