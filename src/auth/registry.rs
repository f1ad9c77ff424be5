// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! redb-backed user registry.

use chrono::{DateTime, Utc};
use redb::{ReadableDatabase, ReadableTable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{validate_address, AuthError, AuthProvider, OwnerId, UserDirectory};
use crate::storage::database::{CustodyDatabase, OWNER_IDS, USERS};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    pub owner_id: OwnerId,
    /// Address as given at registration
    pub address: String,
    pub created_at: DateTime<Utc>,
}

impl AuthProvider for CustodyDatabase {
    fn authenticate(&self, address: &str) -> Result<OwnerId, AuthError> {
        validate_address(address)?;
        let key = address.to_lowercase();

        let read_txn = self.db().begin_read().map_err(|e| AuthError::Storage(e.to_string()))?;
        let table = read_txn.open_table(USERS).map_err(|e| AuthError::Storage(e.to_string()))?;
        let entry = table
            .get(key.as_str())
            .map_err(|e| AuthError::Storage(e.to_string()))?
            .ok_or_else(|| AuthError::NotFound(address.to_string()))?;

        let user: UserRecord =
            serde_json::from_slice(entry.value()).map_err(|e| AuthError::Storage(e.to_string()))?;
        Ok(user.owner_id)
    }
}

impl UserDirectory for CustodyDatabase {
    fn register(&self, address: &str) -> Result<UserRecord, AuthError> {
        validate_address(address)?;
        let key = address.to_lowercase();

        let write_txn = self.db().begin_write().map_err(|e| AuthError::Storage(e.to_string()))?;
        let user = {
            let mut users = write_txn.open_table(USERS).map_err(|e| AuthError::Storage(e.to_string()))?;
            if users
                .get(key.as_str())
                .map_err(|e| AuthError::Storage(e.to_string()))?
                .is_some()
            {
                return Err(AuthError::UserExists(address.to_string()));
            }

            let mut owner_ids = write_txn
                .open_table(OWNER_IDS)
                .map_err(|e| AuthError::Storage(e.to_string()))?;

            // Random ids collide rarely; draw again until one is free.
            let owner_id = loop {
                let candidate: OwnerId = rand::random();
                let taken = owner_ids
                    .get(candidate)
                    .map_err(|e| AuthError::Storage(e.to_string()))?
                    .is_some();
                if !taken {
                    break candidate;
                }
            };

            let user = UserRecord {
                owner_id,
                address: address.to_string(),
                created_at: Utc::now(),
            };
            let json = serde_json::to_vec(&user).map_err(|e| AuthError::Storage(e.to_string()))?;

            users
                .insert(key.as_str(), json.as_slice())
                .map_err(|e| AuthError::Storage(e.to_string()))?;
            owner_ids
                .insert(owner_id, key.as_str())
                .map_err(|e| AuthError::Storage(e.to_string()))?;
            user
        };
        write_txn.commit().map_err(|e| AuthError::Storage(e.to_string()))?;

        tracing::info!(owner_id = user.owner_id, address = %user.address, "User registered");
        Ok(user)
    }
}
