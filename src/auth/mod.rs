// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Users are identified by their EVM address. Registration assigns a random
//! 32-bit owner id; authentication maps an address back to that id.
//!
//! ## Auth Flow
//!
//! 1. Client registers its address once (`POST /v1/auth/register`)
//! 2. Upload requests name the address
//! 3. The pipeline authenticates the address before any cryptographic work
//!
//! Addresses are compared case-insensitively.

pub mod error;
pub mod registry;

pub use error::AuthError;
pub use registry::UserRecord;

/// Identifier of a registered user.
pub type OwnerId = u32;

/// Resolves an address to the owner id of a registered user.
pub trait AuthProvider: Send + Sync {
    fn authenticate(&self, address: &str) -> Result<OwnerId, AuthError>;
}

/// Registration side of the user registry.
pub trait UserDirectory: AuthProvider {
    fn register(&self, address: &str) -> Result<UserRecord, AuthError>;
}

/// Check that `address` is `0x` followed by exactly 40 hex digits.
pub fn validate_address(address: &str) -> Result<(), AuthError> {
    let valid = address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()));

    if valid {
        Ok(())
    } else {
        Err(AuthError::InvalidAddress(address.to_string()))
    }
}
