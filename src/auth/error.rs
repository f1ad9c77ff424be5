// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and registration errors.

use axum::http::StatusCode;

/// Authentication error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Address is not `0x` followed by 40 hex digits
    InvalidAddress(String),
    /// No user registered for the address
    NotFound(String),
    /// Address already registered
    UserExists(String),
    /// Registry storage failure
    Storage(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidAddress(_) => "invalid_address",
            AuthError::NotFound(_) => "user_not_found",
            AuthError::UserExists(_) => "user_exists",
            AuthError::Storage(_) => "storage_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::UserExists(_) => StatusCode::CONFLICT,
            AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::InvalidAddress(addr) => write!(f, "Invalid address: {addr:?}"),
            AuthError::NotFound(addr) => write!(f, "User not found for address {addr}"),
            AuthError::UserExists(addr) => write!(f, "User already registered for address {addr}"),
            AuthError::Storage(msg) => write!(f, "User registry error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<crate::storage::StoreError> for AuthError {
    fn from(err: crate::storage::StoreError) -> Self {
        AuthError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            AuthError::InvalidAddress("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::NotFound("0xabc".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AuthError::UserExists("0xabc".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(AuthError::NotFound(String::new()).error_code(), "user_not_found");
        assert_eq!(AuthError::Storage(String::new()).error_code(), "storage_error");
    }
}
