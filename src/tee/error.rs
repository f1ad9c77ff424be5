// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Error taxonomy for the TEE boundary.
//!
//! Error text never contains key material or plaintext bytes.

use thiserror::Error;

/// Malformed caller input, rejected before any cryptographic work.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("payload is empty")]
    EmptyPayload,

    #[error("marker payload length {0} is not a multiple of 8")]
    InvalidMarkerLength(usize),
}

/// Cipher construction, authentication and signing failures.
///
/// These are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    #[error("malformed artifact: expected at least {expected} bytes, got {actual}")]
    MalformedArtifact { expected: usize, actual: usize },

    #[error("ciphertext authentication failed")]
    AuthenticationFailed,

    #[error("data integrity check failed")]
    IntegrityViolation,

    #[error("cipher error: {0}")]
    Cipher(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("signing failed: {0}")]
    SigningFailure(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_artifact_reports_lengths() {
        let err = CryptoError::MalformedArtifact {
            expected: 44,
            actual: 10,
        };
        let text = err.to_string();
        assert!(text.contains("44"));
        assert!(text.contains("10"));
    }

    #[test]
    fn marker_length_error_mentions_length() {
        assert_eq!(
            InputError::InvalidMarkerLength(3).to_string(),
            "marker payload length 3 is not a multiple of 8"
        );
    }
}
