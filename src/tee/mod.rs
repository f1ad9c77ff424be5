// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Trusted Execution Boundary
//!
//! Everything that touches plaintext genomic data lives behind this module:
//! sealing and opening envelopes, and deriving the risk level from marker
//! values. "TEE" is a logical isolation boundary here; no hardware
//! attestation is performed.
//!
//! ## Envelope Layout
//!
//! ```text
//! digest[32] || nonce[12] || ciphertext[N]
//! ```
//!
//! `digest` is SHA-256 of the plaintext and doubles as the AES-GCM
//! associated data.
//!
//! Both components are stateless and safe to call from any number of
//! request tasks concurrently.

pub mod envelope;
pub mod error;
pub mod risk;

pub use envelope::{derive_key, open, seal, KeyMaterial, SealedArtifact, DIGEST_LEN, NONCE_LEN};
pub use error::{CryptoError, InputError};
pub use risk::{
    markers_from_bytes, payload_markers, score, score_payload, RiskLevel, MARKER_WEIGHTS,
};
