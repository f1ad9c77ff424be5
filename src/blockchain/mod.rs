// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger integration for the custody controller contract.
//!
//! This module provides functionality for:
//! - Signing sealed artifacts with the custodial key
//! - Serialized transaction submission per signing account
//! - The two-phase upload commit (`uploadData` then `confirm`)
//! - Reading session state and PCSP reward balances

pub mod client;
pub mod controller;
pub mod orchestrator;
pub mod signing;
pub mod submitter;
pub mod types;

pub use client::{CommitError, EvmLedgerClient, LedgerClient, LedgerError, DEFAULT_POLL_INTERVAL};
pub use orchestrator::{parse_session_id, LedgerCommitOrchestrator, DEFAULT_FINALITY_TIMEOUT};
pub use signing::{sign_artifact, ArtifactSignature, CustodyKey};
pub use submitter::SubmissionQueue;
pub use types::*;
