// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger types shared by the client, the submission queue and the
//! orchestrator.

use std::fmt;

use alloy::primitives::{Address, Bytes, Log, TxHash};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::tee::RiskLevel;

/// EVM network connection settings.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// RPC endpoint URL
    pub rpc_url: String,
    /// Expected chain ID
    pub chain_id: u64,
}

/// Avalanche Fuji Testnet chain ID, the default deployment target.
pub const FUJI_CHAIN_ID: u64 = 43113;

/// A state-changing contract call, not yet signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
}

impl ContractCall {
    pub fn new(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            to,
            data: data.into(),
        }
    }
}

/// Receipt of a finalized transaction.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Whether the transaction was successful
    pub success: bool,
    /// Logs emitted by the transaction, in order
    pub logs: Vec<Log>,
}

/// The two ledger commit phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CommitPhase {
    BeginUpload,
    ConfirmUpload,
}

impl fmt::Display for CommitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitPhase::BeginUpload => f.write_str("begin upload"),
            CommitPhase::ConfirmUpload => f.write_str("confirm upload"),
        }
    }
}

/// Lifecycle of an upload session as observed from ledger receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Document id chosen, nothing submitted yet.
    Initiated,
    /// Phase 1 finalized; the ledger assigned a session id.
    Mined,
    /// Phase 2 finalized.
    Confirmed,
    /// Phase 2 receipt carried a reward event.
    Rewarded,
    /// Phase 2 receipt carried an NFT mint event.
    Minted,
}

/// Per-request view of one upload session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadSession {
    pub doc_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub content_hash: String,
    pub proof: String,
    pub risk_level: RiskLevel,
    pub status: SessionStatus,
}

impl UploadSession {
    pub fn new(doc_id: String, content_hash: String, proof: String, risk_level: RiskLevel) -> Self {
        Self {
            doc_id,
            session_id: None,
            content_hash,
            proof,
            risk_level,
            status: SessionStatus::Initiated,
        }
    }

    pub fn mined(&mut self, session_id: String) {
        self.session_id = Some(session_id);
        self.status = SessionStatus::Mined;
    }

    pub fn confirmed(&mut self, outcome: &ConfirmOutcome) {
        self.status = if outcome.minted_token_id.is_some() {
            SessionStatus::Minted
        } else if outcome.reward.is_some() {
            SessionStatus::Rewarded
        } else {
            SessionStatus::Confirmed
        };
    }
}

/// Result of phase 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeginOutcome {
    pub session_id: String,
    pub tx_hash: TxHash,
}

/// Reward paid out by the controller on confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RewardIssued {
    pub user: String,
    pub amount: String,
}

/// Result of phase 2. Side-effect events are optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmOutcome {
    pub tx_hash: TxHash,
    pub minted_token_id: Option<String>,
    pub reward: Option<RewardIssued>,
}

/// Session state as stored by the controller contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SessionRecord {
    pub id: String,
    pub user: String,
    pub proof: String,
    pub confirmed: bool,
}

/// Reward token balance of one holder.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBalance {
    pub address: String,
    pub token: String,
    /// Balance in smallest unit
    pub balance_raw: String,
    /// Balance formatted with decimals
    pub balance_formatted: String,
}
