// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Ledger Commit Orchestrator
//!
//! Records a custody event on the controller contract in two phases:
//!
//! ```text
//! Initiated --uploadData--> PendingMine1 --receipt--> Mined(sessionId)
//!           --confirm-----> PendingMine2 --receipt--> Confirmed [-> Rewarded | Minted]
//! ```
//!
//! Each phase submits through the account's [`SubmissionQueue`], then blocks
//! until the receipt is final or the finality deadline elapses. Nothing is
//! retried here.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy::{
    primitives::{Address, TxHash, U256},
    sol_types::SolCall,
};
use tracing::{info, warn};

use super::client::{CommitError, LedgerClient, LedgerError};
use super::controller::{
    find_minted_token, find_reward, find_session_id, format_token_balance, IController, IERC20,
    PCSP_DECIMALS,
};
use super::submitter::SubmissionQueue;
use super::types::*;
use crate::tee::RiskLevel;

/// Default per-phase finality deadline.
pub const DEFAULT_FINALITY_TIMEOUT: Duration = Duration::from_secs(120);

/// Drives the two-phase commit against one controller contract.
pub struct LedgerCommitOrchestrator {
    client: Arc<dyn LedgerClient>,
    queue: SubmissionQueue,
    controller: Address,
    reward_token: Option<Address>,
    finality_timeout: Duration,
}

impl LedgerCommitOrchestrator {
    pub fn new(
        client: Arc<dyn LedgerClient>,
        queue: SubmissionQueue,
        controller: Address,
        finality_timeout: Duration,
    ) -> Self {
        Self {
            client,
            queue,
            controller,
            reward_token: None,
            finality_timeout,
        }
    }

    /// Use a fixed reward token instead of asking the controller.
    pub fn with_reward_token(mut self, token: Address) -> Self {
        self.reward_token = Some(token);
        self
    }

    /// Phase 1: open an upload session for `doc_id`.
    ///
    /// Fails with `SessionIdNotFound` when the transaction succeeds but the
    /// receipt carries no matching `UploadData` event.
    pub async fn begin_upload(&self, doc_id: &str) -> Result<BeginOutcome, CommitError> {
        let phase = CommitPhase::BeginUpload;
        let data = IController::uploadDataCall {
            docId: doc_id.to_string(),
        }
        .abi_encode();

        let tx_hash = self.submit(phase, data).await?;
        info!(doc_id, %tx_hash, "Upload session submitted, awaiting finality");

        let receipt = self.await_finality(phase, tx_hash).await?;
        let session_id = find_session_id(&receipt.logs, self.controller, doc_id).ok_or_else(|| {
            CommitError::new(
                phase,
                LedgerError::SessionIdNotFound {
                    doc_id: doc_id.to_string(),
                    tx_hash,
                },
            )
        })?;

        info!(doc_id, session_id = %session_id, %tx_hash, "Upload session mined");
        Ok(BeginOutcome {
            session_id: session_id.to_string(),
            tx_hash,
        })
    }

    /// Phase 2: confirm the session with content hash, proof and risk level.
    ///
    /// Mint and reward events in the receipt are reported when present;
    /// their absence is not an error.
    pub async fn confirm_upload(
        &self,
        doc_id: &str,
        content_hash: &str,
        proof: &str,
        session_id: &str,
        risk_level: RiskLevel,
    ) -> Result<ConfirmOutcome, CommitError> {
        let phase = CommitPhase::ConfirmUpload;
        let session = parse_session_id(session_id).map_err(|e| CommitError::new(phase, e))?;

        let data = IController::confirmCall {
            docId: doc_id.to_string(),
            contentHash: content_hash.to_string(),
            proof: proof.to_string(),
            sessionId: session,
            riskScore: U256::from(risk_level.value()),
        }
        .abi_encode();

        let tx_hash = self.submit(phase, data).await?;
        info!(doc_id, session_id, %tx_hash, "Confirmation submitted, awaiting finality");

        let receipt = self.await_finality(phase, tx_hash).await?;

        let minted_token_id = find_minted_token(&receipt.logs, self.controller).map(|id| id.to_string());
        let reward = find_reward(&receipt.logs, self.controller);

        if let Some(token_id) = &minted_token_id {
            info!(session_id, token_id = %token_id, "Gene NFT minted");
        }
        if let Some(reward) = &reward {
            info!(session_id, user = %reward.user, amount = %reward.amount, "PCSP reward issued");
        }
        info!(session_id, %tx_hash, "Upload confirmed");

        Ok(ConfirmOutcome {
            tx_hash,
            minted_token_id,
            reward,
        })
    }

    /// Read a session from contract state. No transaction is submitted.
    pub async fn get_session(&self, session_id: &str) -> Result<SessionRecord, LedgerError> {
        let session = parse_session_id(session_id)?;
        let data = IController::getSessionCall { sessionId: session }.abi_encode();

        let output = self.client.call(self.controller, data.into()).await?;
        let decoded = IController::getSessionCall::abi_decode_returns(&output)
            .map_err(|e| LedgerError::Contract(format!("Failed to decode session: {e}")))?;

        Ok(decoded.into())
    }

    /// PCSP reward token balance of `holder`.
    pub async fn reward_balance(&self, holder: &str) -> Result<TokenBalance, LedgerError> {
        let holder_addr = Address::from_str(holder)
            .map_err(|e| LedgerError::InvalidAddress(e.to_string()))?;
        let token = self.resolve_reward_token().await?;

        let data = IERC20::balanceOfCall {
            account: holder_addr,
        }
        .abi_encode();
        let output = self.client.call(token, data.into()).await?;
        let balance = IERC20::balanceOfCall::abi_decode_returns(&output)
            .map_err(|e| LedgerError::Contract(format!("Failed to decode balance: {e}")))?;

        Ok(TokenBalance {
            address: holder_addr.to_checksum(None),
            token: token.to_checksum(None),
            balance_raw: balance.to_string(),
            balance_formatted: format_token_balance(balance, PCSP_DECIMALS),
        })
    }

    /// Current head block, used by readiness checks.
    pub async fn block_number(&self) -> Result<u64, LedgerError> {
        self.client.block_number().await
    }

    async fn resolve_reward_token(&self) -> Result<Address, LedgerError> {
        if let Some(token) = self.reward_token {
            return Ok(token);
        }

        let data = IController::pcspTokenCall {}.abi_encode();
        let output = self.client.call(self.controller, data.into()).await?;
        IController::pcspTokenCall::abi_decode_returns(&output)
            .map_err(|e| LedgerError::Contract(format!("Failed to decode token address: {e}")))
    }

    async fn submit(&self, phase: CommitPhase, data: Vec<u8>) -> Result<TxHash, CommitError> {
        self.queue
            .submit(ContractCall::new(self.controller, data))
            .await
            .map_err(|e| CommitError::new(phase, e))
    }

    async fn await_finality(
        &self,
        phase: CommitPhase,
        tx_hash: TxHash,
    ) -> Result<TxReceipt, CommitError> {
        let receipt = tokio::time::timeout(self.finality_timeout, self.client.wait_for_finality(tx_hash))
            .await
            .map_err(|_| {
                warn!(%phase, %tx_hash, timeout = ?self.finality_timeout, "Finality wait timed out");
                CommitError::new(phase, LedgerError::FinalityTimeout(self.finality_timeout))
            })?
            .map_err(|e| CommitError::new(phase, e))?;

        if !receipt.success {
            return Err(CommitError::new(phase, LedgerError::Reverted(tx_hash)));
        }
        Ok(receipt)
    }
}

/// Parse a decimal session id into the ledger's 256-bit integer.
pub fn parse_session_id(session_id: &str) -> Result<U256, LedgerError> {
    let trimmed = session_id.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LedgerError::InvalidSessionId(session_id.to_string()));
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| LedgerError::InvalidSessionId(session_id.to_string()))
}
