// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ledger client capability and its alloy-backed EVM implementation.

use std::time::Duration;

use alloy::{
    network::{Ethereum, EthereumWallet},
    primitives::{Address, Bytes, TxHash},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    rpc::types::TransactionRequest,
};
use async_trait::async_trait;

use super::signing::CustodyKey;
use super::types::*;

/// Primitives the commit orchestrator is built from.
///
/// Implementations must not retry on their own; `submit` may be made
/// idempotent by the implementation if it can key resubmission on the
/// document id.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Account that signs submitted transactions.
    fn account(&self) -> Address;

    /// Sign and broadcast a state-changing call.
    async fn submit(&self, call: ContractCall) -> Result<TxHash, LedgerError>;

    /// Resolve once the transaction's receipt is available. Unbounded;
    /// callers apply their own deadline.
    async fn wait_for_finality(&self, tx_hash: TxHash) -> Result<TxReceipt, LedgerError>;

    /// Read-only call against current contract state.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError>;

    /// Current head block number.
    async fn block_number(&self) -> Result<u64, LedgerError>;
}

/// HTTP provider type with all fillers and a local wallet.
type SigningProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
>;

/// Default interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// EVM JSON-RPC ledger client.
pub struct EvmLedgerClient {
    provider: SigningProvider,
    account: Address,
    poll_interval: Duration,
}

impl EvmLedgerClient {
    /// Connect and verify the endpoint serves the expected chain.
    pub async fn connect(
        network: NetworkConfig,
        key: &CustodyKey,
        poll_interval: Duration,
    ) -> Result<Self, LedgerError> {
        let url: url::Url = network
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| LedgerError::InvalidRpcUrl(e.to_string()))?;

        let provider = ProviderBuilder::new()
            .wallet(key.wallet())
            .connect_http(url);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| LedgerError::Rpc(format!("Failed to get chain ID: {e}")))?;

        if chain_id != network.chain_id {
            return Err(LedgerError::ChainMismatch {
                expected: network.chain_id,
                actual: chain_id,
            });
        }

        tracing::info!(
            chain_id,
            account = %key.address(),
            "Connected to ledger"
        );

        Ok(Self {
            provider,
            account: key.address(),
            poll_interval,
        })
    }

    async fn fetch_receipt(&self, tx_hash: TxHash) -> Result<Option<TxReceipt>, LedgerError> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| LedgerError::Rpc(format!("Failed to get receipt: {e}")))?;

        Ok(receipt.map(|r| TxReceipt {
            tx_hash,
            block_number: r.block_number,
            success: r.status(),
            logs: r.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        }))
    }
}

#[async_trait]
impl LedgerClient for EvmLedgerClient {
    fn account(&self) -> Address {
        self.account
    }

    async fn submit(&self, call: ContractCall) -> Result<TxHash, LedgerError> {
        let tx = TransactionRequest::default()
            .to(call.to)
            .input(call.data.into());

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| LedgerError::SubmissionFailed(e.to_string()))?;

        Ok(*pending.tx_hash())
    }

    async fn wait_for_finality(&self, tx_hash: TxHash) -> Result<TxReceipt, LedgerError> {
        loop {
            if let Some(receipt) = self.fetch_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        let tx = TransactionRequest::default().to(to).input(data.into());
        self.provider
            .call(tx)
            .await
            .map_err(|e| LedgerError::Contract(e.to_string()))
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| LedgerError::Rpc(e.to_string()))
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(String),

    #[error("Chain ID mismatch: expected {expected}, endpoint reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Transaction submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Transaction {0} reverted")]
    Reverted(TxHash),

    #[error("Finality not reached within {0:?}")]
    FinalityTimeout(Duration),

    #[error("No UploadData event for document {doc_id} in transaction {tx_hash}")]
    SessionIdNotFound { doc_id: String, tx_hash: TxHash },

    #[error("Invalid session ID: {0:?}")]
    InvalidSessionId(String),

    #[error("Contract error: {0}")]
    Contract(String),

    #[error("Submission queue closed")]
    QueueClosed,
}

/// A ledger failure tagged with the commit phase it happened in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{phase} failed: {source}")]
pub struct CommitError {
    pub phase: CommitPhase,
    pub source: LedgerError,
}

impl CommitError {
    pub fn new(phase: CommitPhase, source: LedgerError) -> Self {
        Self { phase, source }
    }
}
