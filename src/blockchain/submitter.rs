// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Per-Account Submission Queue
//!
//! Concurrent uploads share one signing account. If two tasks broadcast at
//! the same time they race for the same account nonce, so every submission
//! for an account goes through a single writer task that handles one
//! request at a time.
//!
//! Only the broadcast is serialized. Waiting for finality happens on the
//! caller's task, so a slow confirmation never blocks other submissions.
//!
//! ## Shutdown
//!
//! The writer task exits when the cancellation token fires or when every
//! queue handle is dropped. Pending and later submissions then fail with
//! [`LedgerError::QueueClosed`].

use std::sync::Arc;

use alloy::primitives::{Address, TxHash};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::client::{LedgerClient, LedgerError};
use super::types::ContractCall;

/// Maximum queued submissions before callers wait for capacity.
const QUEUE_CAPACITY: usize = 64;

struct SubmitRequest {
    call: ContractCall,
    reply: oneshot::Sender<Result<TxHash, LedgerError>>,
}

/// Handle to the single-writer submission task of one signing account.
#[derive(Clone)]
pub struct SubmissionQueue {
    account: Address,
    sender: mpsc::Sender<SubmitRequest>,
}

impl SubmissionQueue {
    /// Spawn the writer task for the client's signing account.
    pub fn spawn(client: Arc<dyn LedgerClient>, shutdown: CancellationToken) -> Self {
        let account = client.account();
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        tokio::spawn(run_writer(client, receiver, shutdown));
        Self { account, sender }
    }

    pub fn account(&self) -> Address {
        self.account
    }

    /// Enqueue a call and wait until it has been broadcast.
    pub async fn submit(&self, call: ContractCall) -> Result<TxHash, LedgerError> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(SubmitRequest { call, reply })
            .await
            .map_err(|_| LedgerError::QueueClosed)?;
        response.await.map_err(|_| LedgerError::QueueClosed)?
    }
}

async fn run_writer(
    client: Arc<dyn LedgerClient>,
    mut receiver: mpsc::Receiver<SubmitRequest>,
    shutdown: CancellationToken,
) {
    let account = client.account();
    info!(%account, "Submission queue starting");

    loop {
        let request = tokio::select! {
            request = receiver.recv() => request,
            _ = shutdown.cancelled() => None,
        };

        let Some(SubmitRequest { call, reply }) = request else {
            info!(%account, "Submission queue shutting down");
            return;
        };

        let result = client.submit(call).await;
        if let Ok(tx_hash) = &result {
            debug!(%account, %tx_hash, "Transaction broadcast");
        }
        // The caller may have given up; nothing to do then.
        let _ = reply.send(result);
    }
}
