// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Custody Pipeline
//!
//! Runs one upload from raw payload to confirmed ledger session:
//!
//! ```text
//! Authenticate -> Validate -> Seal -> Score -> Sign -> Persist
//!              -> BeginUpload -> ConfirmUpload
//! ```
//!
//! Every stage outcome is recorded on an [`UploadRun`]. The first failure
//! aborts the run; stages that already completed are not undone. In
//! particular a failure in either ledger stage leaves the sealed artifact
//! stored, which [`PipelineError::artifact_stored`] reports.
//!
//! The run is journaled before each ledger phase and again when it ends, so
//! a run abandoned during a finality wait still names its stored file.
//!
//! Input is validated before any cryptographic work. Error messages never
//! contain payload bytes or key material.

use std::fmt;
use std::sync::Arc;

use alloy::primitives::{keccak256, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{AuthError, AuthProvider};
use crate::blockchain::{
    sign_artifact, CommitError, CustodyKey, LedgerCommitOrchestrator, RewardIssued, UploadSession,
};
use crate::storage::{RecordStore, RunJournal, StoreError};
use crate::tee::{self, CryptoError, InputError, KeyMaterial};

/// Proof submitted with every confirmation until real proofs exist.
pub const PLACEHOLDER_PROOF: &str = "0x1234";

pub const UPLOAD_MESSAGE: &str = "Genomic data uploaded successfully";

// =============================================================================
// Run Record
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Authenticate,
    Validate,
    Seal,
    Score,
    Sign,
    Persist,
    BeginUpload,
    ConfirmUpload,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Authenticate => "authenticate",
            PipelineStage::Validate => "validate",
            PipelineStage::Seal => "seal",
            PipelineStage::Score => "score",
            PipelineStage::Sign => "sign",
            PipelineStage::Persist => "persist",
            PipelineStage::BeginUpload => "begin_upload",
            PipelineStage::ConfirmUpload => "confirm_upload",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StageOutcome {
    pub stage: PipelineStage,
    pub status: StageStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

/// Saga record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadRun {
    pub run_id: String,
    pub address: String,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
    pub outcomes: Vec<StageOutcome>,
    /// Set once the artifact is persisted.
    #[serde(default)]
    pub file_id: Option<String>,
    #[serde(default)]
    pub session: Option<UploadSession>,
}

impl UploadRun {
    pub fn new(address: &str) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            address: address.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
            file_id: None,
            session: None,
        }
    }

    pub fn completed(&mut self, stage: PipelineStage) {
        self.outcomes.push(StageOutcome {
            stage,
            status: StageStatus::Completed,
            error: None,
            at: Utc::now(),
        });
    }

    pub fn failed(&mut self, stage: PipelineStage, reason: impl Into<String>) {
        self.outcomes.push(StageOutcome {
            stage,
            status: StageStatus::Failed,
            error: Some(reason.into()),
            at: Utc::now(),
        });
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn completed_stages(&self) -> Vec<PipelineStage> {
        self.outcomes
            .iter()
            .filter(|o| o.status == StageStatus::Completed)
            .map(|o| o.stage)
            .collect()
    }

    pub fn failed_stage(&self) -> Option<PipelineStage> {
        self.outcomes
            .iter()
            .find(|o| o.status == StageStatus::Failed)
            .map(|o| o.stage)
    }

    pub fn succeeded(&self) -> bool {
        self.failed_stage().is_none()
            && self.completed_stages().last() == Some(&PipelineStage::ConfirmUpload)
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CustodyError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ledger(#[from] CommitError),
}

/// A failed run: which stage failed, what had completed, and why.
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub completed: Vec<PipelineStage>,
    pub run_id: String,
    pub file_id: Option<String>,
    pub source: CustodyError,
}

impl PipelineError {
    /// Whether the sealed artifact was stored before the failure.
    pub fn artifact_stored(&self) -> bool {
        self.file_id.is_some()
    }
}

// =============================================================================
// Pipeline
// =============================================================================

/// Result of a completed upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadReceipt {
    pub run_id: String,
    pub session_id: String,
    pub file_id: String,
    pub session: UploadSession,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minted_token_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<RewardIssued>,
    pub message: String,
}

type StageResult<T> = Result<T, (PipelineStage, CustodyError)>;

/// Record the outcome of one stage on the run.
fn step<T, E: Into<CustodyError>>(
    run: &mut UploadRun,
    stage: PipelineStage,
    result: Result<T, E>,
) -> StageResult<T> {
    match result {
        Ok(value) => {
            run.completed(stage);
            debug!(run_id = %run.run_id, %stage, "Stage completed");
            Ok(value)
        }
        Err(err) => {
            let err = err.into();
            run.failed(stage, err.to_string());
            Err((stage, err))
        }
    }
}

pub struct CustodyPipeline {
    auth: Arc<dyn AuthProvider>,
    records: Arc<dyn RecordStore>,
    ledger: Arc<LedgerCommitOrchestrator>,
    journal: Option<Arc<dyn RunJournal>>,
    key: Arc<CustodyKey>,
}

impl CustodyPipeline {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        records: Arc<dyn RecordStore>,
        ledger: Arc<LedgerCommitOrchestrator>,
        key: Arc<CustodyKey>,
    ) -> Self {
        Self {
            auth,
            records,
            ledger,
            journal: None,
            key,
        }
    }

    pub fn with_journal(mut self, journal: Arc<dyn RunJournal>) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Seal, score, sign, store and commit one payload for `address`.
    pub async fn upload(&self, address: &str, payload: &[u8]) -> Result<UploadReceipt, PipelineError> {
        let mut run = UploadRun::new(address);
        info!(run_id = %run.run_id, size = payload.len(), "Upload pipeline started");

        let result = self.run_stages(&mut run, payload).await;
        run.finish();
        self.journal_run(&run);

        match result {
            Ok(receipt) => {
                info!(
                    run_id = %receipt.run_id,
                    file_id = %receipt.file_id,
                    session_id = %receipt.session_id,
                    "Upload pipeline completed"
                );
                Ok(receipt)
            }
            Err((stage, source)) => {
                warn!(
                    run_id = %run.run_id,
                    %stage,
                    error = %source,
                    artifact_stored = run.file_id.is_some(),
                    "Upload pipeline failed"
                );
                Err(PipelineError {
                    stage,
                    completed: run.completed_stages(),
                    run_id: run.run_id,
                    file_id: run.file_id,
                    source,
                })
            }
        }
    }

    async fn run_stages(&self, run: &mut UploadRun, payload: &[u8]) -> StageResult<UploadReceipt> {
        let address = run.address.clone();

        let owner = step(run, PipelineStage::Authenticate, self.auth.authenticate(&address))?;
        let markers = step(run, PipelineStage::Validate, tee::payload_markers(payload))?;
        let artifact = step(
            run,
            PipelineStage::Seal,
            tee::seal(payload, &self.key.key_material()),
        )?;
        let risk_level = step(
            run,
            PipelineStage::Score,
            Ok::<_, CustodyError>(tee::score(&markers)),
        )?;
        let signature = step(
            run,
            PipelineStage::Sign,
            sign_artifact(artifact.as_bytes(), &self.key),
        )?;
        let file_id = step(
            run,
            PipelineStage::Persist,
            self.records.put(owner, &artifact, &signature),
        )?;
        run.file_id = Some(file_id.clone());

        let mut session = UploadSession::new(
            Uuid::new_v4().to_string(),
            alloy::hex::encode(signature.content_hash),
            PLACEHOLDER_PROOF.to_string(),
            risk_level,
        );
        run.session = Some(session.clone());
        self.journal_run(run);

        let begun = self.ledger.begin_upload(&file_id).await;
        let begun = step(run, PipelineStage::BeginUpload, begun)?;
        session.mined(begun.session_id.clone());
        run.session = Some(session.clone());
        self.journal_run(run);

        let confirmed = self
            .ledger
            .confirm_upload(
                &session.doc_id,
                &session.content_hash,
                &session.proof,
                &begun.session_id,
                risk_level,
            )
            .await;
        let confirmed = step(run, PipelineStage::ConfirmUpload, confirmed)?;
        session.confirmed(&confirmed);
        run.session = Some(session.clone());

        Ok(UploadReceipt {
            run_id: run.run_id.clone(),
            session_id: begun.session_id,
            file_id,
            session,
            minted_token_id: confirmed.minted_token_id,
            reward: confirmed.reward,
            message: UPLOAD_MESSAGE.to_string(),
        })
    }

    /// Load a stored artifact, check it against its signed content hash and
    /// open it.
    pub fn retrieve(&self, file_id: &str, key: &KeyMaterial) -> Result<Vec<u8>, CustodyError> {
        let record = self.records.record(file_id)?;
        let artifact = self.records.get(file_id)?;

        let expected: B256 = record
            .content_hash
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("file {file_id}: bad content hash")))?;
        if keccak256(artifact.as_bytes()) != expected {
            return Err(CryptoError::IntegrityViolation.into());
        }

        Ok(tee::open(artifact.as_bytes(), key)?)
    }

    fn journal_run(&self, run: &UploadRun) {
        if let Some(journal) = &self.journal {
            if let Err(e) = journal.record_run(run) {
                warn!(run_id = %run.run_id, error = %e, "Failed to journal upload run");
            }
        }
    }
}
