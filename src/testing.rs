// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! In-memory fakes of the pipeline's collaborators, for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy::primitives::{address, Address, Bytes, Log, TxHash, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use crate::auth::{validate_address, AuthError, AuthProvider, OwnerId, UserDirectory};
use crate::blockchain::controller::{controller_log, IController, SessionState, IERC20};
use crate::blockchain::{
    ArtifactSignature, ContractCall, CustodyKey, LedgerClient, LedgerCommitOrchestrator,
    LedgerError, SubmissionQueue, TxReceipt,
};
use crate::pipeline::{CustodyPipeline, UploadRun};
use crate::state::AppState;
use crate::storage::database::temp_db;
use crate::storage::{RecordStore, RunJournal, SignedRecord, StoreError, StoreResult};
use crate::tee::SealedArtifact;

pub const CONTROLLER: Address = address!("0x1000000000000000000000000000000000000001");

pub const USER_ADDRESS: &str = "0x6491414173c71986Ee031307Af447cE1DbDf2ED0";

pub const USER_OWNER_ID: OwnerId = 7;

// =============================================================================
// Ledger
// =============================================================================

/// How the fake finalizes `uploadData` transactions.
#[derive(Debug, Clone, Copy)]
pub enum BeginBehaviour {
    /// Emit `UploadData` with this session id.
    Session(u64),
    /// Succeed without emitting any event.
    NoEvent,
    /// Never produce a receipt.
    NeverFinal,
    Revert,
}

/// How the fake finalizes `confirm` transactions.
#[derive(Debug, Clone, Copy)]
pub enum ConfirmBehaviour {
    Plain,
    Events {
        minted: Option<u64>,
        reward: Option<u64>,
    },
    /// Never produce a receipt.
    NeverFinal,
    Revert,
}

#[derive(Clone)]
enum Finality {
    Final(TxReceipt),
    Never,
}

#[derive(Default)]
struct LedgerState {
    submitted: Vec<ContractCall>,
    receipts: HashMap<TxHash, Finality>,
}

pub struct FakeLedger {
    account: Address,
    begin: BeginBehaviour,
    confirm: ConfirmBehaviour,
    submit_delay: Duration,
    submit_error: Option<String>,
    session: Option<SessionState>,
    reward_token: Address,
    balance: U256,
    state: Mutex<LedgerState>,
    next_tx: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self {
            account: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
            begin: BeginBehaviour::Session(42),
            confirm: ConfirmBehaviour::Plain,
            submit_delay: Duration::ZERO,
            submit_error: None,
            session: None,
            reward_token: address!("0x3000000000000000000000000000000000000003"),
            balance: U256::ZERO,
            state: Mutex::new(LedgerState::default()),
            next_tx: AtomicU64::new(1),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_begin(mut self, behaviour: BeginBehaviour) -> Self {
        self.begin = behaviour;
        self
    }

    pub fn with_confirm(mut self, behaviour: ConfirmBehaviour) -> Self {
        self.confirm = behaviour;
        self
    }

    pub fn with_submit_delay(mut self, delay: Duration) -> Self {
        self.submit_delay = delay;
        self
    }

    pub fn failing_submits(mut self, message: &str) -> Self {
        self.submit_error = Some(message.to_string());
        self
    }

    pub fn with_session(mut self, session: SessionState) -> Self {
        self.session = Some(session);
        self
    }

    pub fn with_reward_token(mut self, token: Address) -> Self {
        self.reward_token = token;
        self
    }

    pub fn with_balance(mut self, balance: U256) -> Self {
        self.balance = balance;
        self
    }

    /// Calls broadcast so far, in order.
    pub fn submitted(&self) -> Vec<ContractCall> {
        self.state.lock().unwrap().submitted.clone()
    }

    /// Highest number of `submit` calls observed running at once.
    pub fn max_concurrent_submits(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn finality_for(&self, tx_hash: TxHash, call: &ContractCall) -> Finality {
        let receipt = |success: bool, logs: Vec<Log>| {
            Finality::Final(TxReceipt {
                tx_hash,
                block_number: Some(100),
                success,
                logs,
            })
        };

        if call.data.starts_with(&IController::uploadDataCall::SELECTOR) {
            let Ok(upload) = IController::uploadDataCall::abi_decode(&call.data) else {
                return receipt(false, vec![]);
            };
            match self.begin {
                BeginBehaviour::Session(id) => receipt(
                    true,
                    vec![controller_log(
                        call.to,
                        &IController::UploadData {
                            docId: upload.docId,
                            sessionId: U256::from(id),
                        },
                    )],
                ),
                BeginBehaviour::NoEvent => receipt(true, vec![]),
                BeginBehaviour::NeverFinal => Finality::Never,
                BeginBehaviour::Revert => receipt(false, vec![]),
            }
        } else if call.data.starts_with(&IController::confirmCall::SELECTOR) {
            match self.confirm {
                ConfirmBehaviour::Plain => receipt(true, vec![]),
                ConfirmBehaviour::Events { minted, reward } => {
                    let mut logs = Vec::new();
                    if let Some(token_id) = minted {
                        logs.push(controller_log(
                            call.to,
                            &IController::GeneNFTMinted {
                                owner: self.account,
                                tokenId: U256::from(token_id),
                            },
                        ));
                    }
                    if let Some(amount) = reward {
                        logs.push(controller_log(
                            call.to,
                            &IController::PCSPRewarded {
                                user: self.account,
                                amount: U256::from(amount),
                            },
                        ));
                    }
                    receipt(true, logs)
                }
                ConfirmBehaviour::NeverFinal => Finality::Never,
                ConfirmBehaviour::Revert => receipt(false, vec![]),
            }
        } else {
            receipt(true, vec![])
        }
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    fn account(&self) -> Address {
        self.account
    }

    async fn submit(&self, call: ContractCall) -> Result<TxHash, LedgerError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        if !self.submit_delay.is_zero() {
            tokio::time::sleep(self.submit_delay).await;
        }

        let result = match &self.submit_error {
            Some(message) => Err(LedgerError::SubmissionFailed(message.clone())),
            None => {
                let n = self.next_tx.fetch_add(1, Ordering::SeqCst);
                let tx_hash = B256::left_padding_from(&n.to_be_bytes());
                let finality = self.finality_for(tx_hash, &call);
                let mut state = self.state.lock().unwrap();
                state.submitted.push(call);
                state.receipts.insert(tx_hash, finality);
                Ok(tx_hash)
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn wait_for_finality(&self, tx_hash: TxHash) -> Result<TxReceipt, LedgerError> {
        let finality = self.state.lock().unwrap().receipts.get(&tx_hash).cloned();
        match finality {
            Some(Finality::Final(receipt)) => Ok(receipt),
            Some(Finality::Never) => std::future::pending().await,
            None => Err(LedgerError::Rpc(format!("unknown transaction {tx_hash}"))),
        }
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes, LedgerError> {
        let output = if data.starts_with(&IController::getSessionCall::SELECTOR) {
            let session = self
                .session
                .clone()
                .ok_or_else(|| LedgerError::Contract("execution reverted".to_string()))?;
            IController::getSessionCall::abi_encode_returns(&session)
        } else if data.starts_with(&IController::pcspTokenCall::SELECTOR) {
            IController::pcspTokenCall::abi_encode_returns(&self.reward_token)
        } else if data.starts_with(&IERC20::balanceOfCall::SELECTOR) {
            IERC20::balanceOfCall::abi_encode_returns(&self.balance)
        } else {
            return Err(LedgerError::Contract("unknown selector".to_string()));
        };
        Ok(output.into())
    }

    async fn block_number(&self) -> Result<u64, LedgerError> {
        Ok(100)
    }
}

// =============================================================================
// Auth
// =============================================================================

#[derive(Default)]
pub struct FakeAuth {
    users: HashMap<String, OwnerId>,
}

impl FakeAuth {
    pub fn with_user(mut self, address: &str, owner_id: OwnerId) -> Self {
        self.users.insert(address.to_lowercase(), owner_id);
        self
    }
}

impl AuthProvider for FakeAuth {
    fn authenticate(&self, address: &str) -> Result<OwnerId, AuthError> {
        validate_address(address)?;
        self.users
            .get(&address.to_lowercase())
            .copied()
            .ok_or_else(|| AuthError::NotFound(address.to_string()))
    }
}

// =============================================================================
// Record store
// =============================================================================

/// Record store that always hands out the same file id.
pub struct FakeRecordStore {
    file_id: String,
    entries: Mutex<HashMap<String, (SignedRecord, SealedArtifact)>>,
    puts: AtomicUsize,
}

impl FakeRecordStore {
    pub fn with_file_id(file_id: &str) -> Self {
        Self {
            file_id: file_id.to_string(),
            entries: Mutex::new(HashMap::new()),
            puts: AtomicUsize::new(0),
        }
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn stored_artifact(&self, file_id: &str) -> Option<SealedArtifact> {
        self.entries
            .lock()
            .unwrap()
            .get(file_id)
            .map(|(_, artifact)| artifact.clone())
    }

    /// Flip the last byte of a stored artifact.
    pub fn tamper(&self, file_id: &str) {
        let mut entries = self.entries.lock().unwrap();
        let (_, artifact) = entries.get_mut(file_id).unwrap();
        let mut bytes = artifact.as_bytes().to_vec();
        *bytes.last_mut().unwrap() ^= 0x01;
        *artifact = SealedArtifact::from_bytes(bytes).unwrap();
    }
}

impl RecordStore for FakeRecordStore {
    fn put(
        &self,
        owner: OwnerId,
        artifact: &SealedArtifact,
        signature: &ArtifactSignature,
    ) -> StoreResult<String> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        let record = SignedRecord::new(self.file_id.clone(), owner, signature);
        self.entries
            .lock()
            .unwrap()
            .insert(self.file_id.clone(), (record, artifact.clone()));
        Ok(self.file_id.clone())
    }

    fn get(&self, file_id: &str) -> StoreResult<SealedArtifact> {
        self.stored_artifact(file_id)
            .ok_or_else(|| StoreError::NotFound(format!("file {file_id}")))
    }

    fn record(&self, file_id: &str) -> StoreResult<SignedRecord> {
        self.entries
            .lock()
            .unwrap()
            .get(file_id)
            .map(|(record, _)| record.clone())
            .ok_or_else(|| StoreError::NotFound(format!("file {file_id}")))
    }
}

// =============================================================================
// Journal
// =============================================================================

#[derive(Default)]
pub struct FakeJournal {
    runs: Mutex<HashMap<String, UploadRun>>,
}

impl RunJournal for FakeJournal {
    fn record_run(&self, run: &UploadRun) -> StoreResult<()> {
        self.runs
            .lock()
            .unwrap()
            .insert(run.run_id.clone(), run.clone());
        Ok(())
    }

    fn load_run(&self, run_id: &str) -> StoreResult<UploadRun> {
        self.runs
            .lock()
            .unwrap()
            .get(run_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("run {run_id}")))
    }
}

impl FakeJournal {
    /// Every journaled run, latest write per run id.
    pub fn runs(&self) -> Vec<UploadRun> {
        self.runs.lock().unwrap().values().cloned().collect()
    }
}

// =============================================================================
// Wiring
// =============================================================================

/// Orchestrator over `ledger` with its own submission queue. Needs a runtime.
pub fn orchestrator_with(ledger: Arc<FakeLedger>, timeout: Duration) -> LedgerCommitOrchestrator {
    orchestrator_until(ledger, timeout, CancellationToken::new())
}

/// Like [`orchestrator_with`], with the queue writer stopping on `shutdown`.
pub fn orchestrator_until(
    ledger: Arc<FakeLedger>,
    timeout: Duration,
    shutdown: CancellationToken,
) -> LedgerCommitOrchestrator {
    let queue = SubmissionQueue::spawn(ledger.clone(), shutdown);
    LedgerCommitOrchestrator::new(ledger, queue, CONTROLLER, timeout)
}

pub struct PipelineHarness {
    pub pipeline: CustodyPipeline,
    pub ledger: Arc<FakeLedger>,
    pub records: Arc<FakeRecordStore>,
    pub journal: Arc<FakeJournal>,
    pub key: Arc<CustodyKey>,
}

/// Pipeline with `USER_ADDRESS` registered and a store returning `abc123`.
pub fn pipeline_with(ledger: FakeLedger, finality_timeout: Duration) -> PipelineHarness {
    let ledger = Arc::new(ledger);
    let records = Arc::new(FakeRecordStore::with_file_id("abc123"));
    let journal = Arc::new(FakeJournal::default());
    let key = Arc::new(CustodyKey::random());
    let auth = Arc::new(FakeAuth::default().with_user(USER_ADDRESS, USER_OWNER_ID));

    let pipeline = CustodyPipeline::new(
        auth,
        records.clone(),
        Arc::new(orchestrator_with(ledger.clone(), finality_timeout)),
        key.clone(),
    )
    .with_journal(journal.clone());

    PipelineHarness {
        pipeline,
        ledger,
        records,
        journal,
        key,
    }
}

pub struct ApiHarness {
    pub state: AppState,
    /// Registered address.
    pub address: String,
    _dir: TempDir,
}

/// Handler state over a temporary database with `USER_ADDRESS` registered.
pub fn api_state(ledger: FakeLedger) -> ApiHarness {
    let ledger = Arc::new(ledger);
    let (db, dir) = temp_db();
    let db = Arc::new(db);
    db.register(USER_ADDRESS).unwrap();

    let orchestrator = Arc::new(orchestrator_with(ledger, Duration::from_secs(5)));
    let pipeline = CustodyPipeline::new(
        db.clone(),
        db.clone(),
        orchestrator.clone(),
        Arc::new(CustodyKey::random()),
    )
    .with_journal(db.clone());

    let state = AppState::new(Arc::new(pipeline), orchestrator, db.clone(), db)
        .with_data_dir(dir.path().to_path_buf());

    ApiHarness {
        state,
        address: USER_ADDRESS.to_string(),
        _dir: dir,
    }
}
