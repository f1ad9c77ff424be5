// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::UserDirectory;
use crate::blockchain::LedgerCommitOrchestrator;
use crate::pipeline::CustodyPipeline;
use crate::storage::RunJournal;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<CustodyPipeline>,
    pub ledger: Arc<LedgerCommitOrchestrator>,
    pub users: Arc<dyn UserDirectory>,
    pub journal: Arc<dyn RunJournal>,
    /// Checked by the health endpoints when set.
    pub data_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(
        pipeline: Arc<CustodyPipeline>,
        ledger: Arc<LedgerCommitOrchestrator>,
        users: Arc<dyn UserDirectory>,
        journal: Arc<dyn RunJournal>,
    ) -> Self {
        Self {
            pipeline,
            ledger,
            users,
            journal,
            data_dir: None,
        }
    }

    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        self.data_dir = Some(data_dir);
        self
    }
}
