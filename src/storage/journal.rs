// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Upload run journal.
//!
//! Each pipeline run is written once it ends, whether it succeeded or not,
//! so the completed stages of a failed run can be looked up later.

use redb::ReadableDatabase;

use super::database::{CustodyDatabase, StoreError, StoreResult, UPLOAD_RUNS};
use crate::pipeline::UploadRun;

/// Persistence of pipeline run records.
pub trait RunJournal: Send + Sync {
    fn record_run(&self, run: &UploadRun) -> StoreResult<()>;

    fn load_run(&self, run_id: &str) -> StoreResult<UploadRun>;
}

impl RunJournal for CustodyDatabase {
    fn record_run(&self, run: &UploadRun) -> StoreResult<()> {
        let json = serde_json::to_vec(run)?;

        let write_txn = self.db().begin_write()?;
        {
            let mut table = write_txn.open_table(UPLOAD_RUNS)?;
            table.insert(run.run_id.as_str(), json.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn load_run(&self, run_id: &str) -> StoreResult<UploadRun> {
        let read_txn = self.db().begin_read()?;
        let table = read_txn.open_table(UPLOAD_RUNS)?;
        match table.get(run_id)? {
            Some(value) => Ok(serde_json::from_slice(value.value())?),
            None => Err(StoreError::NotFound(format!("run {run_id}"))),
        }
    }
}
