// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Custody Storage Module
//!
//! Persistent storage in a single embedded redb database under `DATA_DIR`.
//!
//! ## Storage Layout
//!
//! ```text
//! {DATA_DIR}/custody.redb
//!   users        # registered addresses and owner ids
//!   owner_ids
//!   records      # signed record metadata per file id
//!   artifacts    # sealed artifacts per file id
//!   upload_runs  # pipeline run journal
//! ```
//!
//! ## Important Notes
//!
//! - Only sealed artifacts are stored; plaintext never reaches this module
//! - Records are immutable once written

pub mod database;
pub mod journal;
pub mod records;

pub use database::{CustodyDatabase, StoreError, StoreResult, DATABASE_FILE};
pub use journal::RunJournal;
pub use records::{RecordStore, SignedRecord};
