// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Genomic Custody Server
//!
//! Accepts genomic payloads from registered addresses, seals them behind a
//! logical TEE boundary, scores and signs the sealed artifact, stores it and
//! records the custody event on an EVM controller contract with a two-phase
//! commit.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Address registration and owner lookup
//! - `blockchain` - Controller contract client, signer and commit orchestration
//! - `pipeline` - The upload pipeline and its run journal records
//! - `storage` - Embedded database (redb) for users, records and runs
//! - `tee` - Sealing, opening and risk scoring of plaintext payloads

pub mod api;
pub mod auth;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod state;
pub mod storage;
pub mod tee;

#[cfg(test)]
mod testing;
