// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Read-only ledger queries: session state and PCSP reward balances.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    auth::validate_address,
    blockchain::{SessionRecord, TokenBalance},
    error::ApiError,
    state::AppState,
};

/// Query parameters for the balance request.
#[derive(Debug, Deserialize, IntoParams)]
pub struct BalanceQuery {
    /// Holder address
    pub address: String,
}

/// Read an upload session from the controller contract.
#[utoipa::path(
    get,
    path = "/v1/sessions/{session_id}",
    tag = "Ledger",
    params(("session_id" = String, Path, description = "Decimal session ID assigned by the controller")),
    responses(
        (status = 200, description = "Session state", body = SessionRecord),
        (status = 400, description = "Session ID is not a decimal integer"),
        (status = 502, description = "Ledger call failed"),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionRecord>, ApiError> {
    Ok(Json(state.ledger.get_session(&session_id).await?))
}

/// PCSP reward token balance of an address.
#[utoipa::path(
    get,
    path = "/v1/pcsp/balance",
    tag = "Ledger",
    params(BalanceQuery),
    responses(
        (status = 200, description = "Token balance", body = TokenBalance),
        (status = 400, description = "Invalid address"),
        (status = 502, description = "Ledger call failed"),
    )
)]
pub async fn get_pcsp_balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<TokenBalance>, ApiError> {
    validate_address(&query.address)?;
    Ok(Json(state.ledger.reward_balance(&query.address).await?))
}
