// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User registration endpoint.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{auth::UserRecord, error::ApiError, state::AppState};

/// Request for POST /v1/auth/register
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// EVM address, `0x` followed by 40 hex digits
    #[schema(example = "0x6491414173c71986Ee031307Af447cE1DbDf2ED0")]
    pub address: String,
}

/// Register an address and assign it an owner id.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered", body = UserRecord),
        (status = 400, description = "Invalid address"),
        (status = 409, description = "Address already registered"),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserRecord>), ApiError> {
    let user = state.users.register(&request.address)?;
    Ok((StatusCode::CREATED, Json(user)))
}
