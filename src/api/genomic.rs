// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Genomic upload endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use base64ct::{Base64, Encoding};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::ApiError, pipeline::UploadRun, state::AppState};

/// Maximum accepted request body for uploads.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Request for POST /v1/genomic/upload
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadRequest {
    /// Registered address of the data owner
    #[schema(example = "0x6491414173c71986Ee031307Af447cE1DbDf2ED0")]
    pub address: String,
    /// Raw genomic markers, standard base64. Length must be a multiple of 8 bytes.
    pub genomic_data: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub session_id: String,
    pub file_id: String,
    pub message: String,
    /// Id of the journaled pipeline run
    pub run_id: String,
}

/// Seal, score, sign, store and commit a genomic payload.
///
/// The call blocks until both ledger transactions are final.
#[utoipa::path(
    post,
    path = "/v1/genomic/upload",
    tag = "Genomic",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Upload committed", body = UploadResponse),
        (status = 400, description = "Invalid address or payload"),
        (status = 404, description = "Address not registered"),
        (status = 502, description = "Ledger commit failed"),
        (status = 504, description = "Ledger finality timeout"),
    )
)]
pub async fn upload(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, ApiError> {
    let payload = Base64::decode_vec(request.genomic_data.trim())
        .map_err(|_| ApiError::bad_request("genomic_data is not valid base64"))?;

    let receipt = state.pipeline.upload(&request.address, &payload).await?;

    Ok(Json(UploadResponse {
        session_id: receipt.session_id,
        file_id: receipt.file_id,
        message: receipt.message,
        run_id: receipt.run_id,
    }))
}

/// Get the journaled stage outcomes of a pipeline run.
#[utoipa::path(
    get,
    path = "/v1/uploads/{run_id}",
    tag = "Genomic",
    params(("run_id" = String, Path, description = "Pipeline run ID")),
    responses(
        (status = 200, description = "Run record", body = UploadRun),
        (status = 404, description = "Run not found"),
    )
)]
pub async fn get_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<UploadRun>, ApiError> {
    Ok(Json(state.journal.load_run(&run_id)?))
}
