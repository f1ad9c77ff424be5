// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::blockchain::{CommitError, LedgerError};
use crate::pipeline::{CustodyError, PipelineError};
use crate::storage::StoreError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidAddress(_) | LedgerError::InvalidSessionId(_) => StatusCode::BAD_REQUEST,
        LedgerError::FinalityTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::new(err.status_code(), err.to_string())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self::new(ledger_status(&err), err.to_string())
    }
}

impl From<CommitError> for ApiError {
    fn from(err: CommitError) -> Self {
        Self::new(ledger_status(&err.source), err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => Self::not_found(format!("Not found: {what}")),
            other => Self::internal(other.to_string()),
        }
    }
}

impl From<CustodyError> for ApiError {
    fn from(err: CustodyError) -> Self {
        match err {
            CustodyError::Input(e) => Self::bad_request(e.to_string()),
            CustodyError::Crypto(e) => Self::internal(e.to_string()),
            CustodyError::Auth(e) => e.into(),
            CustodyError::Store(e) => e.into(),
            CustodyError::Ledger(e) => e.into(),
        }
    }
}

/// Keeps the failed stage in the message; the status follows the cause.
impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let message = err.to_string();
        let status = ApiError::from(err.source).status;
        Self::new(status, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::CommitPhase;
    use crate::pipeline::PipelineStage;
    use crate::tee::{CryptoError, InputError};
    use axum::body::to_bytes;
    use std::time::Duration;

    fn pipeline_error(stage: PipelineStage, source: CustodyError) -> PipelineError {
        PipelineError {
            stage,
            completed: vec![],
            run_id: "run".to_string(),
            file_id: None,
            source,
        }
    }

    #[test]
    fn constructors_set_status_and_message() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let internal = ApiError::internal("boom");
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[test]
    fn pipeline_errors_map_by_cause() {
        let cases = [
            (
                pipeline_error(
                    PipelineStage::Authenticate,
                    AuthError::InvalidAddress("x".into()).into(),
                ),
                StatusCode::BAD_REQUEST,
            ),
            (
                pipeline_error(
                    PipelineStage::Authenticate,
                    AuthError::NotFound("0xabc".into()).into(),
                ),
                StatusCode::NOT_FOUND,
            ),
            (
                pipeline_error(PipelineStage::Validate, InputError::EmptyPayload.into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                pipeline_error(PipelineStage::Seal, CryptoError::Cipher("boom".into()).into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                pipeline_error(
                    PipelineStage::BeginUpload,
                    CommitError::new(
                        CommitPhase::BeginUpload,
                        LedgerError::Rpc("connection refused".into()),
                    )
                    .into(),
                ),
                StatusCode::BAD_GATEWAY,
            ),
            (
                pipeline_error(
                    PipelineStage::BeginUpload,
                    CommitError::new(
                        CommitPhase::BeginUpload,
                        LedgerError::FinalityTimeout(Duration::from_secs(1)),
                    )
                    .into(),
                ),
                StatusCode::GATEWAY_TIMEOUT,
            ),
        ];

        for (err, expected) in cases {
            let api: ApiError = err.into();
            assert_eq!(api.status, expected, "{}", api.message);
        }
    }

    #[test]
    fn pipeline_error_message_names_stage() {
        let api: ApiError = pipeline_error(
            PipelineStage::Validate,
            InputError::InvalidMarkerLength(7).into(),
        )
        .into();
        assert!(api.message.starts_with("validate stage failed:"));
    }

    #[test]
    fn store_not_found_is_404() {
        let api: ApiError = StoreError::NotFound("run x".into()).into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
    }
}
