// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderName, Request},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::UserRecord,
    blockchain::{
        CommitPhase, RewardIssued, SessionRecord, SessionStatus, TokenBalance, UploadSession,
    },
    pipeline::{PipelineStage, StageOutcome, StageStatus, UploadRun},
    state::AppState,
    tee::RiskLevel,
};

pub mod genomic;
pub mod health;
pub mod sessions;
pub mod users;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let v1_routes = Router::new()
        .route("/auth/register", post(users::register))
        .route(
            "/genomic/upload",
            post(genomic::upload).layer(DefaultBodyLimit::max(genomic::MAX_UPLOAD_BYTES)),
        )
        .route("/uploads/{run_id}", get(genomic::get_run))
        .route("/sessions/{session_id}", get(sessions::get_session))
        .route("/pcsp/balance", get(sessions::get_pcsp_balance));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/v1", v1_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        health::readiness,
        users::register,
        genomic::upload,
        genomic::get_run,
        sessions::get_session,
        sessions::get_pcsp_balance
    ),
    components(
        schemas(
            health::ComponentState,
            health::ComponentReport,
            health::ReadinessReport,
            health::LivenessReport,
            users::RegisterRequest,
            UserRecord,
            genomic::UploadRequest,
            genomic::UploadResponse,
            UploadRun,
            StageOutcome,
            StageStatus,
            PipelineStage,
            UploadSession,
            SessionStatus,
            RiskLevel,
            CommitPhase,
            SessionRecord,
            RewardIssued,
            TokenBalance
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness checks"),
        (name = "Users", description = "Address registration"),
        (name = "Genomic", description = "Sealed genomic uploads and their run journal"),
        (name = "Ledger", description = "Controller session state and PCSP rewards")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{api_state, FakeLedger};
    use axum::{
        body::{to_bytes, Body},
        http::StatusCode,
    };
    use tower::ServiceExt;

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn liveness_is_routed_and_tagged_with_request_id() {
        let h = api_state(FakeLedger::new());
        let response = router(h.state.clone()).oneshot(get("/health/live")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
    }

    #[tokio::test]
    async fn caller_request_id_is_propagated() {
        let h = api_state(FakeLedger::new());
        let request = Request::builder()
            .uri("/health/live")
            .header(REQUEST_ID_HEADER, "req-123")
            .body(Body::empty())
            .unwrap();
        let response = router(h.state.clone()).oneshot(request).await.unwrap();

        assert_eq!(response.headers()[REQUEST_ID_HEADER], "req-123");
    }

    #[tokio::test]
    async fn upload_route_returns_json_receipt() {
        let h = api_state(FakeLedger::new());
        // 8 zero bytes, base64
        let body = format!(r#"{{"address":"{}","genomic_data":"AAAAAAAAAAA="}}"#, h.address);
        let response = router(h.state.clone())
            .oneshot(post_json("/v1/genomic/upload", &body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["session_id"], "42");
        assert_eq!(json["message"], "Genomic data uploaded successfully");
    }

    #[tokio::test]
    async fn register_route_returns_created() {
        let h = api_state(FakeLedger::new());
        let response = router(h.state.clone())
            .oneshot(post_json(
                "/v1/auth/register",
                r#"{"address":"0x2222222222222222222222222222222222222222"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn errors_are_json() {
        let h = api_state(FakeLedger::new());
        let response = router(h.state.clone())
            .oneshot(get("/v1/sessions/not-a-number"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["error"].as_str().unwrap().contains("Invalid session ID"));
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let h = api_state(FakeLedger::new());
        let response = router(h.state.clone())
            .oneshot(get("/api-doc/openapi.json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/health/live",
            "/health/ready",
            "/v1/auth/register",
            "/v1/genomic/upload",
            "/v1/uploads/{run_id}",
            "/v1/sessions/{session_id}",
            "/v1/pcsp/balance",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
