// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Liveness and readiness checks.
//!
//! Readiness covers the two things an upload depends on outside the
//! process: the data directory holding the database, and a ledger RPC that
//! answers `eth_blockNumber`.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// State of one dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Ok,
    Missing,
    Unavailable,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComponentReport {
    /// `null` when no data directory is configured.
    pub data_dir: Option<ComponentState>,
    pub ledger: ComponentState,
    /// Head block reported by the ledger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadinessReport {
    /// `ready` or `degraded`
    pub status: String,
    pub components: ComponentReport,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LivenessReport {
    pub status: String,
}

impl ComponentReport {
    fn is_ready(&self) -> bool {
        self.ledger == ComponentState::Ok
            && self.data_dir.map_or(true, |s| s == ComponentState::Ok)
    }
}

async fn check_components(state: &AppState) -> ComponentReport {
    let data_dir = state.data_dir.as_deref().map(|dir| {
        if dir.is_dir() {
            ComponentState::Ok
        } else {
            ComponentState::Missing
        }
    });

    let (ledger, block_number) = match state.ledger.block_number().await {
        Ok(n) => (ComponentState::Ok, Some(n)),
        Err(e) => {
            tracing::warn!(error = %e, "Ledger readiness check failed");
            (ComponentState::Unavailable, None)
        }
    };

    ComponentReport {
        data_dir,
        ledger,
        block_number,
    }
}

/// Dependency report; 503 when any dependency is down.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies available", body = ReadinessReport),
        (status = 503, description = "A dependency is unavailable", body = ReadinessReport)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    let components = check_components(&state).await;
    let ready = components.is_ready();

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let report = ReadinessReport {
        status: if ready { "ready" } else { "degraded" }.to_string(),
        components,
    };
    (status, Json(report))
}

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses((status = 200, description = "Process is running", body = LivenessReport))
)]
pub async fn liveness() -> Json<LivenessReport> {
    Json(LivenessReport {
        status: "alive".to_string(),
    })
}

/// Same checks as `/health`, under the path orchestrators poll.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Ready for uploads", body = ReadinessReport),
        (status = 503, description = "Not ready", body = ReadinessReport)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadinessReport>) {
    health(state).await
}
