// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Readiness response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall status ("ok").
    pub status: String,
    /// Individual component checks.
    pub checks: ReadyChecks,
}

/// Individual readiness checks.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Tokens currently resident in the store (live or awaiting sweep).
    pub pending_tokens: usize,
    /// OPRF scalar status. The process cannot start without one, so this
    /// reads "ok" whenever the endpoint answers at all.
    pub oprf_key: String,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses((status = 200, body = ReadyResponse))
)]
pub async fn ready(State(state): State<AppState>) -> Json<ReadyResponse> {
    Json(ReadyResponse {
        status: "ok".to_string(),
        checks: ReadyChecks {
            service: "ok".to_string(),
            pending_tokens: state.tokens.len(),
            oprf_key: "ok".to_string(),
        },
    })
}
