// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use tracing::error;

use crate::{
    error::ApiError,
    models::{OprfEvaluateRequest, OprfEvaluateResponse},
    oprf::OprfError,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/auth/oprf/evaluate",
    request_body = OprfEvaluateRequest,
    tag = "OPRF",
    responses(
        (status = 200, body = OprfEvaluateResponse),
        (status = 400, description = "Missing fields or invalid blinded point"),
        (status = 401, description = "Invalid or expired session"),
        (status = 500, description = "Evaluation failure")
    )
)]
pub async fn evaluate(
    State(state): State<AppState>,
    Json(request): Json<OprfEvaluateRequest>,
) -> Result<Json<OprfEvaluateResponse>, ApiError> {
    if request.blinded_point.is_empty() || request.session_token.is_empty() {
        return Err(ApiError::bad_request(
            "blindedPoint and sessionToken are required",
        ));
    }

    // The session gate keeps the server from acting as an open scalar-
    // multiplication oracle: only callers who completed the email-ownership
    // step hold a live session.
    state
        .sessions
        .verify(&request.session_token)
        .map_err(|_| ApiError::unauthorized("Invalid or expired session"))?;

    let evaluated_point = state
        .oprf
        .evaluate(&request.blinded_point)
        .map_err(|e| match e {
            OprfError::InvalidPoint => ApiError::bad_request("Invalid blinded point"),
            OprfError::InvalidServerKey(ref cause) => {
                error!(%cause, "OPRF evaluation failed");
                ApiError::internal("OPRF evaluation failed")
            }
        })?;

    Ok(Json(OprfEvaluateResponse {
        ok: true,
        evaluated_point,
    }))
}
