// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    error::ApiError,
    keys::{email_hash, normalize_email},
    models::{
        MagicLinkRequest, MagicLinkSent, PeekTokenQuery, PeekTokenResponse, VerifyTokenRequest,
        VerifyTokenResponse,
    },
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/v1/auth/magic-link",
    request_body = MagicLinkRequest,
    tag = "Magic Link",
    responses(
        (status = 202, body = MagicLinkSent),
        (status = 400, description = "Missing or malformed email")
    )
)]
pub async fn request_link(
    State(state): State<AppState>,
    Json(request): Json<MagicLinkRequest>,
) -> Result<(StatusCode, Json<MagicLinkSent>), ApiError> {
    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }

    let normalized = normalize_email(email);
    let token = state.tokens.issue(&normalized);
    state.mailer.send(&normalized, &token);

    info!(email_hash = %email_hash(&normalized), "Magic link requested");

    Ok((
        StatusCode::ACCEPTED,
        Json(MagicLinkSent {
            status: "sent".to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/auth/magic-link/verify",
    params(PeekTokenQuery),
    tag = "Magic Link",
    responses(
        (status = 200, body = PeekTokenResponse),
        (status = 400, description = "Token is required"),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn peek_token(
    State(state): State<AppState>,
    Query(params): Query<PeekTokenQuery>,
) -> Result<Json<PeekTokenResponse>, ApiError> {
    let token = params.token.unwrap_or_default();
    if token.is_empty() {
        return Err(ApiError::bad_request("Token is required"));
    }

    let email = state
        .tokens
        .validate(&token)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    Ok(Json(PeekTokenResponse { valid: true, email }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/magic-link/verify",
    request_body = VerifyTokenRequest,
    tag = "Magic Link",
    responses(
        (status = 200, body = VerifyTokenResponse),
        (status = 400, description = "Token is required"),
        (status = 401, description = "Invalid or expired token")
    )
)]
pub async fn verify_token(
    State(state): State<AppState>,
    Json(request): Json<VerifyTokenRequest>,
) -> Result<Json<VerifyTokenResponse>, ApiError> {
    if request.token.is_empty() {
        return Err(ApiError::bad_request("Token is required"));
    }

    let email = state
        .tokens
        .consume(&request.token)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired token"))?;

    let claim_hash = email_hash(&email);
    let session_token = state.sessions.create(&claim_hash);

    info!(email_hash = %claim_hash, "Magic link verified");

    Ok(Json(VerifyTokenResponse {
        success: true,
        email,
        session_token,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn request_body(email: &str) -> Json<MagicLinkRequest> {
        Json(MagicLinkRequest {
            email: email.to_string(),
        })
    }

    fn issued_token(state: &AppState, email: &str) -> String {
        state.tokens.issue(&normalize_email(email))
    }

    #[tokio::test]
    async fn request_link_issues_a_token() {
        let state = AppState::insecure_for_tests();

        let (status, Json(body)) =
            request_link(State(state.clone()), request_body("User@Example.com"))
                .await
                .expect("request succeeds");

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body.status, "sent");
        assert_eq!(state.tokens.len(), 1);
    }

    #[tokio::test]
    async fn request_link_rejects_bad_emails() {
        let state = AppState::insecure_for_tests();
        for email in ["", "   ", "not-an-email"] {
            let err = request_link(State(state.clone()), request_body(email))
                .await
                .unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "{email:?}");
        }
        assert!(state.tokens.is_empty());
    }

    #[tokio::test]
    async fn peek_does_not_consume() {
        let state = AppState::insecure_for_tests();
        let token = issued_token(&state, "user@example.com");

        for _ in 0..2 {
            let Json(body) = peek_token(
                State(state.clone()),
                Query(PeekTokenQuery {
                    token: Some(token.clone()),
                }),
            )
            .await
            .expect("peek succeeds");
            assert!(body.valid);
            assert_eq!(body.email, "user@example.com");
        }
    }

    #[tokio::test]
    async fn peek_without_token_is_bad_request() {
        let state = AppState::insecure_for_tests();
        let err = peek_token(State(state), Query(PeekTokenQuery { token: None }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Token is required");
    }

    #[tokio::test]
    async fn verify_consumes_and_mints_a_session() {
        let state = AppState::insecure_for_tests();
        let token = issued_token(&state, "user@example.com");

        let Json(body) = verify_token(
            State(state.clone()),
            Json(VerifyTokenRequest {
                token: token.clone(),
            }),
        )
        .await
        .expect("verify succeeds");

        assert!(body.success);
        assert_eq!(body.email, "user@example.com");

        // The session claim is the email hash.
        let claim = state.sessions.verify(&body.session_token).unwrap();
        assert_eq!(claim, email_hash("user@example.com"));

        // A second consumption fails.
        let err = verify_token(State(state), Json(VerifyTokenRequest { token }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Invalid or expired token");
    }

    #[tokio::test]
    async fn verify_expired_token_is_unauthorized() {
        let state = AppState::insecure_for_tests();
        let token = issued_token(&state, "user@example.com");
        state.tokens.force_expire(&token);

        let err = verify_token(State(state), Json(VerifyTokenRequest { token }))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
