// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    models::{
        MagicLinkRequest, MagicLinkSent, OprfEvaluateRequest, OprfEvaluateResponse,
        PeekTokenResponse, VerifyTokenRequest, VerifyTokenResponse,
    },
    state::AppState,
};

pub mod health;
pub mod magic_link;
pub mod oprf;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/magic-link", post(magic_link::request_link))
        .route(
            "/auth/magic-link/verify",
            get(magic_link::peek_token).post(magic_link::verify_token),
        )
        .route("/auth/oprf/evaluate", post(oprf::evaluate));

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        magic_link::request_link,
        magic_link::peek_token,
        magic_link::verify_token,
        oprf::evaluate,
        health::health,
        health::ready
    ),
    components(
        schemas(
            MagicLinkRequest,
            MagicLinkSent,
            PeekTokenResponse,
            VerifyTokenRequest,
            VerifyTokenResponse,
            OprfEvaluateRequest,
            OprfEvaluateResponse,
            health::HealthResponse,
            health::ReadyResponse,
            health::ReadyChecks
        )
    ),
    tags(
        (name = "Magic Link", description = "Magic-link request and verification"),
        (name = "OPRF", description = "Blind evaluation for password-based key derivation"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let app = router(AppState::insecure_for_tests());
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
