// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cloakboard_auth::api::router;
use cloakboard_auth::config::{Config, LOG_FORMAT_ENV};
use cloakboard_auth::state::AppState;
use cloakboard_auth::token_store::TokenSweeper;

#[tokio::main]
async fn main() {
    init_tracing();

    // Both server secrets are mandatory; a partially configured deployment
    // must not come up.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let state = match AppState::from_config(&config) {
        Ok(state) => state,
        Err(e) => {
            error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // Background sweep of expired magic-link tokens.
    let shutdown = CancellationToken::new();
    let sweeper = TokenSweeper::new(Arc::clone(&state.tokens), config.sweep_interval);
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown.clone()));

    let app = router(state);

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Invalid bind address: {e}");
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    info!("Cloakboard auth server listening on http://{addr} (docs at /docs)");

    let serve_shutdown = shutdown.clone();
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            serve_shutdown.cancel();
        })
        .await;

    if let Err(e) = result {
        error!("Server error: {e}");
    }

    shutdown.cancel();
    let _ = sweeper_handle.await;
    info!("Shutdown complete");
}

/// Wait for SIGINT (and SIGTERM on unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` controls filtering; `LOG_FORMAT=json` switches to JSON
/// output for log aggregation.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = std::env::var(LOG_FORMAT_ENV)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
