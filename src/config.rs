// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup; both server secrets are mandatory and their absence aborts
//! startup rather than degrading into an insecure mode.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SESSION_SECRET` | HMAC secret for session tokens | Required |
//! | `OPRF_SERVER_KEY` | Hex-encoded OPRF server scalar | Required |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `TOKEN_TTL_SECS` | Magic-link token lifetime | `1800` |
//! | `SESSION_TTL_SECS` | Session token lifetime | `300` |
//! | `SWEEP_INTERVAL_SECS` | Expired-token sweep interval | `60` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::env;
use std::time::Duration;

use thiserror::Error;

use crate::session::DEFAULT_SESSION_TTL;
use crate::token_store::{DEFAULT_SWEEP_INTERVAL, DEFAULT_TOKEN_TTL};

/// Environment variable name for the session-token HMAC secret.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";

/// Environment variable name for the hex-encoded OPRF server scalar.
pub const OPRF_SERVER_KEY_ENV: &str = "OPRF_SERVER_KEY";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the magic-link token TTL in seconds.
pub const TOKEN_TTL_SECS_ENV: &str = "TOKEN_TTL_SECS";

/// Environment variable name for the session token TTL in seconds.
pub const SESSION_TTL_SECS_ENV: &str = "SESSION_TTL_SECS";

/// Environment variable name for the expired-token sweep interval in seconds.
pub const SWEEP_INTERVAL_SECS_ENV: &str = "SWEEP_INTERVAL_SECS";

/// Environment variable name for the logging format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Configuration errors raised at startup.
///
/// A missing secret must never be papered over with a default: session
/// tokens signed with a guessable secret and an absent OPRF key would both
/// silently break the security model, so loading fails instead.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret is not set (or empty).
    #[error("required environment variable {0} is not set")]
    MissingSecret(&'static str),

    /// A variable is set but does not parse.
    #[error("invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

/// Runtime configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// HMAC secret for the session token codec.
    pub session_secret: Vec<u8>,
    /// Hex-encoded OPRF server scalar.
    pub oprf_server_key: String,
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Magic-link token lifetime.
    pub token_ttl: Duration,
    /// Session token lifetime.
    pub session_ttl: Duration,
    /// Interval between expired-token sweeps.
    pub sweep_interval: Duration,
}

impl Config {
    /// Load the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSecret`] if `SESSION_SECRET` or
    /// `OPRF_SERVER_KEY` is absent or empty, and [`ConfigError::Invalid`]
    /// for unparseable numeric values.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load the configuration through an arbitrary variable lookup.
    ///
    /// Factored out of [`Config::from_env`] so tests can supply fixture
    /// environments without mutating process state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let session_secret = lookup(SESSION_SECRET_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret(SESSION_SECRET_ENV))?
            .into_bytes();

        let oprf_server_key = lookup(OPRF_SERVER_KEY_ENV)
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingSecret(OPRF_SERVER_KEY_ENV))?;

        let host = lookup(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, PORT_ENV, 8080)?;

        let token_ttl = Duration::from_secs(parse_or(
            &lookup,
            TOKEN_TTL_SECS_ENV,
            DEFAULT_TOKEN_TTL.as_secs(),
        )?);
        let session_ttl = Duration::from_secs(parse_or(
            &lookup,
            SESSION_TTL_SECS_ENV,
            DEFAULT_SESSION_TTL.as_secs(),
        )?);
        let sweep_interval = Duration::from_secs(parse_or(
            &lookup,
            SWEEP_INTERVAL_SECS_ENV,
            DEFAULT_SWEEP_INTERVAL.as_secs(),
        )?);

        Ok(Self {
            session_secret,
            oprf_server_key,
            host,
            port,
            token_ttl,
            session_ttl,
            sweep_interval,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        None => Ok(default),
    }
}
