// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::config::Config;
use crate::mailer::{LinkMailer, LogMailer};
use crate::oprf::server::OprfServer;
use crate::oprf::OprfError;
use crate::session::SessionCodec;
use crate::token_store::TokenStore;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub tokens: Arc<TokenStore>,
    pub sessions: Arc<SessionCodec>,
    pub oprf: Arc<OprfServer>,
    pub mailer: Arc<dyn LinkMailer>,
}

impl AppState {
    /// Build the state from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`OprfError::InvalidServerKey`] if the configured OPRF
    /// scalar is unusable; missing secrets were already rejected by
    /// [`Config::from_env`].
    pub fn from_config(config: &Config) -> Result<Self, OprfError> {
        Ok(Self {
            tokens: Arc::new(TokenStore::new(config.token_ttl)),
            sessions: Arc::new(SessionCodec::new(
                &config.session_secret,
                config.session_ttl,
            )),
            oprf: Arc::new(OprfServer::from_hex(&config.oprf_server_key)?),
            mailer: Arc::new(LogMailer),
        })
    }

    /// State with fixture secrets for test harnesses.
    ///
    /// This is the only construction path that does not require real
    /// deployment secrets, and it does not exist outside test builds.
    #[cfg(test)]
    pub(crate) fn insecure_for_tests() -> Self {
        use std::time::Duration;

        Self {
            tokens: Arc::new(TokenStore::new(Duration::from_secs(60))),
            sessions: Arc::new(SessionCodec::new(
                b"test-session-secret",
                Duration::from_secs(300),
            )),
            oprf: Arc::new(OprfServer::from_hex("06").expect("test key parses")),
            mailer: Arc::new(crate::mailer::testing::CapturingMailer::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_builds_all_components() {
        let config = Config::from_lookup(|name| match name {
            "SESSION_SECRET" => Some("secret".to_string()),
            "OPRF_SERVER_KEY" => Some("06".to_string()),
            _ => None,
        })
        .unwrap();

        let state = AppState::from_config(&config).unwrap();
        assert!(state.tokens.is_empty());
    }

    #[test]
    fn bad_oprf_key_fails_construction() {
        let config = Config::from_lookup(|name| match name {
            "SESSION_SECRET" => Some("secret".to_string()),
            "OPRF_SERVER_KEY" => Some("not hex".to_string()),
            _ => None,
        })
        .unwrap();

        assert!(AppState::from_config(&config).is_err());
    }
}
