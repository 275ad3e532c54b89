// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Single-Use Token Store
//!
//! In-memory store for magic-link verification tokens. Each token binds an
//! opaque random value to an identity claim for a bounded lifetime and can
//! be consumed exactly once; unknown, expired, and already-consumed tokens
//! are indistinguishable to callers.
//!
//! ## Concurrency
//!
//! One mutex guards the map, so the check-then-mark sequence inside
//! [`TokenStore::consume`] is atomic: two requests racing on the same token
//! see exactly one success. Expired entries are purged by the
//! [`TokenSweeper`] background task on its own schedule; the request path
//! never sweeps.
//!
//! A multi-instance deployment would back this interface with an external
//! TTL-capable key-value store instead; the in-process map is the
//! single-instance implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use base64ct::{Base64UrlUnpadded, Encoding};
use rand::RngCore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default lifetime of an issued token.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Default interval between expired-entry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Number of random bytes behind each token value.
const TOKEN_BYTES: usize = 32;

struct TokenEntry {
    claim: String,
    expires_at: Instant,
    consumed: bool,
}

impl TokenEntry {
    /// A token is live until the instant it expires; at `expires_at` and
    /// beyond it is indistinguishable from an unknown token.
    fn live_at(&self, now: Instant) -> bool {
        !self.consumed && now < self.expires_at
    }
}

/// In-memory single-use token store.
pub struct TokenStore {
    entries: Mutex<HashMap<String, TokenEntry>>,
    ttl: Duration,
}

impl TokenStore {
    /// Create a store issuing tokens with the given lifetime.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Issue a fresh token bound to the given identity claim.
    pub fn issue(&self, claim: &str) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        let value = Base64UrlUnpadded::encode_string(&bytes);

        let entry = TokenEntry {
            claim: claim.to_string(),
            expires_at: Instant::now() + self.ttl,
            consumed: false,
        };

        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(value.clone(), entry);
        }
        value
    }

    /// Peek at a token without consuming it.
    ///
    /// Returns the identity claim if the token exists, is unexpired, and is
    /// unconsumed; `None` otherwise. Never mutates state, so a verify page
    /// can check a link before the user commits to it.
    pub fn validate(&self, token: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(token)?;
        entry.live_at(Instant::now()).then(|| entry.claim.clone())
    }

    /// Atomically consume a token, returning its identity claim.
    ///
    /// Exactly one call per token value can succeed; every concurrent or
    /// later call returns `None`, as do calls with unknown or expired
    /// tokens.
    pub fn consume(&self, token: &str) -> Option<String> {
        let mut entries = self.entries.lock().ok()?;
        let entry = entries.get_mut(token)?;
        if !entry.live_at(Instant::now()) {
            return None;
        }
        entry.consumed = true;
        Some(entry.claim.clone())
    }

    /// Remove expired entries, returning how many were purged.
    ///
    /// Consumed entries are also dropped once their expiry passes; until
    /// then they stay in the map so replayed tokens keep failing without a
    /// lookup miss.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let Ok(mut entries) = self.entries.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Number of entries currently held (live or awaiting sweep).
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Backdate a token so expiry-dependent behavior can be exercised
    /// without sleeping.
    #[cfg(test)]
    pub(crate) fn force_expire(&self, token: &str) {
        let mut entries = self.entries.lock().expect("token map lock");
        if let Some(entry) = entries.get_mut(token) {
            entry.expires_at = Instant::now() - Duration::from_millis(1);
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_TTL)
    }
}

/// Background task that periodically purges expired tokens.
///
/// Runs until its [`CancellationToken`] fires, in the same shape as the
/// other background loops in this codebase.
pub struct TokenSweeper {
    store: Arc<TokenStore>,
    interval: Duration,
}

impl TokenSweeper {
    /// Create a sweeper over the given store.
    pub fn new(store: Arc<TokenStore>, interval: Duration) -> Self {
        Self { store, interval }
    }

    /// Run the sweep loop until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(sweeper.run(shutdown.clone()));
    /// ```
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Token sweeper starting"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {},
                _ = shutdown.cancelled() => {
                    info!("Token sweeper shutting down");
                    return;
                }
            }

            let purged = self.store.purge_expired();
            if purged > 0 {
                debug!(purged, remaining = self.store.len(), "Purged expired tokens");
            }
        }
    }
}
