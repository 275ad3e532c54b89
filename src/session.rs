// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Token Codec
//!
//! Stateless, tamper-evident session tokens bridging two steps of one
//! authentication flow (magic-link verification → OPRF exchange). A token
//! is `base64url(payload) . base64url(mac)` where the payload is a JSON
//! claims object and the MAC is HMAC-SHA256 under the server secret. No
//! server-side record is needed to validate one.
//!
//! The claim carried is an email *hash* (see [`crate::keys::email_hash`]),
//! so a captured token never reveals the address it belongs to.
//!
//! All verification failures collapse into the single
//! [`SessionError::Invalid`] value: which check failed (shape, MAC, expiry)
//! is deliberately not observable by callers.

use std::time::Duration;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of a session token. Short on purpose: it only bridges
/// magic-link verification to the OPRF exchange.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(5 * 60);

/// Separator between the payload and MAC segments.
const SEPARATOR: char = '.';

/// Session token failure. One variant for every cause.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid or expired session token")]
    Invalid,
}

/// Signed claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
struct SessionClaims {
    /// Identity claim (email hash).
    sub: String,
    /// Issued-at, unix seconds.
    iat: i64,
    /// Expiry, unix seconds.
    exp: i64,
}

/// Stateless HMAC-SHA256 session token codec.
///
/// Construction requires the server secret; a deployment without one
/// cannot build a codec at all (see [`crate::config::Config`]), so there
/// is no insecure fallback mode to reach.
#[derive(Clone)]
pub struct SessionCodec {
    mac: HmacSha256,
    ttl: Duration,
}

impl SessionCodec {
    /// Create a codec from the server secret and token lifetime.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        // HMAC keys of any length are valid, so this cannot fail.
        let mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
        Self { mac, ttl }
    }

    /// Issue a signed token for the given identity claim.
    pub fn create(&self, claim: &str) -> String {
        let now = Utc::now().timestamp();
        self.create_at(claim, now)
    }

    /// Verify a token and return its identity claim.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for any malformed, tampered, or
    /// expired token.
    pub fn verify(&self, token: &str) -> Result<String, SessionError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn create_at(&self, claim: &str, now: i64) -> String {
        let claims = SessionClaims {
            sub: claim.to_string(),
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        // Serializing a struct of strings and ints cannot fail.
        let payload = serde_json::to_vec(&claims).expect("session claims serialize");
        let tag = self.tag(&payload);

        format!(
            "{}{SEPARATOR}{}",
            Base64UrlUnpadded::encode_string(&payload),
            Base64UrlUnpadded::encode_string(&tag),
        )
    }

    fn verify_at(&self, token: &str, now: i64) -> Result<String, SessionError> {
        let (payload_b64, tag_b64) = token.split_once(SEPARATOR).ok_or(SessionError::Invalid)?;

        let payload =
            Base64UrlUnpadded::decode_vec(payload_b64).map_err(|_| SessionError::Invalid)?;
        let tag = Base64UrlUnpadded::decode_vec(tag_b64).map_err(|_| SessionError::Invalid)?;

        // Constant-time comparison; MAC is checked before the payload is
        // even parsed.
        let mut mac = self.mac.clone();
        mac.update(&payload);
        mac.verify_slice(&tag).map_err(|_| SessionError::Invalid)?;

        let claims: SessionClaims =
            serde_json::from_slice(&payload).map_err(|_| SessionError::Invalid)?;

        if now >= claims.exp {
            return Err(SessionError::Invalid);
        }

        Ok(claims.sub)
    }

    fn tag(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}
