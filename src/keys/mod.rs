// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Key Derivation Engines
//!
//! Deterministic derivation of account key material from authentication
//! factors. Both engines are HKDF-SHA256 with per-output info labels, so the
//! three outputs of a bundle are cryptographically independent even though
//! they share one input secret.
//!
//! ## Engines
//!
//! - [`password`] - password (or OPRF output) + email → [`DerivedKeys`]
//! - [`signature`] - wallet signature bytes → [`DerivedKeys`]
//!
//! Determinism is the load-bearing property: the same inputs must always
//! reproduce the same bundle, or the user loses access to their account.
//! Key material is zeroized on [`DerivedKeys::wipe`] and again on drop.

use sha2::{Digest, Sha256};
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

pub mod password;
pub mod signature;

/// Length in bytes of each derived key.
pub const KEY_LEN: usize = 32;

/// HKDF info labels, one per derived output.
mod labels {
    pub const SECRET_KEY: &[u8] = b"secret-key";
    pub const SIGNING_KEY: &[u8] = b"signing-key";
    pub const SALT: &[u8] = b"salt";
}

/// Errors raised by the derivation engines.
#[derive(Debug, Error)]
pub enum DerivationError {
    /// HKDF expansion failed.
    #[error("key derivation failed: {0}")]
    Expand(String),

    /// A malformed input was supplied (e.g. a signature of the wrong length).
    #[error("malformed derivation input: {0}")]
    MalformedInput(&'static str),

    /// The background derivation task was cancelled or panicked.
    #[error("derivation task failed: {0}")]
    Task(String),
}

/// Deterministically derived account key bundle.
///
/// Three independent 32-byte keys, together sufficient to reconstruct a
/// blockchain account's viewing/spending capability. Never persisted;
/// callers invoke [`DerivedKeys::wipe`] once account construction has
/// consumed the bundle, and drop zeroizes as a backstop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKeys {
    /// Account secret key.
    pub secret_key: [u8; KEY_LEN],
    /// Account signing key.
    pub signing_key: [u8; KEY_LEN],
    /// Account salt.
    pub salt: [u8; KEY_LEN],
}

impl DerivedKeys {
    /// Overwrite all key bytes with zeros in place.
    pub fn wipe(&mut self) {
        self.zeroize();
    }
}

// Key material must never end up in logs via a stray {:?}.
impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKeys(redacted)")
    }
}

/// Normalize an email address for use as a derivation salt or hash input.
///
/// Trims surrounding whitespace, applies Unicode NFKC, and lowercases, so
/// `" User@X.COM "` and `"user@x.com"` derive the same account.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().nfkc().collect::<String>().to_lowercase()
}

/// One-way hex digest of a normalized email address.
///
/// Used wherever "this email was seen" must be recorded or transmitted
/// without the email itself: session-token claims, log fields.
pub fn email_hash(email: &str) -> String {
    let normalized = normalize_email(email);
    let digest = Sha256::digest(normalized.as_bytes());
    hex::encode(digest)
}
