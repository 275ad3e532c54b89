// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signature key-derivation engine.
//!
//! Maps a wallet signature over the constant login message to a
//! [`DerivedKeys`] bundle. The wallet signs the same bytes every time, so
//! the signature is stable and the derived account is recoverable. Used
//! identically for Ethereum (65-byte ECDSA) and Solana (64-byte ed25519)
//! signatures.
//!
//! Both execution modes run the same HKDF-SHA256 derivation: the async
//! mode is a `spawn_blocking` wrapper around the synchronous function, so
//! their outputs are byte-identical for the same input.

use hkdf::Hkdf;
use sha2::Sha256;

use super::{labels, DerivationError, DerivedKeys, KEY_LEN};

/// Versioned domain string used as the HKDF salt.
const DOMAIN: &[u8] = b"cloakboard-signature-v1";

/// Accepted signature lengths: ed25519 (64) and recoverable ECDSA (65).
const SIGNATURE_LENS: [usize; 2] = [64, 65];

/// Derive an account key bundle from wallet signature bytes.
///
/// Deterministic: the same signature always produces the same bundle.
///
/// # Errors
///
/// Returns [`DerivationError::MalformedInput`] unless the signature is 64
/// or 65 bytes, and [`DerivationError::Expand`] if HKDF expansion fails.
pub fn derive(signature: &[u8]) -> Result<DerivedKeys, DerivationError> {
    if !SIGNATURE_LENS.contains(&signature.len()) {
        return Err(DerivationError::MalformedInput(
            "signature must be 64 or 65 bytes",
        ));
    }

    let hk = Hkdf::<Sha256>::new(Some(DOMAIN), signature);

    let mut secret_key = [0u8; KEY_LEN];
    let mut signing_key = [0u8; KEY_LEN];
    let mut salt = [0u8; KEY_LEN];

    hk.expand(labels::SECRET_KEY, &mut secret_key)
        .map_err(|e| DerivationError::Expand(e.to_string()))?;
    hk.expand(labels::SIGNING_KEY, &mut signing_key)
        .map_err(|e| DerivationError::Expand(e.to_string()))?;
    hk.expand(labels::SALT, &mut salt)
        .map_err(|e| DerivationError::Expand(e.to_string()))?;

    Ok(DerivedKeys {
        secret_key,
        signing_key,
        salt,
    })
}

/// Asynchronous mode of [`derive`].
///
/// Runs the derivation on the blocking pool so a caller on the async
/// runtime never stalls its worker thread. Output is byte-identical to the
/// synchronous mode for the same input.
///
/// # Errors
///
/// Same as [`derive`], plus [`DerivationError::Task`] if the blocking task
/// is cancelled or panics.
pub async fn derive_async(signature: Vec<u8>) -> Result<DerivedKeys, DerivationError> {
    tokio::task::spawn_blocking(move || derive(&signature))
        .await
        .map_err(|e| DerivationError::Task(e.to_string()))?
}
