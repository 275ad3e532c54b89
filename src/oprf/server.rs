// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Server side of the OPRF exchange.
//!
//! Holds the long-lived secret scalar and blindly evaluates client points.
//! The scalar is loaded once from deployment configuration and is immutable
//! for the life of the process; rotating it invalidates every key that was
//! derived through it, which is the documented rotation tradeoff.

use k256::elliptic_curve::bigint::{ArrayEncoding, NonZero, U256};
use k256::elliptic_curve::{Curve, PrimeField};
use k256::{Scalar, Secp256k1};

use super::{decode_point, encode_point, OprfError};

/// OPRF evaluator holding the server's secret scalar.
pub struct OprfServer {
    key: Scalar,
}

impl OprfServer {
    /// Load the server scalar from a hex-encoded deployment secret.
    ///
    /// The raw value is interpreted big-endian and mapped to
    /// `(raw mod (n-1)) + 1`, so any hex input of at most 32 bytes yields a
    /// valid, non-identity scalar without strict range validation. This
    /// runs once at startup; per-request evaluation never touches
    /// variable-time arithmetic.
    ///
    /// # Errors
    ///
    /// Returns [`OprfError::InvalidServerKey`] for non-hex input, an empty
    /// value, or a value longer than 32 bytes.
    pub fn from_hex(raw: &str) -> Result<Self, OprfError> {
        let bytes =
            hex::decode(raw.trim()).map_err(|e| OprfError::InvalidServerKey(e.to_string()))?;
        if bytes.is_empty() {
            return Err(OprfError::InvalidServerKey("key is empty".to_string()));
        }
        if bytes.len() > 32 {
            return Err(OprfError::InvalidServerKey(format!(
                "key is {} bytes, expected at most 32",
                bytes.len()
            )));
        }

        let mut padded = [0u8; 32];
        padded[32 - bytes.len()..].copy_from_slice(&bytes);
        let raw_int = U256::from_be_slice(&padded);

        let group_max = Secp256k1::ORDER.wrapping_sub(&U256::ONE);
        let modulus: NonZero<U256> =
            Option::from(NonZero::new(group_max)).expect("group order - 1 is nonzero");
        let shifted = raw_int.rem(&modulus).wrapping_add(&U256::ONE);

        // The value is in [1, n-1], so the conversion always succeeds.
        let key = Option::from(Scalar::from_repr(shifted.to_be_byte_array()))
            .ok_or_else(|| OprfError::InvalidServerKey("scalar out of range".to_string()))?;

        Ok(Self { key })
    }

    /// Blindly evaluate a client point: `k · BlindedPoint`.
    ///
    /// The scalar multiplication is the curve crate's complete,
    /// constant-time implementation; nothing here branches on the key.
    ///
    /// # Errors
    ///
    /// Returns [`OprfError::InvalidPoint`] if the input does not decode to
    /// a valid, non-identity group element.
    pub fn evaluate(&self, blinded_hex: &str) -> Result<String, OprfError> {
        let point = decode_point(blinded_hex)?;
        let evaluated = point * self.key;
        Ok(encode_point(&evaluated))
    }
}
