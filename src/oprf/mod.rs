// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # OPRF Evaluation
//!
//! Oblivious pseudo-random function over secp256k1, the group already used
//! by the signature scheme elsewhere in the platform. The client blinds a
//! secret input to a curve point, the server multiplies it by a long-lived
//! secret scalar without learning the input, and the client unblinds the
//! result to obtain a key-derivation input that cannot be recomputed
//! offline by an observer of the exchange.
//!
//! ## Protocol Flow
//!
//! 1. Client: [`client::blind`] → `(blinded point, blinding state)`
//! 2. Server: [`server::OprfServer::evaluate`] → evaluated point
//! 3. Client: [`client::Blinding::unblind`] + [`client::finalize`] → 32-byte output
//!
//! Points travel as hex-encoded compressed SEC1; anything that does not
//! decode to a non-identity group element is rejected before it reaches
//! the scalar multiplication.

use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::Group;
use k256::{AffinePoint, EncodedPoint, ProjectivePoint};
use thiserror::Error;

pub mod client;
pub mod server;

/// OPRF failures.
#[derive(Debug, Error)]
pub enum OprfError {
    /// Input does not decode to a valid, non-identity group element.
    #[error("input is not a valid curve point")]
    InvalidPoint,

    /// The configured server key cannot be turned into a scalar.
    #[error("invalid OPRF server key: {0}")]
    InvalidServerKey(String),
}

/// Decode a hex compressed-SEC1 string into a group element.
///
/// Rejects malformed hex, invalid encodings, off-curve coordinates, and the
/// identity; an attacker probing encoding edge cases gets [`OprfError::InvalidPoint`]
/// for all of them.
pub(crate) fn decode_point(hex_point: &str) -> Result<ProjectivePoint, OprfError> {
    let bytes = hex::decode(hex_point).map_err(|_| OprfError::InvalidPoint)?;
    let encoded = EncodedPoint::from_bytes(&bytes).map_err(|_| OprfError::InvalidPoint)?;
    let affine: AffinePoint =
        Option::from(AffinePoint::from_encoded_point(&encoded)).ok_or(OprfError::InvalidPoint)?;
    let point = ProjectivePoint::from(affine);
    if bool::from(point.is_identity()) {
        return Err(OprfError::InvalidPoint);
    }
    Ok(point)
}

/// Encode a group element as hex compressed SEC1.
pub(crate) fn encode_point(point: &ProjectivePoint) -> String {
    hex::encode(point.to_affine().to_encoded_point(true).as_bytes())
}
