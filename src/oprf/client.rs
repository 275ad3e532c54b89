// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Client side of the OPRF exchange.
//!
//! Blinds a secret input before it is sent for evaluation and unblinds the
//! server's answer. The blinding factor never leaves this process, so the
//! server sees only a uniformly random group element regardless of the
//! input distribution.

use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar, U256};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

use super::{decode_point, encode_point, OprfError};

/// Domain tag for hashing inputs onto the group.
const HASH_TO_GROUP_DST: &[u8] = b"cloakboard-oprf-group-v1";

/// Domain tag for the finalize step.
const FINALIZE_DST: &[u8] = b"cloakboard-oprf-finalize-v1";

/// Client-held blinding state carried between `blind` and `unblind`.
pub struct Blinding {
    /// Hex compressed encoding of the blinded point, ready for the wire.
    pub blinded_point: String,
    blind: Scalar,
}

/// Blind a secret input for server evaluation.
///
/// Hashes the input onto the group and multiplies it by a fresh random
/// nonzero blinding factor. Returns the wire encoding plus the state
/// needed to unblind the server's answer.
pub fn blind(input: &[u8]) -> Blinding {
    let point = hash_to_group(input);
    let blind = random_nonzero_scalar();

    Blinding {
        blinded_point: encode_point(&(point * blind)),
        blind,
    }
}

impl Blinding {
    /// Remove the blinding factor from an evaluated point.
    ///
    /// Returns the compressed encoding of `k · HashToGroup(input)`, the
    /// OPRF element this exchange was computing.
    ///
    /// # Errors
    ///
    /// Returns [`OprfError::InvalidPoint`] if the server's answer does not
    /// decode to a valid group element.
    pub fn unblind(&self, evaluated_hex: &str) -> Result<Vec<u8>, OprfError> {
        let evaluated = decode_point(evaluated_hex)?;
        // The blinding factor is nonzero by construction.
        let inverse: Scalar =
            Option::from(self.blind.invert()).expect("nonzero scalar inverts");
        let element = evaluated * inverse;
        Ok(element.to_affine().to_encoded_point(true).as_bytes().to_vec())
    }
}

/// Hash the input and unblinded element into the final 32-byte OPRF output.
///
/// This is the value fed to the password key-derivation engine in place of
/// the raw secret.
pub fn finalize(input: &[u8], element: &[u8]) -> [u8; 32] {
    let digest = Sha256::new()
        .chain_update(FINALIZE_DST)
        .chain_update((input.len() as u64).to_be_bytes())
        .chain_update(input)
        .chain_update(element)
        .finalize();
    digest.into()
}

/// Map an arbitrary byte string onto the group.
///
/// SHA-256 of the tagged input, reduced to a scalar, times the base point.
fn hash_to_group(input: &[u8]) -> ProjectivePoint {
    let digest = Sha256::new()
        .chain_update(HASH_TO_GROUP_DST)
        .chain_update(input)
        .finalize();
    let scalar = <Scalar as Reduce<U256>>::reduce_bytes(&digest);
    ProjectivePoint::GENERATOR * scalar
}

fn random_nonzero_scalar() -> Scalar {
    loop {
        let candidate = Scalar::random(&mut OsRng);
        if !bool::from(candidate.is_zero()) {
            return candidate;
        }
    }
}
