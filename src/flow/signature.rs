// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet-signature authentication flow.
//!
//! ## States
//!
//! ```text
//! Idle --begin--> AwaitingSignature --supply_signature--> DerivingKeys --> Complete
//! ```
//!
//! The wallet signs [`LOGIN_MESSAGE`], a constant, so the same wallet
//! always produces the same signature and therefore the same derived
//! account. Derivation is entirely local; no server round-trip beyond
//! whatever the wallet's own signing UI requires. Used identically for
//! Ethereum and Solana wallets.

use crate::keys::{signature, DerivedKeys};

use super::FlowError;

/// Constant message every wallet signs to log in.
///
/// Changing this string would silently migrate every signature-derived
/// account, so it is versioned and frozen.
pub const LOGIN_MESSAGE: &str =
    "Cloakboard login v1\n\nSign this message to access your account.\n\
     This request will not trigger a transaction or cost any fees.";

/// Observable state of a signature flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureState {
    Idle,
    AwaitingSignature,
    DerivingKeys,
    Complete,
}

/// Client-side wallet-signature flow state machine.
pub struct SignatureFlow {
    state: SignatureState,
}

impl SignatureFlow {
    pub fn new() -> Self {
        Self {
            state: SignatureState::Idle,
        }
    }

    pub fn state(&self) -> SignatureState {
        self.state
    }

    /// Start the flow, returning the message the wallet must sign.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidState`] unless the flow is `Idle`.
    pub fn begin(&mut self) -> Result<&'static str, FlowError> {
        if self.state != SignatureState::Idle {
            return Err(FlowError::InvalidState("begin requires Idle"));
        }
        self.state = SignatureState::AwaitingSignature;
        Ok(LOGIN_MESSAGE)
    }

    /// Accept the wallet's signature and derive the account key bundle.
    ///
    /// # Errors
    ///
    /// [`FlowError::Derivation`] for malformed signatures;
    /// [`FlowError::InvalidState`] outside `AwaitingSignature`.
    pub fn supply_signature(&mut self, signature_bytes: &[u8]) -> Result<DerivedKeys, FlowError> {
        if self.state != SignatureState::AwaitingSignature {
            return Err(FlowError::InvalidState(
                "supply_signature requires AwaitingSignature",
            ));
        }
        self.state = SignatureState::DerivingKeys;

        let keys = signature::derive(signature_bytes)?;
        self.state = SignatureState::Complete;
        Ok(keys)
    }

    /// Abandon the flow.
    pub fn cancel(&mut self) {
        self.state = SignatureState::Idle;
    }
}

impl Default for SignatureFlow {
    fn default() -> Self {
        Self::new()
    }
}
